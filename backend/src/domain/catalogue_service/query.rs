//! Read-side use-cases.

use async_trait::async_trait;
use pagination::PageRequest;

use super::CatalogueService;
use crate::domain::ports::{CatalogueQuery, RecordSlice};
use crate::domain::{Character, CharacterId, Error, Film, FilmId, Starship, StarshipId};

#[async_trait]
impl CatalogueQuery for CatalogueService {
    async fn list_films(&self, page: PageRequest) -> Result<RecordSlice<Film>, Error> {
        self.films
            .list(page)
            .await
            .map_err(Self::map_repository_error)
    }

    async fn get_film(&self, id: FilmId) -> Result<Film, Error> {
        self.films
            .find_by_id(id)
            .await
            .map_err(Self::map_repository_error)?
            .ok_or_else(|| Error::not_found(format!("film {id} not found")))
    }

    async fn search_films(
        &self,
        name: &str,
        page: PageRequest,
    ) -> Result<RecordSlice<Film>, Error> {
        let term = Self::search_term(name)?;
        self.films
            .search_by_name(term, page)
            .await
            .map_err(Self::map_repository_error)
    }

    async fn list_characters(&self, page: PageRequest) -> Result<RecordSlice<Character>, Error> {
        self.characters
            .list(page)
            .await
            .map_err(Self::map_repository_error)
    }

    async fn get_character(&self, id: CharacterId) -> Result<Character, Error> {
        self.characters
            .find_by_id(id)
            .await
            .map_err(Self::map_repository_error)?
            .ok_or_else(|| Error::not_found(format!("character {id} not found")))
    }

    async fn search_characters(
        &self,
        name: &str,
        page: PageRequest,
    ) -> Result<RecordSlice<Character>, Error> {
        let term = Self::search_term(name)?;
        self.characters
            .search_by_name(term, page)
            .await
            .map_err(Self::map_repository_error)
    }

    async fn list_starships(&self, page: PageRequest) -> Result<RecordSlice<Starship>, Error> {
        self.starships
            .list(page)
            .await
            .map_err(Self::map_repository_error)
    }

    async fn get_starship(&self, id: StarshipId) -> Result<Starship, Error> {
        self.starships
            .find_by_id(id)
            .await
            .map_err(Self::map_repository_error)?
            .ok_or_else(|| Error::not_found(format!("starship {id} not found")))
    }

    async fn search_starships(
        &self,
        name: &str,
        page: PageRequest,
    ) -> Result<RecordSlice<Starship>, Error> {
        let term = Self::search_term(name)?;
        self.starships
            .search_by_name(term, page)
            .await
            .map_err(Self::map_repository_error)
    }
}
