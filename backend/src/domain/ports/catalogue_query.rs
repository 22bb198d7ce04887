//! Driving port for reading the catalogue.

use async_trait::async_trait;
use pagination::PageRequest;

use super::RecordSlice;
use crate::domain::{Character, CharacterId, Error, Film, FilmId, Starship, StarshipId};

/// Read-side use-cases over films, characters and starships.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CatalogueQuery: Send + Sync {
    async fn list_films(&self, page: PageRequest) -> Result<RecordSlice<Film>, Error>;

    /// Load one film.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when no film has this id.
    async fn get_film(&self, id: FilmId) -> Result<Film, Error>;

    /// Films whose name contains `name`, ignoring case.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRequest` when `name` is blank.
    async fn search_films(&self, name: &str, page: PageRequest)
    -> Result<RecordSlice<Film>, Error>;

    async fn list_characters(&self, page: PageRequest) -> Result<RecordSlice<Character>, Error>;

    async fn get_character(&self, id: CharacterId) -> Result<Character, Error>;

    async fn search_characters(
        &self,
        name: &str,
        page: PageRequest,
    ) -> Result<RecordSlice<Character>, Error>;

    async fn list_starships(&self, page: PageRequest) -> Result<RecordSlice<Starship>, Error>;

    async fn get_starship(&self, id: StarshipId) -> Result<Starship, Error>;

    async fn search_starships(
        &self,
        name: &str,
        page: PageRequest,
    ) -> Result<RecordSlice<Starship>, Error>;
}
