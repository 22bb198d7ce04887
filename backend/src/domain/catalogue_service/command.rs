//! Write-side use-cases.

use async_trait::async_trait;

use super::CatalogueService;
use crate::domain::ports::CatalogueCommand;
use crate::domain::{
    Character, CharacterId, CharacterPatch, Error, Film, FilmId, FilmPatch, NewCharacter,
    NewFilm, NewStarship, Starship, StarshipId, StarshipPatch,
};

fn film_missing(id: FilmId) -> Error {
    Error::not_found(format!("film {id} not found"))
}

fn character_missing(id: CharacterId) -> Error {
    Error::not_found(format!("character {id} not found"))
}

fn starship_missing(id: StarshipId) -> Error {
    Error::not_found(format!("starship {id} not found"))
}

#[async_trait]
impl CatalogueCommand for CatalogueService {
    async fn create_film(&self, film: NewFilm) -> Result<Film, Error> {
        let film = film.validated()?;
        self.validator.check_film(&film).await?;
        let created = self
            .films
            .create(&film)
            .await
            .map_err(Self::map_repository_error)?;
        self.invalidate_cache().await;
        Ok(created)
    }

    async fn replace_film(&self, id: FilmId, film: NewFilm) -> Result<Film, Error> {
        self.patch_film(id, FilmPatch::replacing(film)).await
    }

    async fn patch_film(&self, id: FilmId, patch: FilmPatch) -> Result<Film, Error> {
        let patch = patch.validated()?;
        let updated = self
            .films
            .update(id, &patch)
            .await
            .map_err(Self::map_repository_error)?
            .ok_or_else(|| film_missing(id))?;
        self.invalidate_cache().await;
        Ok(updated)
    }

    async fn delete_film(&self, id: FilmId) -> Result<(), Error> {
        let deleted = self
            .films
            .delete(id)
            .await
            .map_err(Self::map_repository_error)?;
        if !deleted {
            return Err(film_missing(id));
        }
        self.invalidate_cache().await;
        Ok(())
    }

    async fn create_character(
        &self,
        character: NewCharacter,
        films: Vec<FilmId>,
    ) -> Result<Character, Error> {
        let character = character.validated()?;
        self.validator.check_character(&character).await?;
        let created = self
            .characters
            .create(&character, &films)
            .await
            .map_err(Self::map_repository_error)?;
        self.invalidate_cache().await;
        Ok(created)
    }

    async fn replace_character(
        &self,
        id: CharacterId,
        character: NewCharacter,
        films: Vec<FilmId>,
    ) -> Result<Character, Error> {
        self.patch_character(id, CharacterPatch::replacing(character, films))
            .await
    }

    async fn patch_character(
        &self,
        id: CharacterId,
        patch: CharacterPatch,
    ) -> Result<Character, Error> {
        let patch = patch.validated()?;
        let updated = self
            .characters
            .update(id, &patch)
            .await
            .map_err(Self::map_repository_error)?
            .ok_or_else(|| character_missing(id))?;
        self.invalidate_cache().await;
        Ok(updated)
    }

    async fn delete_character(&self, id: CharacterId) -> Result<(), Error> {
        let deleted = self
            .characters
            .delete(id)
            .await
            .map_err(Self::map_repository_error)?;
        if !deleted {
            return Err(character_missing(id));
        }
        self.invalidate_cache().await;
        Ok(())
    }

    async fn create_starship(
        &self,
        starship: NewStarship,
        films: Vec<FilmId>,
        pilots: Vec<CharacterId>,
    ) -> Result<Starship, Error> {
        let starship = starship.validated()?;
        self.validator.check_starship(&starship).await?;
        let created = self
            .starships
            .create(&starship, &films, &pilots)
            .await
            .map_err(Self::map_repository_error)?;
        self.invalidate_cache().await;
        Ok(created)
    }

    async fn replace_starship(
        &self,
        id: StarshipId,
        starship: NewStarship,
        films: Vec<FilmId>,
        pilots: Vec<CharacterId>,
    ) -> Result<Starship, Error> {
        self.patch_starship(id, StarshipPatch::replacing(starship, films, pilots))
            .await
    }

    async fn patch_starship(
        &self,
        id: StarshipId,
        patch: StarshipPatch,
    ) -> Result<Starship, Error> {
        let patch = patch.validated()?;
        let updated = self
            .starships
            .update(id, &patch)
            .await
            .map_err(Self::map_repository_error)?
            .ok_or_else(|| starship_missing(id))?;
        self.invalidate_cache().await;
        Ok(updated)
    }

    async fn delete_starship(&self, id: StarshipId) -> Result<(), Error> {
        let deleted = self
            .starships
            .delete(id)
            .await
            .map_err(Self::map_repository_error)?;
        if !deleted {
            return Err(starship_missing(id));
        }
        self.invalidate_cache().await;
        Ok(())
    }
}
