//! Driving port for writing the catalogue.
//!
//! Creation checks catalogue-sourced records against the upstream catalogue;
//! full and partial updates only validate local invariants. Every successful
//! write invalidates cached responses.

use async_trait::async_trait;

use crate::domain::{
    Character, CharacterId, CharacterPatch, Error, Film, FilmId, FilmPatch, NewCharacter,
    NewFilm, NewStarship, Starship, StarshipId, StarshipPatch,
};

/// Write-side use-cases over films, characters and starships.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CatalogueCommand: Send + Sync {
    /// Create a film.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRequest` when validation fails, `Conflict` when the
    /// name is taken and `ServiceUnavailable` when the upstream catalogue
    /// cannot be reached.
    async fn create_film(&self, film: NewFilm) -> Result<Film, Error>;

    /// Overwrite every writable attribute of a film.
    async fn replace_film(&self, id: FilmId, film: NewFilm) -> Result<Film, Error>;

    /// Change only the supplied attributes of a film.
    async fn patch_film(&self, id: FilmId, patch: FilmPatch) -> Result<Film, Error>;

    /// Delete a film; `NotFound` when it does not exist.
    async fn delete_film(&self, id: FilmId) -> Result<(), Error>;

    /// Create a character appearing in `films`.
    async fn create_character(
        &self,
        character: NewCharacter,
        films: Vec<FilmId>,
    ) -> Result<Character, Error>;

    async fn replace_character(
        &self,
        id: CharacterId,
        character: NewCharacter,
        films: Vec<FilmId>,
    ) -> Result<Character, Error>;

    async fn patch_character(
        &self,
        id: CharacterId,
        patch: CharacterPatch,
    ) -> Result<Character, Error>;

    async fn delete_character(&self, id: CharacterId) -> Result<(), Error>;

    /// Create a starship appearing in `films` and flown by `pilots`.
    async fn create_starship(
        &self,
        starship: NewStarship,
        films: Vec<FilmId>,
        pilots: Vec<CharacterId>,
    ) -> Result<Starship, Error>;

    async fn replace_starship(
        &self,
        id: StarshipId,
        starship: NewStarship,
        films: Vec<FilmId>,
        pilots: Vec<CharacterId>,
    ) -> Result<Starship, Error>;

    async fn patch_starship(&self, id: StarshipId, patch: StarshipPatch)
    -> Result<Starship, Error>;

    async fn delete_starship(&self, id: StarshipId) -> Result<(), Error>;
}
