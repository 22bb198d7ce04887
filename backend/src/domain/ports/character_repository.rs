//! Store port for characters and their film links.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use pagination::PageRequest;

use super::{CatalogueRepositoryError, RecordSlice};
use crate::domain::{Character, CharacterId, CharacterPatch, ExternalId, FilmId, NewCharacter};

/// Port for reading and writing characters.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CharacterRepository: Send + Sync {
    /// List one window of characters ordered by id.
    async fn list(
        &self,
        page: PageRequest,
    ) -> Result<RecordSlice<Character>, CatalogueRepositoryError>;

    /// Load a character by store id.
    async fn find_by_id(
        &self,
        id: CharacterId,
    ) -> Result<Option<Character>, CatalogueRepositoryError>;

    /// List characters whose name contains `fragment`, ignoring case.
    async fn search_by_name(
        &self,
        fragment: &str,
        page: PageRequest,
    ) -> Result<RecordSlice<Character>, CatalogueRepositoryError>;

    /// Create one character linked to `films`.
    ///
    /// Unknown film ids yield [`CatalogueRepositoryError::InvalidReference`].
    async fn create(
        &self,
        character: &NewCharacter,
        films: &[FilmId],
    ) -> Result<Character, CatalogueRepositoryError>;

    /// Apply a patch, replacing the film set when the patch carries one.
    async fn update(
        &self,
        id: CharacterId,
        patch: &CharacterPatch,
    ) -> Result<Option<Character>, CatalogueRepositoryError>;

    /// Delete a character and its relationship rows; `false` when absent.
    async fn delete(&self, id: CharacterId) -> Result<bool, CatalogueRepositoryError>;

    /// Return the subset of `ids` already held by stored characters.
    async fn existing_external_ids(
        &self,
        ids: &[ExternalId],
    ) -> Result<HashSet<ExternalId>, CatalogueRepositoryError>;

    /// Create every character, without links, in one atomic unit.
    async fn create_batch(
        &self,
        characters: &[NewCharacter],
    ) -> Result<Vec<Character>, CatalogueRepositoryError>;

    /// Map each stored external id among `ids` to its store id.
    async fn ids_by_external_id(
        &self,
        ids: &[ExternalId],
    ) -> Result<HashMap<ExternalId, CharacterId>, CatalogueRepositoryError>;

    /// Load the stored characters holding any of `ids`, ordered by id.
    async fn find_by_external_ids(
        &self,
        ids: &[ExternalId],
    ) -> Result<Vec<Character>, CatalogueRepositoryError>;

    /// Replace the film set of a character.
    async fn replace_films(
        &self,
        id: CharacterId,
        films: &[FilmId],
    ) -> Result<(), CatalogueRepositoryError>;
}

/// Fixture implementation backed by an empty store.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureCharacterRepository;

#[async_trait]
impl CharacterRepository for FixtureCharacterRepository {
    async fn list(
        &self,
        _page: PageRequest,
    ) -> Result<RecordSlice<Character>, CatalogueRepositoryError> {
        Ok(RecordSlice::empty())
    }

    async fn find_by_id(
        &self,
        _id: CharacterId,
    ) -> Result<Option<Character>, CatalogueRepositoryError> {
        Ok(None)
    }

    async fn search_by_name(
        &self,
        _fragment: &str,
        _page: PageRequest,
    ) -> Result<RecordSlice<Character>, CatalogueRepositoryError> {
        Ok(RecordSlice::empty())
    }

    async fn create(
        &self,
        _character: &NewCharacter,
        _films: &[FilmId],
    ) -> Result<Character, CatalogueRepositoryError> {
        Err(CatalogueRepositoryError::query("fixture store is read-only"))
    }

    async fn update(
        &self,
        _id: CharacterId,
        _patch: &CharacterPatch,
    ) -> Result<Option<Character>, CatalogueRepositoryError> {
        Ok(None)
    }

    async fn delete(&self, _id: CharacterId) -> Result<bool, CatalogueRepositoryError> {
        Ok(false)
    }

    async fn existing_external_ids(
        &self,
        _ids: &[ExternalId],
    ) -> Result<HashSet<ExternalId>, CatalogueRepositoryError> {
        Ok(HashSet::new())
    }

    async fn create_batch(
        &self,
        characters: &[NewCharacter],
    ) -> Result<Vec<Character>, CatalogueRepositoryError> {
        if characters.is_empty() {
            return Ok(Vec::new());
        }
        Err(CatalogueRepositoryError::query("fixture store is read-only"))
    }

    async fn ids_by_external_id(
        &self,
        _ids: &[ExternalId],
    ) -> Result<HashMap<ExternalId, CharacterId>, CatalogueRepositoryError> {
        Ok(HashMap::new())
    }

    async fn find_by_external_ids(
        &self,
        _ids: &[ExternalId],
    ) -> Result<Vec<Character>, CatalogueRepositoryError> {
        Ok(Vec::new())
    }

    async fn replace_films(
        &self,
        _id: CharacterId,
        _films: &[FilmId],
    ) -> Result<(), CatalogueRepositoryError> {
        Ok(())
    }
}
