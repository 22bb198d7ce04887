//! Store port for starships with their film and pilot links.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use pagination::PageRequest;

use super::{CatalogueRepositoryError, RecordSlice};
use crate::domain::{
    CharacterId, ExternalId, FilmId, NewStarship, Starship, StarshipId, StarshipPatch,
};

/// Port for reading and writing starships.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StarshipRepository: Send + Sync {
    /// List one window of starships ordered by id.
    async fn list(
        &self,
        page: PageRequest,
    ) -> Result<RecordSlice<Starship>, CatalogueRepositoryError>;

    /// Load a starship by store id.
    async fn find_by_id(
        &self,
        id: StarshipId,
    ) -> Result<Option<Starship>, CatalogueRepositoryError>;

    /// List starships whose name contains `fragment`, ignoring case.
    async fn search_by_name(
        &self,
        fragment: &str,
        page: PageRequest,
    ) -> Result<RecordSlice<Starship>, CatalogueRepositoryError>;

    /// Create one starship linked to `films` and `pilots`.
    async fn create(
        &self,
        starship: &NewStarship,
        films: &[FilmId],
        pilots: &[CharacterId],
    ) -> Result<Starship, CatalogueRepositoryError>;

    /// Apply a patch, replacing each relationship set the patch carries.
    async fn update(
        &self,
        id: StarshipId,
        patch: &StarshipPatch,
    ) -> Result<Option<Starship>, CatalogueRepositoryError>;

    /// Delete a starship and its relationship rows; `false` when absent.
    async fn delete(&self, id: StarshipId) -> Result<bool, CatalogueRepositoryError>;

    /// Return the subset of `ids` already held by stored starships.
    async fn existing_external_ids(
        &self,
        ids: &[ExternalId],
    ) -> Result<HashSet<ExternalId>, CatalogueRepositoryError>;

    /// Create every starship, without links, in one atomic unit.
    async fn create_batch(
        &self,
        starships: &[NewStarship],
    ) -> Result<Vec<Starship>, CatalogueRepositoryError>;

    /// Map each stored external id among `ids` to its store id.
    async fn ids_by_external_id(
        &self,
        ids: &[ExternalId],
    ) -> Result<HashMap<ExternalId, StarshipId>, CatalogueRepositoryError>;

    /// Load the stored starships holding any of `ids`, ordered by id.
    async fn find_by_external_ids(
        &self,
        ids: &[ExternalId],
    ) -> Result<Vec<Starship>, CatalogueRepositoryError>;

    /// Replace the film set of a starship.
    async fn replace_films(
        &self,
        id: StarshipId,
        films: &[FilmId],
    ) -> Result<(), CatalogueRepositoryError>;

    /// Replace the pilot set of a starship.
    async fn replace_pilots(
        &self,
        id: StarshipId,
        pilots: &[CharacterId],
    ) -> Result<(), CatalogueRepositoryError>;
}

/// Fixture implementation backed by an empty store.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureStarshipRepository;

#[async_trait]
impl StarshipRepository for FixtureStarshipRepository {
    async fn list(
        &self,
        _page: PageRequest,
    ) -> Result<RecordSlice<Starship>, CatalogueRepositoryError> {
        Ok(RecordSlice::empty())
    }

    async fn find_by_id(
        &self,
        _id: StarshipId,
    ) -> Result<Option<Starship>, CatalogueRepositoryError> {
        Ok(None)
    }

    async fn search_by_name(
        &self,
        _fragment: &str,
        _page: PageRequest,
    ) -> Result<RecordSlice<Starship>, CatalogueRepositoryError> {
        Ok(RecordSlice::empty())
    }

    async fn create(
        &self,
        _starship: &NewStarship,
        _films: &[FilmId],
        _pilots: &[CharacterId],
    ) -> Result<Starship, CatalogueRepositoryError> {
        Err(CatalogueRepositoryError::query("fixture store is read-only"))
    }

    async fn update(
        &self,
        _id: StarshipId,
        _patch: &StarshipPatch,
    ) -> Result<Option<Starship>, CatalogueRepositoryError> {
        Ok(None)
    }

    async fn delete(&self, _id: StarshipId) -> Result<bool, CatalogueRepositoryError> {
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
        starships: &[NewStarship],
    ) -> Result<Vec<Starship>, CatalogueRepositoryError> {
        if starships.is_empty() {
            return Ok(Vec::new());
        }
        Err(CatalogueRepositoryError::query("fixture store is read-only"))
    }

    async fn ids_by_external_id(
        &self,
        _ids: &[ExternalId],
    ) -> Result<HashMap<ExternalId, StarshipId>, CatalogueRepositoryError> {
        Ok(HashMap::new())
    }

    async fn find_by_external_ids(
        &self,
        _ids: &[ExternalId],
    ) -> Result<Vec<Starship>, CatalogueRepositoryError> {
        Ok(Vec::new())
    }

    async fn replace_films(
        &self,
        _id: StarshipId,
        _films: &[FilmId],
    ) -> Result<(), CatalogueRepositoryError> {
        Ok(())
    }

    async fn replace_pilots(
        &self,
        _id: StarshipId,
        _pilots: &[CharacterId],
    ) -> Result<(), CatalogueRepositoryError> {
        Ok(())
    }
}
