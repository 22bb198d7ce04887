//! Store port for films.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use pagination::PageRequest;

use super::{CatalogueRepositoryError, RecordSlice};
use crate::domain::{ExternalId, Film, FilmId, FilmPatch, NewFilm};

/// Port for reading and writing films.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FilmRepository: Send + Sync {
    /// List one window of films ordered by id.
    async fn list(&self, page: PageRequest) -> Result<RecordSlice<Film>, CatalogueRepositoryError>;

    /// Load a film by store id.
    async fn find_by_id(&self, id: FilmId) -> Result<Option<Film>, CatalogueRepositoryError>;

    /// List films whose name contains `fragment`, ignoring case.
    async fn search_by_name(
        &self,
        fragment: &str,
        page: PageRequest,
    ) -> Result<RecordSlice<Film>, CatalogueRepositoryError>;

    /// Create one film.
    async fn create(&self, film: &NewFilm) -> Result<Film, CatalogueRepositoryError>;

    /// Apply a patch; `None` when the film does not exist.
    async fn update(
        &self,
        id: FilmId,
        patch: &FilmPatch,
    ) -> Result<Option<Film>, CatalogueRepositoryError>;

    /// Delete a film and its relationship rows; `false` when it was absent.
    async fn delete(&self, id: FilmId) -> Result<bool, CatalogueRepositoryError>;

    /// Return the subset of `ids` already held by stored films.
    async fn existing_external_ids(
        &self,
        ids: &[ExternalId],
    ) -> Result<HashSet<ExternalId>, CatalogueRepositoryError>;

    /// Create every film in one atomic unit, returning them in input order.
    async fn create_batch(&self, films: &[NewFilm]) -> Result<Vec<Film>, CatalogueRepositoryError>;

    /// Map each stored external id among `ids` to its store id.
    async fn ids_by_external_id(
        &self,
        ids: &[ExternalId],
    ) -> Result<HashMap<ExternalId, FilmId>, CatalogueRepositoryError>;
}

/// Fixture implementation backed by an empty store.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureFilmRepository;

#[async_trait]
impl FilmRepository for FixtureFilmRepository {
    async fn list(&self, _page: PageRequest) -> Result<RecordSlice<Film>, CatalogueRepositoryError> {
        Ok(RecordSlice::empty())
    }

    async fn find_by_id(&self, _id: FilmId) -> Result<Option<Film>, CatalogueRepositoryError> {
        Ok(None)
    }

    async fn search_by_name(
        &self,
        _fragment: &str,
        _page: PageRequest,
    ) -> Result<RecordSlice<Film>, CatalogueRepositoryError> {
        Ok(RecordSlice::empty())
    }

    async fn create(&self, _film: &NewFilm) -> Result<Film, CatalogueRepositoryError> {
        Err(CatalogueRepositoryError::query("fixture store is read-only"))
    }

    async fn update(
        &self,
        _id: FilmId,
        _patch: &FilmPatch,
    ) -> Result<Option<Film>, CatalogueRepositoryError> {
        Ok(None)
    }

    async fn delete(&self, _id: FilmId) -> Result<bool, CatalogueRepositoryError> {
        Ok(false)
    }

    async fn existing_external_ids(
        &self,
        _ids: &[ExternalId],
    ) -> Result<HashSet<ExternalId>, CatalogueRepositoryError> {
        Ok(HashSet::new())
    }

    async fn create_batch(&self, films: &[NewFilm]) -> Result<Vec<Film>, CatalogueRepositoryError> {
        if films.is_empty() {
            return Ok(Vec::new());
        }
        Err(CatalogueRepositoryError::query("fixture store is read-only"))
    }

    async fn ids_by_external_id(
        &self,
        _ids: &[ExternalId],
    ) -> Result<HashMap<ExternalId, FilmId>, CatalogueRepositoryError> {
        Ok(HashMap::new())
    }
}
