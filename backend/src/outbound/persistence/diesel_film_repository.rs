//! PostgreSQL-backed `FilmRepository` implementation using Diesel ORM.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use pagination::PageRequest;

use crate::domain::ports::{CatalogueRepositoryError, FilmRepository, RecordSlice};
use crate::domain::{ExternalId, Film, FilmId, FilmPatch, NewFilm};

use super::diesel_error_mapping::{map_diesel_error, map_pool_error};
use super::diesel_helpers::{contains_pattern, page_bounds, total_from_count};
use super::models::{FilmRow, FilmUpdate, NewFilmRow};
use super::pool::DbPool;
use super::schema::films;

/// Diesel-backed implementation of the `FilmRepository` port.
#[derive(Clone)]
pub struct DieselFilmRepository {
    pool: DbPool,
}

impl DieselFilmRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn window(
        &self,
        pattern: Option<String>,
        page: PageRequest,
    ) -> Result<RecordSlice<Film>, CatalogueRepositoryError> {
        let (limit, offset) = page_bounds(page)?;
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let mut count_query = films::table.count().into_boxed();
        let mut rows_query = films::table
            .select(FilmRow::as_select())
            .order(films::id.asc())
            .limit(limit)
            .offset(offset)
            .into_boxed();
        if let Some(pattern) = pattern {
            count_query = count_query.filter(films::name.ilike(pattern.clone()));
            rows_query = rows_query.filter(films::name.ilike(pattern));
        }

        let total: i64 = count_query
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let rows: Vec<FilmRow> = rows_query
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(RecordSlice {
            records: rows.into_iter().map(Film::from).collect(),
            total: total_from_count(total),
        })
    }
}

fn raw_external_ids(ids: &[ExternalId]) -> Vec<i64> {
    ids.iter().map(|id| id.get()).collect()
}

#[async_trait]
impl FilmRepository for DieselFilmRepository {
    async fn list(&self, page: PageRequest) -> Result<RecordSlice<Film>, CatalogueRepositoryError> {
        self.window(None, page).await
    }

    async fn find_by_id(&self, id: FilmId) -> Result<Option<Film>, CatalogueRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<FilmRow> = films::table
            .find(id.get())
            .select(FilmRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        Ok(row.map(Film::from))
    }

    async fn search_by_name(
        &self,
        fragment: &str,
        page: PageRequest,
    ) -> Result<RecordSlice<Film>, CatalogueRepositoryError> {
        self.window(Some(contains_pattern(fragment)), page).await
    }

    async fn create(&self, film: &NewFilm) -> Result<Film, CatalogueRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: FilmRow = diesel::insert_into(films::table)
            .values(NewFilmRow::from(film))
            .returning(FilmRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(Film::from(row))
    }

    async fn update(
        &self,
        id: FilmId,
        patch: &FilmPatch,
    ) -> Result<Option<Film>, CatalogueRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<FilmRow> = diesel::update(films::table.find(id.get()))
            .set((FilmUpdate::from(patch), films::edited_at.eq(Utc::now())))
            .returning(FilmRow::as_returning())
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        Ok(row.map(Film::from))
    }

    async fn delete(&self, id: FilmId) -> Result<bool, CatalogueRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let deleted = diesel::delete(films::table.find(id.get()))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(deleted > 0)
    }

    async fn existing_external_ids(
        &self,
        ids: &[ExternalId],
    ) -> Result<HashSet<ExternalId>, CatalogueRepositoryError> {
        if ids.is_empty() {
            return Ok(HashSet::new());
        }
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let found: Vec<i64> = films::table
            .filter(films::external_id.eq_any(raw_external_ids(ids)))
            .select(films::external_id)
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(found.into_iter().map(ExternalId::new).collect())
    }

    async fn create_batch(&self, films: &[NewFilm]) -> Result<Vec<Film>, CatalogueRepositoryError> {
        if films.is_empty() {
            return Ok(Vec::new());
        }
        let rows: Vec<NewFilmRow<'_>> = films.iter().map(NewFilmRow::from).collect();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        // A single multi-row INSERT either stores every film or none.
        let mut created: Vec<FilmRow> = diesel::insert_into(films::table)
            .values(&rows)
            .returning(FilmRow::as_returning())
            .get_results(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        created.sort_by_key(|row| row.id);
        Ok(created.into_iter().map(Film::from).collect())
    }

    async fn ids_by_external_id(
        &self,
        ids: &[ExternalId],
    ) -> Result<HashMap<ExternalId, FilmId>, CatalogueRepositoryError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let pairs: Vec<(i64, i64)> = films::table
            .filter(films::external_id.eq_any(raw_external_ids(ids)))
            .select((films::external_id, films::id))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(pairs
            .into_iter()
            .map(|(external_id, id)| (ExternalId::new(external_id), FilmId::new(id)))
            .collect())
    }
}
