//! PostgreSQL-backed `StarshipRepository` implementation using Diesel ORM.
//!
//! Film links live in `starship_films` and pilot links in `starship_pilots`.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::result::Error as DieselError;
use diesel_async::scoped_futures::ScopedFutureExt as _;
use diesel_async::{AsyncConnection as _, AsyncPgConnection, RunQueryDsl};
use pagination::PageRequest;

use crate::domain::ports::{CatalogueRepositoryError, RecordSlice, StarshipRepository};
use crate::domain::{
    CharacterId, ExternalId, FilmId, NewStarship, Starship, StarshipId, StarshipPatch,
};

use super::diesel_error_mapping::{map_diesel_error, map_pool_error};
use super::diesel_helpers::{
    contains_pattern, group_links, page_bounds, total_from_count, unique_raw_ids,
};
use super::models::{
    NewStarshipRow, StarshipFilmRow, StarshipPilotRow, StarshipRow, StarshipUpdate,
};
use super::pool::DbPool;
use super::schema::{starship_films, starship_pilots, starships};

/// Diesel-backed implementation of the `StarshipRepository` port.
#[derive(Clone)]
pub struct DieselStarshipRepository {
    pool: DbPool,
}

impl DieselStarshipRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn window(
        &self,
        pattern: Option<String>,
        page: PageRequest,
    ) -> Result<RecordSlice<Starship>, CatalogueRepositoryError> {
        let (limit, offset) = page_bounds(page)?;
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let mut count_query = starships::table.count().into_boxed();
        let mut rows_query = starships::table
            .select(StarshipRow::as_select())
            .order(starships::id.asc())
            .limit(limit)
            .offset(offset)
            .into_boxed();
        if let Some(pattern) = pattern {
            count_query = count_query.filter(starships::name.ilike(pattern.clone()));
            rows_query = rows_query.filter(starships::name.ilike(pattern));
        }

        let total: i64 = count_query
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let rows: Vec<StarshipRow> = rows_query
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let records = attach_links(&mut conn, rows)
            .await
            .map_err(map_diesel_error)?;

        Ok(RecordSlice {
            records,
            total: total_from_count(total),
        })
    }
}

async fn attach_links(
    conn: &mut AsyncPgConnection,
    rows: Vec<StarshipRow>,
) -> QueryResult<Vec<Starship>> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }
    let owners: Vec<i64> = rows.iter().map(|row| row.id).collect();

    let film_pairs: Vec<(i64, i64)> = starship_films::table
        .filter(starship_films::starship_id.eq_any(&owners))
        .select((starship_films::starship_id, starship_films::film_id))
        .order((starship_films::starship_id, starship_films::film_id))
        .load(conn)
        .await?;
    let pilot_pairs: Vec<(i64, i64)> = starship_pilots::table
        .filter(starship_pilots::starship_id.eq_any(&owners))
        .select((starship_pilots::starship_id, starship_pilots::character_id))
        .order((starship_pilots::starship_id, starship_pilots::character_id))
        .load(conn)
        .await?;

    let mut films = group_links(film_pairs, FilmId::new);
    let mut pilots = group_links(pilot_pairs, CharacterId::new);
    Ok(rows
        .into_iter()
        .map(|row| {
            let row_films = films.remove(&row.id).unwrap_or_default();
            let row_pilots = pilots.remove(&row.id).unwrap_or_default();
            row.into_starship(row_films, row_pilots)
        })
        .collect())
}

async fn write_film_links(
    conn: &mut AsyncPgConnection,
    starship_id: i64,
    films: &[i64],
) -> QueryResult<()> {
    diesel::delete(starship_films::table.filter(starship_films::starship_id.eq(starship_id)))
        .execute(conn)
        .await?;
    if films.is_empty() {
        return Ok(());
    }
    let rows: Vec<StarshipFilmRow> = films
        .iter()
        .map(|&film_id| StarshipFilmRow {
            starship_id,
            film_id,
        })
        .collect();
    diesel::insert_into(starship_films::table)
        .values(&rows)
        .on_conflict_do_nothing()
        .execute(conn)
        .await?;
    Ok(())
}

async fn write_pilot_links(
    conn: &mut AsyncPgConnection,
    starship_id: i64,
    pilots: &[i64],
) -> QueryResult<()> {
    diesel::delete(starship_pilots::table.filter(starship_pilots::starship_id.eq(starship_id)))
        .execute(conn)
        .await?;
    if pilots.is_empty() {
        return Ok(());
    }
    let rows: Vec<StarshipPilotRow> = pilots
        .iter()
        .map(|&character_id| StarshipPilotRow {
            starship_id,
            character_id,
        })
        .collect();
    diesel::insert_into(starship_pilots::table)
        .values(&rows)
        .on_conflict_do_nothing()
        .execute(conn)
        .await?;
    Ok(())
}

#[async_trait]
impl StarshipRepository for DieselStarshipRepository {
    async fn list(
        &self,
        page: PageRequest,
    ) -> Result<RecordSlice<Starship>, CatalogueRepositoryError> {
        self.window(None, page).await
    }

    async fn find_by_id(
        &self,
        id: StarshipId,
    ) -> Result<Option<Starship>, CatalogueRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<StarshipRow> = starships::table
            .find(id.get())
            .select(StarshipRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        let Some(row) = row else {
            return Ok(None);
        };
        let mut starships = attach_links(&mut conn, vec![row])
            .await
            .map_err(map_diesel_error)?;
        Ok(starships.pop())
    }

    async fn search_by_name(
        &self,
        fragment: &str,
        page: PageRequest,
    ) -> Result<RecordSlice<Starship>, CatalogueRepositoryError> {
        self.window(Some(contains_pattern(fragment)), page).await
    }

    async fn create(
        &self,
        starship: &NewStarship,
        films: &[FilmId],
        pilots: &[CharacterId],
    ) -> Result<Starship, CatalogueRepositoryError> {
        let new_row = NewStarshipRow::from(starship);
        let film_ids = unique_raw_ids(films, FilmId::get);
        let pilot_ids = unique_raw_ids(pilots, CharacterId::get);
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        conn.transaction(|conn| {
            async move {
                let row: StarshipRow = diesel::insert_into(starships::table)
                    .values(&new_row)
                    .returning(StarshipRow::as_returning())
                    .get_result(conn)
                    .await?;
                write_film_links(conn, row.id, &film_ids).await?;
                write_pilot_links(conn, row.id, &pilot_ids).await?;
                let films = film_ids.into_iter().map(FilmId::new).collect();
                let pilots = pilot_ids.into_iter().map(CharacterId::new).collect();
                Ok(row.into_starship(films, pilots))
            }
            .scope_boxed()
        })
        .await
        .map_err(map_diesel_error)
    }

    async fn update(
        &self,
        id: StarshipId,
        patch: &StarshipPatch,
    ) -> Result<Option<Starship>, CatalogueRepositoryError> {
        let changes = StarshipUpdate::from(patch);
        let film_ids = patch
            .films
            .as_deref()
            .map(|films| unique_raw_ids(films, FilmId::get));
        let pilot_ids = patch
            .pilots
            .as_deref()
            .map(|pilots| unique_raw_ids(pilots, CharacterId::get));
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        conn.transaction(|conn| {
            async move {
                let updated: Option<StarshipRow> = diesel::update(starships::table.find(id.get()))
                    .set((&changes, starships::edited_at.eq(Utc::now())))
                    .returning(StarshipRow::as_returning())
                    .get_result(conn)
                    .await
                    .optional()?;
                let Some(row) = updated else {
                    return Ok::<_, DieselError>(None);
                };
                if let Some(film_ids) = film_ids {
                    write_film_links(conn, row.id, &film_ids).await?;
                }
                if let Some(pilot_ids) = pilot_ids {
                    write_pilot_links(conn, row.id, &pilot_ids).await?;
                }
                let mut starships = attach_links(conn, vec![row]).await?;
                Ok(starships.pop())
            }
            .scope_boxed()
        })
        .await
        .map_err(map_diesel_error)
    }

    async fn delete(&self, id: StarshipId) -> Result<bool, CatalogueRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let deleted = diesel::delete(starships::table.find(id.get()))
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
        let raw: Vec<i64> = ids.iter().map(|id| id.get()).collect();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let found: Vec<i64> = starships::table
            .filter(starships::external_id.eq_any(raw))
            .select(starships::external_id)
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(found.into_iter().map(ExternalId::new).collect())
    }

    async fn create_batch(
        &self,
        starships: &[NewStarship],
    ) -> Result<Vec<Starship>, CatalogueRepositoryError> {
        if starships.is_empty() {
            return Ok(Vec::new());
        }
        let rows: Vec<NewStarshipRow<'_>> = starships.iter().map(NewStarshipRow::from).collect();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let mut created: Vec<StarshipRow> = diesel::insert_into(starships::table)
            .values(&rows)
            .returning(StarshipRow::as_returning())
            .get_results(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        created.sort_by_key(|row| row.id);
        Ok(created
            .into_iter()
            .map(|row| row.into_starship(Vec::new(), Vec::new()))
            .collect())
    }

    async fn ids_by_external_id(
        &self,
        ids: &[ExternalId],
    ) -> Result<HashMap<ExternalId, StarshipId>, CatalogueRepositoryError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let raw: Vec<i64> = ids.iter().map(|id| id.get()).collect();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let pairs: Vec<(i64, i64)> = starships::table
            .filter(starships::external_id.eq_any(raw))
            .select((starships::external_id, starships::id))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(pairs
            .into_iter()
            .map(|(external_id, id)| (ExternalId::new(external_id), StarshipId::new(id)))
            .collect())
    }

    async fn find_by_external_ids(
        &self,
        ids: &[ExternalId],
    ) -> Result<Vec<Starship>, CatalogueRepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let raw: Vec<i64> = ids.iter().map(|id| id.get()).collect();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<StarshipRow> = starships::table
            .filter(starships::external_id.eq_any(raw))
            .select(StarshipRow::as_select())
            .order(starships::id.asc())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        attach_links(&mut conn, rows)
            .await
            .map_err(map_diesel_error)
    }

    async fn replace_films(
        &self,
        id: StarshipId,
        films: &[FilmId],
    ) -> Result<(), CatalogueRepositoryError> {
        let film_ids = unique_raw_ids(films, FilmId::get);
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        conn.transaction(|conn| {
            async move { write_film_links(conn, id.get(), &film_ids).await }.scope_boxed()
        })
        .await
        .map_err(map_diesel_error)
    }

    async fn replace_pilots(
        &self,
        id: StarshipId,
        pilots: &[CharacterId],
    ) -> Result<(), CatalogueRepositoryError> {
        let pilot_ids = unique_raw_ids(pilots, CharacterId::get);
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        conn.transaction(|conn| {
            async move { write_pilot_links(conn, id.get(), &pilot_ids).await }.scope_boxed()
        })
        .await
        .map_err(map_diesel_error)
    }
}
