//! PostgreSQL-backed `CharacterRepository` implementation using Diesel ORM.
//!
//! Film links live in `character_films`; every read attaches them with one
//! extra query per window rather than per record.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::result::Error as DieselError;
use diesel_async::scoped_futures::ScopedFutureExt as _;
use diesel_async::{AsyncConnection as _, AsyncPgConnection, RunQueryDsl};
use pagination::PageRequest;

use crate::domain::ports::{CatalogueRepositoryError, CharacterRepository, RecordSlice};
use crate::domain::{Character, CharacterId, CharacterPatch, ExternalId, FilmId, NewCharacter};

use super::diesel_error_mapping::{map_diesel_error, map_pool_error};
use super::diesel_helpers::{
    contains_pattern, group_links, page_bounds, total_from_count, unique_raw_ids,
};
use super::models::{CharacterFilmRow, CharacterRow, CharacterUpdate, NewCharacterRow};
use super::pool::DbPool;
use super::schema::{character_films, characters};

/// Diesel-backed implementation of the `CharacterRepository` port.
#[derive(Clone)]
pub struct DieselCharacterRepository {
    pool: DbPool,
}

impl DieselCharacterRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn window(
        &self,
        pattern: Option<String>,
        page: PageRequest,
    ) -> Result<RecordSlice<Character>, CatalogueRepositoryError> {
        let (limit, offset) = page_bounds(page)?;
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let mut count_query = characters::table.count().into_boxed();
        let mut rows_query = characters::table
            .select(CharacterRow::as_select())
            .order(characters::id.asc())
            .limit(limit)
            .offset(offset)
            .into_boxed();
        if let Some(pattern) = pattern {
            count_query = count_query.filter(characters::name.ilike(pattern.clone()));
            rows_query = rows_query.filter(characters::name.ilike(pattern));
        }

        let total: i64 = count_query
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let rows: Vec<CharacterRow> = rows_query
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let records = attach_films(&mut conn, rows)
            .await
            .map_err(map_diesel_error)?;

        Ok(RecordSlice {
            records,
            total: total_from_count(total),
        })
    }
}

/// Load film links for every character in `owners`, ordered by film id.
async fn load_film_links(
    conn: &mut AsyncPgConnection,
    owners: &[i64],
) -> QueryResult<HashMap<i64, Vec<FilmId>>> {
    if owners.is_empty() {
        return Ok(HashMap::new());
    }
    let pairs: Vec<(i64, i64)> = character_films::table
        .filter(character_films::character_id.eq_any(owners))
        .select((character_films::character_id, character_films::film_id))
        .order((character_films::character_id, character_films::film_id))
        .load(conn)
        .await?;
    Ok(group_links(pairs, FilmId::new))
}

async fn attach_films(
    conn: &mut AsyncPgConnection,
    rows: Vec<CharacterRow>,
) -> QueryResult<Vec<Character>> {
    let owners: Vec<i64> = rows.iter().map(|row| row.id).collect();
    let mut links = load_film_links(conn, &owners).await?;
    Ok(rows
        .into_iter()
        .map(|row| {
            let films = links.remove(&row.id).unwrap_or_default();
            row.into_character(films)
        })
        .collect())
}

/// Replace every film link of one character.
async fn write_film_links(
    conn: &mut AsyncPgConnection,
    character_id: i64,
    films: &[i64],
) -> QueryResult<()> {
    diesel::delete(character_films::table.filter(character_films::character_id.eq(character_id)))
        .execute(conn)
        .await?;
    if films.is_empty() {
        return Ok(());
    }
    let rows: Vec<CharacterFilmRow> = films
        .iter()
        .map(|&film_id| CharacterFilmRow {
            character_id,
            film_id,
        })
        .collect();
    diesel::insert_into(character_films::table)
        .values(&rows)
        .on_conflict_do_nothing()
        .execute(conn)
        .await?;
    Ok(())
}

#[async_trait]
impl CharacterRepository for DieselCharacterRepository {
    async fn list(
        &self,
        page: PageRequest,
    ) -> Result<RecordSlice<Character>, CatalogueRepositoryError> {
        self.window(None, page).await
    }

    async fn find_by_id(
        &self,
        id: CharacterId,
    ) -> Result<Option<Character>, CatalogueRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<CharacterRow> = characters::table
            .find(id.get())
            .select(CharacterRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        let Some(row) = row else {
            return Ok(None);
        };
        let mut characters = attach_films(&mut conn, vec![row])
            .await
            .map_err(map_diesel_error)?;
        Ok(characters.pop())
    }

    async fn search_by_name(
        &self,
        fragment: &str,
        page: PageRequest,
    ) -> Result<RecordSlice<Character>, CatalogueRepositoryError> {
        self.window(Some(contains_pattern(fragment)), page).await
    }

    async fn create(
        &self,
        character: &NewCharacter,
        films: &[FilmId],
    ) -> Result<Character, CatalogueRepositoryError> {
        let new_row = NewCharacterRow::from(character);
        let film_ids = unique_raw_ids(films, FilmId::get);
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        conn.transaction(|conn| {
            async move {
                let row: CharacterRow = diesel::insert_into(characters::table)
                    .values(&new_row)
                    .returning(CharacterRow::as_returning())
                    .get_result(conn)
                    .await?;
                write_film_links(conn, row.id, &film_ids).await?;
                let films = film_ids.into_iter().map(FilmId::new).collect();
                Ok(row.into_character(films))
            }
            .scope_boxed()
        })
        .await
        .map_err(map_diesel_error)
    }

    async fn update(
        &self,
        id: CharacterId,
        patch: &CharacterPatch,
    ) -> Result<Option<Character>, CatalogueRepositoryError> {
        let changes = CharacterUpdate::from(patch);
        let film_ids = patch
            .films
            .as_deref()
            .map(|films| unique_raw_ids(films, FilmId::get));
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        conn.transaction(|conn| {
            async move {
                let updated: Option<CharacterRow> =
                    diesel::update(characters::table.find(id.get()))
                        .set((&changes, characters::edited_at.eq(Utc::now())))
                        .returning(CharacterRow::as_returning())
                        .get_result(conn)
                        .await
                        .optional()?;
                let Some(row) = updated else {
                    return Ok::<_, DieselError>(None);
                };
                if let Some(film_ids) = film_ids {
                    write_film_links(conn, row.id, &film_ids).await?;
                }
                let mut characters = attach_films(conn, vec![row]).await?;
                Ok(characters.pop())
            }
            .scope_boxed()
        })
        .await
        .map_err(map_diesel_error)
    }

    async fn delete(&self, id: CharacterId) -> Result<bool, CatalogueRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let deleted = diesel::delete(characters::table.find(id.get()))
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
        let found: Vec<i64> = characters::table
            .filter(characters::external_id.eq_any(raw))
            .select(characters::external_id)
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(found.into_iter().map(ExternalId::new).collect())
    }

    async fn create_batch(
        &self,
        characters: &[NewCharacter],
    ) -> Result<Vec<Character>, CatalogueRepositoryError> {
        if characters.is_empty() {
            return Ok(Vec::new());
        }
        let rows: Vec<NewCharacterRow<'_>> = characters.iter().map(NewCharacterRow::from).collect();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let mut created: Vec<CharacterRow> = diesel::insert_into(characters::table)
            .values(&rows)
            .returning(CharacterRow::as_returning())
            .get_results(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        created.sort_by_key(|row| row.id);
        Ok(created
            .into_iter()
            .map(|row| row.into_character(Vec::new()))
            .collect())
    }

    async fn ids_by_external_id(
        &self,
        ids: &[ExternalId],
    ) -> Result<HashMap<ExternalId, CharacterId>, CatalogueRepositoryError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let raw: Vec<i64> = ids.iter().map(|id| id.get()).collect();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let pairs: Vec<(i64, i64)> = characters::table
            .filter(characters::external_id.eq_any(raw))
            .select((characters::external_id, characters::id))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(pairs
            .into_iter()
            .map(|(external_id, id)| (ExternalId::new(external_id), CharacterId::new(id)))
            .collect())
    }

    async fn find_by_external_ids(
        &self,
        ids: &[ExternalId],
    ) -> Result<Vec<Character>, CatalogueRepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let raw: Vec<i64> = ids.iter().map(|id| id.get()).collect();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<CharacterRow> = characters::table
            .filter(characters::external_id.eq_any(raw))
            .select(CharacterRow::as_select())
            .order(characters::id.asc())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        attach_films(&mut conn, rows)
            .await
            .map_err(map_diesel_error)
    }

    async fn replace_films(
        &self,
        id: CharacterId,
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
}
