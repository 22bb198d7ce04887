//! In-process catalogue store.
//!
//! Implements the film, character and starship repository ports over maps
//! guarded by one mutex, enforcing the same uniqueness, reference and
//! cascade rules as the PostgreSQL schema. Used when no database URL is
//! configured and by tests.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use mockable::{Clock, DefaultClock};
use pagination::PageRequest;

use crate::domain::ports::{CatalogueRepositoryError, RecordSlice};
use crate::domain::{
    Character, CharacterId, ExternalId, Film, FilmId, Starship, StarshipId,
};

mod characters;
mod films;
mod starships;

/// Mutex-guarded catalogue store.
pub struct InMemoryCatalogueStore {
    state: Mutex<StoreState>,
    clock: Arc<dyn Clock>,
}

#[derive(Default)]
struct StoreState {
    last_id: i64,
    films: BTreeMap<FilmId, Film>,
    characters: BTreeMap<CharacterId, Character>,
    starships: BTreeMap<StarshipId, Starship>,
}

impl StoreState {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }

    fn check_films_exist(&self, films: &[FilmId]) -> Result<(), CatalogueRepositoryError> {
        match films.iter().find(|id| !self.films.contains_key(id)) {
            Some(missing) => Err(CatalogueRepositoryError::invalid_reference(format!(
                "film {missing} does not exist"
            ))),
            None => Ok(()),
        }
    }

    fn check_characters_exist(
        &self,
        characters: &[CharacterId],
    ) -> Result<(), CatalogueRepositoryError> {
        match characters.iter().find(|id| !self.characters.contains_key(id)) {
            Some(missing) => Err(CatalogueRepositoryError::invalid_reference(format!(
                "character {missing} does not exist"
            ))),
            None => Ok(()),
        }
    }
}

impl Default for InMemoryCatalogueStore {
    fn default() -> Self {
        Self::new(Arc::new(DefaultClock))
    }
}

impl InMemoryCatalogueStore {
    /// Build an empty store stamping records with `clock`.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Mutex::new(StoreState::default()),
            clock,
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, StoreState>, CatalogueRepositoryError> {
        self.state
            .lock()
            .map_err(|_| CatalogueRepositoryError::connection("in-memory store lock poisoned"))
    }

    fn now(&self) -> DateTime<Utc> {
        self.clock.utc()
    }
}

/// Cut one window out of records already in id order.
fn window<'a, T: Clone + 'a>(
    records: impl Iterator<Item = &'a T>,
    page: PageRequest,
) -> RecordSlice<T> {
    let matching: Vec<&T> = records.collect();
    let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX);
    let limit = usize::try_from(page.limit()).unwrap_or(usize::MAX);
    RecordSlice {
        total: u64::try_from(matching.len()).unwrap_or(u64::MAX),
        records: matching
            .into_iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect(),
    }
}

fn name_matches(name: &str, fragment: &str) -> bool {
    name.to_lowercase().contains(&fragment.to_lowercase())
}

/// Reject a catalogue identity already held by another record.
fn check_external_id(
    kind: &str,
    external_id: ExternalId,
    mut taken: impl Iterator<Item = ExternalId>,
) -> Result<(), CatalogueRepositoryError> {
    if external_id.is_local() || !taken.any(|existing| existing == external_id) {
        return Ok(());
    }
    Err(CatalogueRepositoryError::conflict(format!(
        "{kind} with external id {external_id} already exists"
    )))
}

fn sorted_unique<T: Ord + Copy>(ids: &[T]) -> Vec<T> {
    let mut ids = ids.to_vec();
    ids.sort_unstable();
    ids.dedup();
    ids
}
