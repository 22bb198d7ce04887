//! Film repository over the in-memory store.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use pagination::PageRequest;

use super::{InMemoryCatalogueStore, StoreState, check_external_id, name_matches, window};
use crate::domain::ports::{CatalogueRepositoryError, FilmRepository, RecordSlice};
use crate::domain::{ExternalId, Film, FilmId, FilmPatch, NewFilm};

fn check_film_unique(
    state: &StoreState,
    name: &str,
    external_id: ExternalId,
    except: Option<FilmId>,
) -> Result<(), CatalogueRepositoryError> {
    let others = || state.films.values().filter(move |film| Some(film.id) != except);
    if others().any(|film| film.name == name) {
        return Err(CatalogueRepositoryError::conflict(format!(
            "film named {name:?} already exists"
        )));
    }
    check_external_id("film", external_id, others().map(|film| film.external_id))
}

fn insert_film(state: &mut StoreState, film: &NewFilm, now: chrono::DateTime<chrono::Utc>) -> Film {
    let id = FilmId::new(state.next_id());
    let stored = Film {
        id,
        external_id: film.external_id,
        name: film.name.clone(),
        episode_id: film.episode_id,
        opening_crawl: film.opening_crawl.clone(),
        director: film.director.clone(),
        producer: film.producer.clone(),
        release_date: film.release_date,
        created_at: now,
        edited_at: now,
    };
    state.films.insert(id, stored.clone());
    stored
}

#[async_trait]
impl FilmRepository for InMemoryCatalogueStore {
    async fn list(&self, page: PageRequest) -> Result<RecordSlice<Film>, CatalogueRepositoryError> {
        let state = self.lock()?;
        Ok(window(state.films.values(), page))
    }

    async fn find_by_id(&self, id: FilmId) -> Result<Option<Film>, CatalogueRepositoryError> {
        Ok(self.lock()?.films.get(&id).cloned())
    }

    async fn search_by_name(
        &self,
        fragment: &str,
        page: PageRequest,
    ) -> Result<RecordSlice<Film>, CatalogueRepositoryError> {
        let state = self.lock()?;
        Ok(window(
            state
                .films
                .values()
                .filter(|film| name_matches(&film.name, fragment)),
            page,
        ))
    }

    async fn create(&self, film: &NewFilm) -> Result<Film, CatalogueRepositoryError> {
        let now = self.now();
        let mut state = self.lock()?;
        check_film_unique(&state, &film.name, film.external_id, None)?;
        Ok(insert_film(&mut state, film, now))
    }

    async fn update(
        &self,
        id: FilmId,
        patch: &FilmPatch,
    ) -> Result<Option<Film>, CatalogueRepositoryError> {
        let now = self.now();
        let mut state = self.lock()?;
        let Some(mut film) = state.films.get(&id).cloned() else {
            return Ok(None);
        };
        patch.apply_to(&mut film);
        check_film_unique(&state, &film.name, film.external_id, Some(id))?;
        film.edited_at = now;
        state.films.insert(id, film.clone());
        Ok(Some(film))
    }

    async fn delete(&self, id: FilmId) -> Result<bool, CatalogueRepositoryError> {
        let mut state = self.lock()?;
        if state.films.remove(&id).is_none() {
            return Ok(false);
        }
        for character in state.characters.values_mut() {
            character.films.retain(|film| *film != id);
        }
        for starship in state.starships.values_mut() {
            starship.films.retain(|film| *film != id);
        }
        Ok(true)
    }

    async fn existing_external_ids(
        &self,
        ids: &[ExternalId],
    ) -> Result<HashSet<ExternalId>, CatalogueRepositoryError> {
        let wanted: HashSet<_> = ids.iter().copied().collect();
        let state = self.lock()?;
        Ok(state
            .films
            .values()
            .map(|film| film.external_id)
            .filter(|id| !id.is_local() && wanted.contains(id))
            .collect())
    }

    async fn create_batch(&self, films: &[NewFilm]) -> Result<Vec<Film>, CatalogueRepositoryError> {
        let now = self.now();
        let mut state = self.lock()?;
        for (index, film) in films.iter().enumerate() {
            check_film_unique(&state, &film.name, film.external_id, None)?;
            let earlier = films.iter().take(index);
            if earlier.clone().any(|other| other.name == film.name)
                || (!film.external_id.is_local()
                    && earlier.clone().any(|other| other.external_id == film.external_id))
            {
                return Err(CatalogueRepositoryError::conflict(format!(
                    "batch repeats film {:?}",
                    film.name
                )));
            }
        }
        Ok(films
            .iter()
            .map(|film| insert_film(&mut state, film, now))
            .collect())
    }

    async fn ids_by_external_id(
        &self,
        ids: &[ExternalId],
    ) -> Result<HashMap<ExternalId, FilmId>, CatalogueRepositoryError> {
        let wanted: HashSet<_> = ids.iter().copied().collect();
        let state = self.lock()?;
        Ok(state
            .films
            .values()
            .filter(|film| !film.external_id.is_local() && wanted.contains(&film.external_id))
            .map(|film| (film.external_id, film.id))
            .collect())
    }
}
