//! Starship repository over the in-memory store.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pagination::PageRequest;

use super::{
    InMemoryCatalogueStore, StoreState, check_external_id, name_matches, sorted_unique, window,
};
use crate::domain::ports::{CatalogueRepositoryError, RecordSlice, StarshipRepository};
use crate::domain::{
    CharacterId, ExternalId, FilmId, NewStarship, Starship, StarshipId, StarshipPatch,
};

fn check_starship_unique(
    state: &StoreState,
    name: &str,
    model: &str,
    external_id: ExternalId,
    except: Option<StarshipId>,
) -> Result<(), CatalogueRepositoryError> {
    let others = || {
        state
            .starships
            .values()
            .filter(move |starship| Some(starship.id) != except)
    };
    if others().any(|starship| starship.name == name && starship.model == model) {
        return Err(CatalogueRepositoryError::conflict(format!(
            "starship {name:?} of model {model:?} already exists"
        )));
    }
    check_external_id(
        "starship",
        external_id,
        others().map(|starship| starship.external_id),
    )
}

fn insert_starship(
    state: &mut StoreState,
    starship: &NewStarship,
    films: Vec<FilmId>,
    pilots: Vec<CharacterId>,
    now: DateTime<Utc>,
) -> Starship {
    let id = StarshipId::new(state.next_id());
    let stored = Starship {
        id,
        external_id: starship.external_id,
        name: starship.name.clone(),
        model: starship.model.clone(),
        starship_class: starship.starship_class.clone(),
        manufacturer: starship.manufacturer.clone(),
        cost_in_credits: starship.cost_in_credits.clone(),
        length: starship.length.clone(),
        crew: starship.crew.clone(),
        passengers: starship.passengers.clone(),
        max_atmosphering_speed: starship.max_atmosphering_speed.clone(),
        hyperdrive_rating: starship.hyperdrive_rating.clone(),
        mglt: starship.mglt.clone(),
        cargo_capacity: starship.cargo_capacity.clone(),
        consumables: starship.consumables.clone(),
        films,
        pilots,
        created_at: now,
        edited_at: now,
    };
    state.starships.insert(id, stored.clone());
    stored
}

#[async_trait]
impl StarshipRepository for InMemoryCatalogueStore {
    async fn list(
        &self,
        page: PageRequest,
    ) -> Result<RecordSlice<Starship>, CatalogueRepositoryError> {
        let state = self.lock()?;
        Ok(window(state.starships.values(), page))
    }

    async fn find_by_id(
        &self,
        id: StarshipId,
    ) -> Result<Option<Starship>, CatalogueRepositoryError> {
        Ok(self.lock()?.starships.get(&id).cloned())
    }

    async fn search_by_name(
        &self,
        fragment: &str,
        page: PageRequest,
    ) -> Result<RecordSlice<Starship>, CatalogueRepositoryError> {
        let state = self.lock()?;
        Ok(window(
            state
                .starships
                .values()
                .filter(|starship| name_matches(&starship.name, fragment)),
            page,
        ))
    }

    async fn create(
        &self,
        starship: &NewStarship,
        films: &[FilmId],
        pilots: &[CharacterId],
    ) -> Result<Starship, CatalogueRepositoryError> {
        let now = self.now();
        let mut state = self.lock()?;
        check_starship_unique(
            &state,
            &starship.name,
            &starship.model,
            starship.external_id,
            None,
        )?;
        let films = sorted_unique(films);
        let pilots = sorted_unique(pilots);
        state.check_films_exist(&films)?;
        state.check_characters_exist(&pilots)?;
        Ok(insert_starship(&mut state, starship, films, pilots, now))
    }

    async fn update(
        &self,
        id: StarshipId,
        patch: &StarshipPatch,
    ) -> Result<Option<Starship>, CatalogueRepositoryError> {
        let now = self.now();
        let mut state = self.lock()?;
        let Some(mut starship) = state.starships.get(&id).cloned() else {
            return Ok(None);
        };
        patch.apply_to(&mut starship);
        check_starship_unique(
            &state,
            &starship.name,
            &starship.model,
            starship.external_id,
            Some(id),
        )?;
        if let Some(films) = &patch.films {
            let films = sorted_unique(films);
            state.check_films_exist(&films)?;
            starship.films = films;
        }
        if let Some(pilots) = &patch.pilots {
            let pilots = sorted_unique(pilots);
            state.check_characters_exist(&pilots)?;
            starship.pilots = pilots;
        }
        starship.edited_at = now;
        state.starships.insert(id, starship.clone());
        Ok(Some(starship))
    }

    async fn delete(&self, id: StarshipId) -> Result<bool, CatalogueRepositoryError> {
        Ok(self.lock()?.starships.remove(&id).is_some())
    }

    async fn existing_external_ids(
        &self,
        ids: &[ExternalId],
    ) -> Result<HashSet<ExternalId>, CatalogueRepositoryError> {
        let wanted: HashSet<_> = ids.iter().copied().collect();
        let state = self.lock()?;
        Ok(state
            .starships
            .values()
            .map(|starship| starship.external_id)
            .filter(|id| !id.is_local() && wanted.contains(id))
            .collect())
    }

    async fn create_batch(
        &self,
        starships: &[NewStarship],
    ) -> Result<Vec<Starship>, CatalogueRepositoryError> {
        let now = self.now();
        let mut state = self.lock()?;
        for (index, starship) in starships.iter().enumerate() {
            check_starship_unique(
                &state,
                &starship.name,
                &starship.model,
                starship.external_id,
                None,
            )?;
            let earlier = starships.iter().take(index);
            if earlier
                .clone()
                .any(|other| other.name == starship.name && other.model == starship.model)
                || (!starship.external_id.is_local()
                    && earlier
                        .clone()
                        .any(|other| other.external_id == starship.external_id))
            {
                return Err(CatalogueRepositoryError::conflict(format!(
                    "batch repeats starship {:?}",
                    starship.name
                )));
            }
        }
        Ok(starships
            .iter()
            .map(|starship| insert_starship(&mut state, starship, Vec::new(), Vec::new(), now))
            .collect())
    }

    async fn ids_by_external_id(
        &self,
        ids: &[ExternalId],
    ) -> Result<HashMap<ExternalId, StarshipId>, CatalogueRepositoryError> {
        let wanted: HashSet<_> = ids.iter().copied().collect();
        let state = self.lock()?;
        Ok(state
            .starships
            .values()
            .filter(|starship| {
                !starship.external_id.is_local() && wanted.contains(&starship.external_id)
            })
            .map(|starship| (starship.external_id, starship.id))
            .collect())
    }

    async fn find_by_external_ids(
        &self,
        ids: &[ExternalId],
    ) -> Result<Vec<Starship>, CatalogueRepositoryError> {
        let wanted: HashSet<_> = ids.iter().copied().collect();
        let state = self.lock()?;
        Ok(state
            .starships
            .values()
            .filter(|starship| {
                !starship.external_id.is_local() && wanted.contains(&starship.external_id)
            })
            .cloned()
            .collect())
    }

    async fn replace_films(
        &self,
        id: StarshipId,
        films: &[FilmId],
    ) -> Result<(), CatalogueRepositoryError> {
        let mut state = self.lock()?;
        let films = sorted_unique(films);
        state.check_films_exist(&films)?;
        match state.starships.get_mut(&id) {
            Some(starship) => {
                starship.films = films;
                Ok(())
            }
            None => Err(CatalogueRepositoryError::invalid_reference(format!(
                "starship {id} does not exist"
            ))),
        }
    }

    async fn replace_pilots(
        &self,
        id: StarshipId,
        pilots: &[CharacterId],
    ) -> Result<(), CatalogueRepositoryError> {
        let mut state = self.lock()?;
        let pilots = sorted_unique(pilots);
        state.check_characters_exist(&pilots)?;
        match state.starships.get_mut(&id) {
            Some(starship) => {
                starship.pilots = pilots;
                Ok(())
            }
            None => Err(CatalogueRepositoryError::invalid_reference(format!(
                "starship {id} does not exist"
            ))),
        }
    }
}
