//! Character repository over the in-memory store.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pagination::PageRequest;

use super::{
    InMemoryCatalogueStore, StoreState, check_external_id, name_matches, sorted_unique, window,
};
use crate::domain::ports::{CatalogueRepositoryError, CharacterRepository, RecordSlice};
use crate::domain::{Character, CharacterId, CharacterPatch, ExternalId, FilmId, NewCharacter};

fn check_character_unique(
    state: &StoreState,
    name: &str,
    external_id: ExternalId,
    except: Option<CharacterId>,
) -> Result<(), CatalogueRepositoryError> {
    let others = || {
        state
            .characters
            .values()
            .filter(move |character| Some(character.id) != except)
    };
    if others().any(|character| character.name == name) {
        return Err(CatalogueRepositoryError::conflict(format!(
            "character named {name:?} already exists"
        )));
    }
    check_external_id(
        "character",
        external_id,
        others().map(|character| character.external_id),
    )
}

fn insert_character(
    state: &mut StoreState,
    character: &NewCharacter,
    films: Vec<FilmId>,
    now: DateTime<Utc>,
) -> Character {
    let id = CharacterId::new(state.next_id());
    let stored = Character {
        id,
        external_id: character.external_id,
        name: character.name.clone(),
        birth_year: character.birth_year.clone(),
        eye_color: character.eye_color.clone(),
        gender: character.gender.clone(),
        hair_color: character.hair_color.clone(),
        height: character.height,
        mass: character.mass.clone(),
        skin_color: character.skin_color.clone(),
        homeworld: character.homeworld.clone(),
        films,
        created_at: now,
        edited_at: now,
    };
    state.characters.insert(id, stored.clone());
    stored
}

#[async_trait]
impl CharacterRepository for InMemoryCatalogueStore {
    async fn list(
        &self,
        page: PageRequest,
    ) -> Result<RecordSlice<Character>, CatalogueRepositoryError> {
        let state = self.lock()?;
        Ok(window(state.characters.values(), page))
    }

    async fn find_by_id(
        &self,
        id: CharacterId,
    ) -> Result<Option<Character>, CatalogueRepositoryError> {
        Ok(self.lock()?.characters.get(&id).cloned())
    }

    async fn search_by_name(
        &self,
        fragment: &str,
        page: PageRequest,
    ) -> Result<RecordSlice<Character>, CatalogueRepositoryError> {
        let state = self.lock()?;
        Ok(window(
            state
                .characters
                .values()
                .filter(|character| name_matches(&character.name, fragment)),
            page,
        ))
    }

    async fn create(
        &self,
        character: &NewCharacter,
        films: &[FilmId],
    ) -> Result<Character, CatalogueRepositoryError> {
        let now = self.now();
        let mut state = self.lock()?;
        check_character_unique(&state, &character.name, character.external_id, None)?;
        let films = sorted_unique(films);
        state.check_films_exist(&films)?;
        Ok(insert_character(&mut state, character, films, now))
    }

    async fn update(
        &self,
        id: CharacterId,
        patch: &CharacterPatch,
    ) -> Result<Option<Character>, CatalogueRepositoryError> {
        let now = self.now();
        let mut state = self.lock()?;
        let Some(mut character) = state.characters.get(&id).cloned() else {
            return Ok(None);
        };
        patch.apply_to(&mut character);
        check_character_unique(&state, &character.name, character.external_id, Some(id))?;
        if let Some(films) = &patch.films {
            let films = sorted_unique(films);
            state.check_films_exist(&films)?;
            character.films = films;
        }
        character.edited_at = now;
        state.characters.insert(id, character.clone());
        Ok(Some(character))
    }

    async fn delete(&self, id: CharacterId) -> Result<bool, CatalogueRepositoryError> {
        let mut state = self.lock()?;
        if state.characters.remove(&id).is_none() {
            return Ok(false);
        }
        for starship in state.starships.values_mut() {
            starship.pilots.retain(|pilot| *pilot != id);
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
            .characters
            .values()
            .map(|character| character.external_id)
            .filter(|id| !id.is_local() && wanted.contains(id))
            .collect())
    }

    async fn create_batch(
        &self,
        characters: &[NewCharacter],
    ) -> Result<Vec<Character>, CatalogueRepositoryError> {
        let now = self.now();
        let mut state = self.lock()?;
        for (index, character) in characters.iter().enumerate() {
            check_character_unique(&state, &character.name, character.external_id, None)?;
            let earlier = characters.iter().take(index);
            if earlier.clone().any(|other| other.name == character.name)
                || (!character.external_id.is_local()
                    && earlier
                        .clone()
                        .any(|other| other.external_id == character.external_id))
            {
                return Err(CatalogueRepositoryError::conflict(format!(
                    "batch repeats character {:?}",
                    character.name
                )));
            }
        }
        Ok(characters
            .iter()
            .map(|character| insert_character(&mut state, character, Vec::new(), now))
            .collect())
    }

    async fn ids_by_external_id(
        &self,
        ids: &[ExternalId],
    ) -> Result<HashMap<ExternalId, CharacterId>, CatalogueRepositoryError> {
        let wanted: HashSet<_> = ids.iter().copied().collect();
        let state = self.lock()?;
        Ok(state
            .characters
            .values()
            .filter(|character| {
                !character.external_id.is_local() && wanted.contains(&character.external_id)
            })
            .map(|character| (character.external_id, character.id))
            .collect())
    }

    async fn find_by_external_ids(
        &self,
        ids: &[ExternalId],
    ) -> Result<Vec<Character>, CatalogueRepositoryError> {
        let wanted: HashSet<_> = ids.iter().copied().collect();
        let state = self.lock()?;
        Ok(state
            .characters
            .values()
            .filter(|character| {
                !character.external_id.is_local() && wanted.contains(&character.external_id)
            })
            .cloned()
            .collect())
    }

    async fn replace_films(
        &self,
        id: CharacterId,
        films: &[FilmId],
    ) -> Result<(), CatalogueRepositoryError> {
        let mut state = self.lock()?;
        let films = sorted_unique(films);
        state.check_films_exist(&films)?;
        match state.characters.get_mut(&id) {
            Some(character) => {
                character.films = films;
                Ok(())
            }
            None => Err(CatalogueRepositoryError::invalid_reference(format!(
                "character {id} does not exist"
            ))),
        }
    }
}
