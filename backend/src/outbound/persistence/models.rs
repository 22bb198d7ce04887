//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain. Conversions to and from domain entities
//! live here so the repositories only orchestrate queries.

use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;

use super::schema::{
    character_films, characters, films, starship_films, starship_pilots, starships,
};
use crate::domain::{
    Character, CharacterId, CharacterPatch, ExternalId, Film, FilmId, FilmPatch, NewCharacter,
    NewFilm, NewStarship, Starship, StarshipId, StarshipPatch,
};

/// Borrow the inner string of a nullable patch value.
fn nullable_str(value: &Option<Option<String>>) -> Option<Option<&str>> {
    value.as_ref().map(Option::as_deref)
}

// ---------------------------------------------------------------------------
// Films
// ---------------------------------------------------------------------------

/// Row struct for reading from the films table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = films)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct FilmRow {
    pub id: i64,
    pub external_id: i64,
    pub name: String,
    pub episode_id: Option<i32>,
    pub opening_crawl: Option<String>,
    pub director: Option<String>,
    pub producer: Option<String>,
    pub release_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub edited_at: DateTime<Utc>,
}

impl From<FilmRow> for Film {
    fn from(row: FilmRow) -> Self {
        Self {
            id: FilmId::new(row.id),
            external_id: ExternalId::new(row.external_id),
            name: row.name,
            episode_id: row.episode_id,
            opening_crawl: row.opening_crawl,
            director: row.director,
            producer: row.producer,
            release_date: row.release_date,
            created_at: row.created_at,
            edited_at: row.edited_at,
        }
    }
}

/// Insertable struct for creating film records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = films)]
pub(crate) struct NewFilmRow<'a> {
    pub external_id: i64,
    pub name: &'a str,
    pub episode_id: Option<i32>,
    pub opening_crawl: Option<&'a str>,
    pub director: Option<&'a str>,
    pub producer: Option<&'a str>,
    pub release_date: Option<NaiveDate>,
}

impl<'a> From<&'a NewFilm> for NewFilmRow<'a> {
    fn from(film: &'a NewFilm) -> Self {
        Self {
            external_id: film.external_id.get(),
            name: &film.name,
            episode_id: film.episode_id,
            opening_crawl: film.opening_crawl.as_deref(),
            director: film.director.as_deref(),
            producer: film.producer.as_deref(),
            release_date: film.release_date,
        }
    }
}

/// Changeset struct for patching film records.
///
/// `None` skips a column; `Some(None)` writes `NULL`.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = films)]
pub(crate) struct FilmUpdate<'a> {
    pub external_id: Option<i64>,
    pub name: Option<&'a str>,
    pub episode_id: Option<Option<i32>>,
    pub opening_crawl: Option<Option<&'a str>>,
    pub director: Option<Option<&'a str>>,
    pub producer: Option<Option<&'a str>>,
    pub release_date: Option<Option<NaiveDate>>,
}

impl<'a> From<&'a FilmPatch> for FilmUpdate<'a> {
    fn from(patch: &'a FilmPatch) -> Self {
        Self {
            external_id: patch.external_id.map(ExternalId::get),
            name: patch.name.as_deref(),
            episode_id: patch.episode_id,
            opening_crawl: nullable_str(&patch.opening_crawl),
            director: nullable_str(&patch.director),
            producer: nullable_str(&patch.producer),
            release_date: patch.release_date,
        }
    }
}

// ---------------------------------------------------------------------------
// Characters
// ---------------------------------------------------------------------------

/// Row struct for reading from the characters table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = characters)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct CharacterRow {
    pub id: i64,
    pub external_id: i64,
    pub name: String,
    pub birth_year: Option<String>,
    pub eye_color: Option<String>,
    pub gender: Option<String>,
    pub hair_color: Option<String>,
    pub height: Option<i32>,
    pub mass: Option<String>,
    pub skin_color: Option<String>,
    pub homeworld: Option<String>,
    pub created_at: DateTime<Utc>,
    pub edited_at: DateTime<Utc>,
}

impl CharacterRow {
    /// Combine the row with its film links.
    pub(crate) fn into_character(self, films: Vec<FilmId>) -> Character {
        Character {
            id: CharacterId::new(self.id),
            external_id: ExternalId::new(self.external_id),
            name: self.name,
            birth_year: self.birth_year,
            eye_color: self.eye_color,
            gender: self.gender,
            hair_color: self.hair_color,
            height: self.height,
            mass: self.mass,
            skin_color: self.skin_color,
            homeworld: self.homeworld,
            films,
            created_at: self.created_at,
            edited_at: self.edited_at,
        }
    }
}

/// Insertable struct for creating character records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = characters)]
pub(crate) struct NewCharacterRow<'a> {
    pub external_id: i64,
    pub name: &'a str,
    pub birth_year: Option<&'a str>,
    pub eye_color: Option<&'a str>,
    pub gender: Option<&'a str>,
    pub hair_color: Option<&'a str>,
    pub height: Option<i32>,
    pub mass: Option<&'a str>,
    pub skin_color: Option<&'a str>,
    pub homeworld: Option<&'a str>,
}

impl<'a> From<&'a NewCharacter> for NewCharacterRow<'a> {
    fn from(character: &'a NewCharacter) -> Self {
        Self {
            external_id: character.external_id.get(),
            name: &character.name,
            birth_year: character.birth_year.as_deref(),
            eye_color: character.eye_color.as_deref(),
            gender: character.gender.as_deref(),
            hair_color: character.hair_color.as_deref(),
            height: character.height,
            mass: character.mass.as_deref(),
            skin_color: character.skin_color.as_deref(),
            homeworld: character.homeworld.as_deref(),
        }
    }
}

/// Changeset struct for patching character records.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = characters)]
pub(crate) struct CharacterUpdate<'a> {
    pub external_id: Option<i64>,
    pub name: Option<&'a str>,
    pub birth_year: Option<Option<&'a str>>,
    pub eye_color: Option<Option<&'a str>>,
    pub gender: Option<Option<&'a str>>,
    pub hair_color: Option<Option<&'a str>>,
    pub height: Option<Option<i32>>,
    pub mass: Option<Option<&'a str>>,
    pub skin_color: Option<Option<&'a str>>,
    pub homeworld: Option<Option<&'a str>>,
}

impl<'a> From<&'a CharacterPatch> for CharacterUpdate<'a> {
    fn from(patch: &'a CharacterPatch) -> Self {
        Self {
            external_id: patch.external_id.map(ExternalId::get),
            name: patch.name.as_deref(),
            birth_year: nullable_str(&patch.birth_year),
            eye_color: nullable_str(&patch.eye_color),
            gender: nullable_str(&patch.gender),
            hair_color: nullable_str(&patch.hair_color),
            height: patch.height,
            mass: nullable_str(&patch.mass),
            skin_color: nullable_str(&patch.skin_color),
            homeworld: nullable_str(&patch.homeworld),
        }
    }
}

/// Link between a character and a film.
#[derive(Debug, Clone, Copy, Insertable)]
#[diesel(table_name = character_films)]
pub(crate) struct CharacterFilmRow {
    pub character_id: i64,
    pub film_id: i64,
}

// ---------------------------------------------------------------------------
// Starships
// ---------------------------------------------------------------------------

/// Row struct for reading from the starships table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = starships)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct StarshipRow {
    pub id: i64,
    pub external_id: i64,
    pub name: String,
    pub model: String,
    pub starship_class: Option<String>,
    pub manufacturer: Option<String>,
    pub cost_in_credits: Option<String>,
    pub length: Option<String>,
    pub crew: Option<String>,
    pub passengers: Option<String>,
    pub max_atmosphering_speed: Option<String>,
    pub hyperdrive_rating: Option<String>,
    pub mglt: Option<String>,
    pub cargo_capacity: Option<String>,
    pub consumables: Option<String>,
    pub created_at: DateTime<Utc>,
    pub edited_at: DateTime<Utc>,
}

impl StarshipRow {
    /// Combine the row with its film and pilot links.
    pub(crate) fn into_starship(self, films: Vec<FilmId>, pilots: Vec<CharacterId>) -> Starship {
        Starship {
            id: StarshipId::new(self.id),
            external_id: ExternalId::new(self.external_id),
            name: self.name,
            model: self.model,
            starship_class: self.starship_class,
            manufacturer: self.manufacturer,
            cost_in_credits: self.cost_in_credits,
            length: self.length,
            crew: self.crew,
            passengers: self.passengers,
            max_atmosphering_speed: self.max_atmosphering_speed,
            hyperdrive_rating: self.hyperdrive_rating,
            mglt: self.mglt,
            cargo_capacity: self.cargo_capacity,
            consumables: self.consumables,
            films,
            pilots,
            created_at: self.created_at,
            edited_at: self.edited_at,
        }
    }
}

/// Insertable struct for creating starship records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = starships)]
pub(crate) struct NewStarshipRow<'a> {
    pub external_id: i64,
    pub name: &'a str,
    pub model: &'a str,
    pub starship_class: Option<&'a str>,
    pub manufacturer: Option<&'a str>,
    pub cost_in_credits: Option<&'a str>,
    pub length: Option<&'a str>,
    pub crew: Option<&'a str>,
    pub passengers: Option<&'a str>,
    pub max_atmosphering_speed: Option<&'a str>,
    pub hyperdrive_rating: Option<&'a str>,
    pub mglt: Option<&'a str>,
    pub cargo_capacity: Option<&'a str>,
    pub consumables: Option<&'a str>,
}

impl<'a> From<&'a NewStarship> for NewStarshipRow<'a> {
    fn from(starship: &'a NewStarship) -> Self {
        Self {
            external_id: starship.external_id.get(),
            name: &starship.name,
            model: &starship.model,
            starship_class: starship.starship_class.as_deref(),
            manufacturer: starship.manufacturer.as_deref(),
            cost_in_credits: starship.cost_in_credits.as_deref(),
            length: starship.length.as_deref(),
            crew: starship.crew.as_deref(),
            passengers: starship.passengers.as_deref(),
            max_atmosphering_speed: starship.max_atmosphering_speed.as_deref(),
            hyperdrive_rating: starship.hyperdrive_rating.as_deref(),
            mglt: starship.mglt.as_deref(),
            cargo_capacity: starship.cargo_capacity.as_deref(),
            consumables: starship.consumables.as_deref(),
        }
    }
}

/// Changeset struct for patching starship records.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = starships)]
pub(crate) struct StarshipUpdate<'a> {
    pub external_id: Option<i64>,
    pub name: Option<&'a str>,
    pub model: Option<&'a str>,
    pub starship_class: Option<Option<&'a str>>,
    pub manufacturer: Option<Option<&'a str>>,
    pub cost_in_credits: Option<Option<&'a str>>,
    pub length: Option<Option<&'a str>>,
    pub crew: Option<Option<&'a str>>,
    pub passengers: Option<Option<&'a str>>,
    pub max_atmosphering_speed: Option<Option<&'a str>>,
    pub hyperdrive_rating: Option<Option<&'a str>>,
    pub mglt: Option<Option<&'a str>>,
    pub cargo_capacity: Option<Option<&'a str>>,
    pub consumables: Option<Option<&'a str>>,
}

impl<'a> From<&'a StarshipPatch> for StarshipUpdate<'a> {
    fn from(patch: &'a StarshipPatch) -> Self {
        Self {
            external_id: patch.external_id.map(ExternalId::get),
            name: patch.name.as_deref(),
            model: patch.model.as_deref(),
            starship_class: nullable_str(&patch.starship_class),
            manufacturer: nullable_str(&patch.manufacturer),
            cost_in_credits: nullable_str(&patch.cost_in_credits),
            length: nullable_str(&patch.length),
            crew: nullable_str(&patch.crew),
            passengers: nullable_str(&patch.passengers),
            max_atmosphering_speed: nullable_str(&patch.max_atmosphering_speed),
            hyperdrive_rating: nullable_str(&patch.hyperdrive_rating),
            mglt: nullable_str(&patch.mglt),
            cargo_capacity: nullable_str(&patch.cargo_capacity),
            consumables: nullable_str(&patch.consumables),
        }
    }
}

/// Link between a starship and a film.
#[derive(Debug, Clone, Copy, Insertable)]
#[diesel(table_name = starship_films)]
pub(crate) struct StarshipFilmRow {
    pub starship_id: i64,
    pub film_id: i64,
}

/// Link between a starship and a pilot.
#[derive(Debug, Clone, Copy, Insertable)]
#[diesel(table_name = starship_pilots)]
pub(crate) struct StarshipPilotRow {
    pub starship_id: i64,
    pub character_id: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn film_update_distinguishes_skip_from_clear() {
        let patch = FilmPatch {
            director: Some(None),
            producer: Some(Some("Gary Kurtz".to_owned())),
            ..FilmPatch::default()
        };

        let update = FilmUpdate::from(&patch);

        assert_eq!(update.director, Some(None));
        assert_eq!(update.producer, Some(Some("Gary Kurtz")));
        assert!(update.opening_crawl.is_none());
        assert!(update.name.is_none());
    }

    #[rstest]
    fn new_starship_row_borrows_local_identity() {
        let starship = NewStarship {
            name: "Slave I".to_owned(),
            model: "Firespray-31".to_owned(),
            mglt: Some("70".to_owned()),
            ..NewStarship::default()
        };

        let row = NewStarshipRow::from(&starship);

        assert_eq!(row.external_id, 0);
        assert_eq!(row.model, "Firespray-31");
        assert_eq!(row.mglt, Some("70"));
    }
}
