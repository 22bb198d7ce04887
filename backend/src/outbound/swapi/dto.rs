//! DTOs for decoding catalogue JSON records.
//!
//! Every attribute is optional on the wire; required fields are enforced by
//! the sync mapper and the direct-API validator, not here.

use serde::Deserialize;

use crate::domain::ports::{ExternalCharacter, ExternalFilm, ExternalStarship};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct FilmDto {
    url: Option<String>,
    title: Option<String>,
    episode_id: Option<i32>,
    opening_crawl: Option<String>,
    director: Option<String>,
    producer: Option<String>,
    release_date: Option<String>,
}

impl From<FilmDto> for ExternalFilm {
    fn from(dto: FilmDto) -> Self {
        Self {
            url: dto.url,
            title: dto.title,
            episode_id: dto.episode_id,
            opening_crawl: dto.opening_crawl,
            director: dto.director,
            producer: dto.producer,
            release_date: dto.release_date,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct CharacterDto {
    url: Option<String>,
    name: Option<String>,
    birth_year: Option<String>,
    eye_color: Option<String>,
    gender: Option<String>,
    hair_color: Option<String>,
    height: Option<String>,
    mass: Option<String>,
    skin_color: Option<String>,
    homeworld: Option<String>,
    films: Vec<String>,
}

impl From<CharacterDto> for ExternalCharacter {
    fn from(dto: CharacterDto) -> Self {
        Self {
            url: dto.url,
            name: dto.name,
            birth_year: dto.birth_year,
            eye_color: dto.eye_color,
            gender: dto.gender,
            hair_color: dto.hair_color,
            height: dto.height,
            mass: dto.mass,
            skin_color: dto.skin_color,
            homeworld: dto.homeworld,
            films: dto.films,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct StarshipDto {
    url: Option<String>,
    name: Option<String>,
    model: Option<String>,
    starship_class: Option<String>,
    manufacturer: Option<String>,
    cost_in_credits: Option<String>,
    length: Option<String>,
    crew: Option<String>,
    passengers: Option<String>,
    max_atmosphering_speed: Option<String>,
    hyperdrive_rating: Option<String>,
    #[serde(rename = "MGLT")]
    mglt: Option<String>,
    cargo_capacity: Option<String>,
    consumables: Option<String>,
    films: Vec<String>,
    pilots: Vec<String>,
}

impl From<StarshipDto> for ExternalStarship {
    fn from(dto: StarshipDto) -> Self {
        Self {
            url: dto.url,
            name: dto.name,
            model: dto.model,
            starship_class: dto.starship_class,
            manufacturer: dto.manufacturer,
            cost_in_credits: dto.cost_in_credits,
            length: dto.length,
            crew: dto.crew,
            passengers: dto.passengers,
            max_atmosphering_speed: dto.max_atmosphering_speed,
            hyperdrive_rating: dto.hyperdrive_rating,
            mglt: dto.mglt,
            cargo_capacity: dto.cargo_capacity,
            consumables: dto.consumables,
            films: dto.films,
            pilots: dto.pilots,
        }
    }
}
