//! Pure translation of raw catalogue records into creation attributes.

use chrono::NaiveDate;

use crate::domain::{
    ExternalId, ExternalIdError, NewCharacter, NewFilm, NewStarship, external_id_from_url,
};
use crate::domain::ports::{ExternalCharacter, ExternalFilm, ExternalStarship};

/// A catalogue record that cannot become an entity.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MappingError {
    /// The record has no `url`, so it has no catalogue identity.
    #[error("catalogue record has no resource url")]
    MissingUrl,
    /// The `url` does not end in a numeric identity.
    #[error(transparent)]
    InvalidUrl(#[from] ExternalIdError),
    /// A required attribute is absent or blank.
    #[error("catalogue record {url} has no `{field}`")]
    MissingField { url: String, field: &'static str },
    /// A required attribute failed entity validation.
    #[error("catalogue record {url} is invalid: {message}")]
    Invalid { url: String, message: String },
}

/// Read the catalogue identity of a record from its `url`.
///
/// # Errors
///
/// Returns [`MappingError::MissingUrl`] or [`MappingError::InvalidUrl`].
pub fn record_external_id(url: Option<&str>) -> Result<ExternalId, MappingError> {
    let url = url.ok_or(MappingError::MissingUrl)?;
    Ok(external_id_from_url(url)?)
}

/// Map a catalogue film; `title` becomes the name.
///
/// # Errors
///
/// Fails when the url or title is unusable.
pub fn map_film(record: &ExternalFilm) -> Result<NewFilm, MappingError> {
    let external_id = record_external_id(record.url.as_deref())?;
    let url = record.url.clone().unwrap_or_default();
    let name = required(&url, "title", record.title.as_deref())?;
    NewFilm {
        external_id,
        name,
        episode_id: record.episode_id,
        opening_crawl: record.opening_crawl.clone(),
        director: record.director.clone(),
        producer: record.producer.clone(),
        release_date: record.release_date.as_deref().and_then(parse_release_date),
    }
    .validated()
    .map_err(|error| invalid(&url, &error))
}

/// Map a catalogue character.
///
/// # Errors
///
/// Fails when the url or name is unusable.
pub fn map_character(record: &ExternalCharacter) -> Result<NewCharacter, MappingError> {
    let external_id = record_external_id(record.url.as_deref())?;
    let url = record.url.clone().unwrap_or_default();
    let name = required(&url, "name", record.name.as_deref())?;
    NewCharacter {
        external_id,
        name,
        birth_year: record.birth_year.clone(),
        eye_color: record.eye_color.clone(),
        gender: record.gender.clone(),
        hair_color: record.hair_color.clone(),
        height: record.height.as_deref().and_then(parse_height),
        mass: record.mass.clone(),
        skin_color: record.skin_color.clone(),
        homeworld: record.homeworld.clone(),
    }
    .validated()
    .map_err(|error| invalid(&url, &error))
}

/// Map a catalogue starship; `MGLT` becomes `mglt`.
///
/// # Errors
///
/// Fails when the url, name or model is unusable.
pub fn map_starship(record: &ExternalStarship) -> Result<NewStarship, MappingError> {
    let external_id = record_external_id(record.url.as_deref())?;
    let url = record.url.clone().unwrap_or_default();
    let name = required(&url, "name", record.name.as_deref())?;
    let model = required(&url, "model", record.model.as_deref())?;
    NewStarship {
        external_id,
        name,
        model,
        starship_class: record.starship_class.clone(),
        manufacturer: record.manufacturer.clone(),
        cost_in_credits: record.cost_in_credits.clone(),
        length: record.length.clone(),
        crew: record.crew.clone(),
        passengers: record.passengers.clone(),
        max_atmosphering_speed: record.max_atmosphering_speed.clone(),
        hyperdrive_rating: record.hyperdrive_rating.clone(),
        mglt: record.mglt.clone(),
        cargo_capacity: record.cargo_capacity.clone(),
        consumables: record.consumables.clone(),
    }
    .validated()
    .map_err(|error| invalid(&url, &error))
}

/// Parse a height made only of ASCII digits.
///
/// # Examples
/// ```
/// use starwars_rest::domain::catalogue_sync::parse_height;
///
/// assert_eq!(parse_height("172"), Some(172));
/// assert_eq!(parse_height("unknown"), None);
/// assert_eq!(parse_height("1,200"), None);
/// ```
pub fn parse_height(raw: &str) -> Option<i32> {
    if raw.is_empty() || !raw.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok()
}

/// Parse a `YYYY-MM-DD` release date.
pub fn parse_release_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

fn required(url: &str, field: &'static str, value: Option<&str>) -> Result<String, MappingError> {
    match value.map(str::trim) {
        Some(value) if !value.is_empty() => Ok(value.to_owned()),
        _ => Err(MappingError::MissingField {
            url: url.to_owned(),
            field,
        }),
    }
}

fn invalid(url: &str, error: &crate::domain::Error) -> MappingError {
    MappingError::Invalid {
        url: url.to_owned(),
        message: error.message().to_owned(),
    }
}
