//! Starship entity.

use chrono::{DateTime, Utc};

use super::{CharacterId, FilmId, apply, entity_id, normalise_required_text};
use crate::domain::{Error, ExternalId};

entity_id! {
    /// Store identifier of a starship.
    StarshipId
}

/// A persisted starship with its films and pilots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Starship {
    /// Store identifier.
    pub id: StarshipId,
    /// Catalogue identity, or [`ExternalId::LOCAL`].
    pub external_id: ExternalId,
    /// Name; unique together with `model`.
    pub name: String,
    /// Model designation; unique together with `name`.
    pub model: String,
    /// Class such as `Deep Space Mobile Battlestation`.
    pub starship_class: Option<String>,
    /// Manufacturer credit.
    pub manufacturer: Option<String>,
    /// Cost label in galactic credits.
    pub cost_in_credits: Option<String>,
    /// Length label in metres.
    pub length: Option<String>,
    /// Crew label.
    pub crew: Option<String>,
    /// Passenger capacity label.
    pub passengers: Option<String>,
    /// Atmospheric top speed label.
    pub max_atmosphering_speed: Option<String>,
    /// Hyperdrive class label.
    pub hyperdrive_rating: Option<String>,
    /// Megalights per hour label.
    pub mglt: Option<String>,
    /// Cargo capacity label in kilograms.
    pub cargo_capacity: Option<String>,
    /// Consumables duration label.
    pub consumables: Option<String>,
    /// Films the starship appears in, ordered by id.
    pub films: Vec<FilmId>,
    /// Characters who piloted the starship, ordered by id.
    pub pilots: Vec<CharacterId>,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
    /// When the record was last changed.
    pub edited_at: DateTime<Utc>,
}

/// Attributes needed to create a starship.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewStarship {
    /// Catalogue identity, or [`ExternalId::LOCAL`].
    pub external_id: ExternalId,
    /// Name.
    pub name: String,
    /// Model designation.
    pub model: String,
    /// Class.
    pub starship_class: Option<String>,
    /// Manufacturer credit.
    pub manufacturer: Option<String>,
    /// Cost label.
    pub cost_in_credits: Option<String>,
    /// Length label.
    pub length: Option<String>,
    /// Crew label.
    pub crew: Option<String>,
    /// Passenger capacity label.
    pub passengers: Option<String>,
    /// Atmospheric top speed label.
    pub max_atmosphering_speed: Option<String>,
    /// Hyperdrive class label.
    pub hyperdrive_rating: Option<String>,
    /// Megalights per hour label.
    pub mglt: Option<String>,
    /// Cargo capacity label.
    pub cargo_capacity: Option<String>,
    /// Consumables duration label.
    pub consumables: Option<String>,
}

impl NewStarship {
    /// Normalise and validate name and model.
    ///
    /// # Errors
    ///
    /// Returns an invalid-request error when either is blank or too long.
    pub fn validated(mut self) -> Result<Self, Error> {
        self.name = normalise_required_text("name", &self.name)?;
        self.model = normalise_required_text("model", &self.model)?;
        Ok(self)
    }
}

/// Partial update of a starship. `None` leaves the attribute unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StarshipPatch {
    /// Replacement catalogue identity.
    pub external_id: Option<ExternalId>,
    /// Replacement name.
    pub name: Option<String>,
    /// Replacement model.
    pub model: Option<String>,
    /// Replacement class.
    pub starship_class: Option<Option<String>>,
    /// Replacement manufacturer.
    pub manufacturer: Option<Option<String>>,
    /// Replacement cost.
    pub cost_in_credits: Option<Option<String>>,
    /// Replacement length.
    pub length: Option<Option<String>>,
    /// Replacement crew.
    pub crew: Option<Option<String>>,
    /// Replacement passengers.
    pub passengers: Option<Option<String>>,
    /// Replacement atmospheric speed.
    pub max_atmosphering_speed: Option<Option<String>>,
    /// Replacement hyperdrive rating.
    pub hyperdrive_rating: Option<Option<String>>,
    /// Replacement MGLT.
    pub mglt: Option<Option<String>>,
    /// Replacement cargo capacity.
    pub cargo_capacity: Option<Option<String>>,
    /// Replacement consumables.
    pub consumables: Option<Option<String>>,
    /// Replacement film set.
    pub films: Option<Vec<FilmId>>,
    /// Replacement pilot set.
    pub pilots: Option<Vec<CharacterId>>,
}

impl StarshipPatch {
    /// Build a patch that overwrites every writable attribute and both sets.
    pub fn replacing(
        starship: NewStarship,
        films: Vec<FilmId>,
        pilots: Vec<CharacterId>,
    ) -> Self {
        Self {
            external_id: Some(starship.external_id),
            name: Some(starship.name),
            model: Some(starship.model),
            starship_class: Some(starship.starship_class),
            manufacturer: Some(starship.manufacturer),
            cost_in_credits: Some(starship.cost_in_credits),
            length: Some(starship.length),
            crew: Some(starship.crew),
            passengers: Some(starship.passengers),
            max_atmosphering_speed: Some(starship.max_atmosphering_speed),
            hyperdrive_rating: Some(starship.hyperdrive_rating),
            mglt: Some(starship.mglt),
            cargo_capacity: Some(starship.cargo_capacity),
            consumables: Some(starship.consumables),
            films: Some(films),
            pilots: Some(pilots),
        }
    }

    /// Normalise and validate supplied name and model.
    ///
    /// # Errors
    ///
    /// Returns an invalid-request error when a supplied value is invalid.
    pub fn validated(mut self) -> Result<Self, Error> {
        self.name = self
            .name
            .map(|name| normalise_required_text("name", &name))
            .transpose()?;
        self.model = self
            .model
            .map(|model| normalise_required_text("model", &model))
            .transpose()?;
        Ok(self)
    }

    /// Apply the scalar attributes of the patch to a loaded starship.
    pub fn apply_to(&self, starship: &mut Starship) {
        apply(&mut starship.external_id, self.external_id);
        apply(&mut starship.name, self.name.clone());
        apply(&mut starship.model, self.model.clone());
        apply(&mut starship.starship_class, self.starship_class.clone());
        apply(&mut starship.manufacturer, self.manufacturer.clone());
        apply(&mut starship.cost_in_credits, self.cost_in_credits.clone());
        apply(&mut starship.length, self.length.clone());
        apply(&mut starship.crew, self.crew.clone());
        apply(&mut starship.passengers, self.passengers.clone());
        apply(
            &mut starship.max_atmosphering_speed,
            self.max_atmosphering_speed.clone(),
        );
        apply(&mut starship.hyperdrive_rating, self.hyperdrive_rating.clone());
        apply(&mut starship.mglt, self.mglt.clone());
        apply(&mut starship.cargo_capacity, self.cargo_capacity.clone());
        apply(&mut starship.consumables, self.consumables.clone());
    }
}
