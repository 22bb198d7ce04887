//! Character entity.

use chrono::{DateTime, Utc};

use super::{FilmId, apply, entity_id, normalise_required_text};
use crate::domain::{Error, ExternalId};

entity_id! {
    /// Store identifier of a character.
    CharacterId
}

/// A persisted character with the films it appears in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Character {
    /// Store identifier.
    pub id: CharacterId,
    /// Catalogue identity, or [`ExternalId::LOCAL`].
    pub external_id: ExternalId,
    /// Unique name.
    pub name: String,
    /// Birth year label such as `19BBY`.
    pub birth_year: Option<String>,
    /// Eye colour.
    pub eye_color: Option<String>,
    /// Gender label.
    pub gender: Option<String>,
    /// Hair colour.
    pub hair_color: Option<String>,
    /// Height in centimetres.
    pub height: Option<i32>,
    /// Mass label in kilograms.
    pub mass: Option<String>,
    /// Skin colour.
    pub skin_color: Option<String>,
    /// Homeworld label.
    pub homeworld: Option<String>,
    /// Films the character appears in, ordered by id.
    pub films: Vec<FilmId>,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
    /// When the record was last changed.
    pub edited_at: DateTime<Utc>,
}

/// Attributes needed to create a character.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewCharacter {
    /// Catalogue identity, or [`ExternalId::LOCAL`].
    pub external_id: ExternalId,
    /// Unique name.
    pub name: String,
    /// Birth year label.
    pub birth_year: Option<String>,
    /// Eye colour.
    pub eye_color: Option<String>,
    /// Gender label.
    pub gender: Option<String>,
    /// Hair colour.
    pub hair_color: Option<String>,
    /// Height in centimetres.
    pub height: Option<i32>,
    /// Mass label.
    pub mass: Option<String>,
    /// Skin colour.
    pub skin_color: Option<String>,
    /// Homeworld label.
    pub homeworld: Option<String>,
}

impl NewCharacter {
    /// Normalise and validate the name.
    ///
    /// # Errors
    ///
    /// Returns an invalid-request error when the name is blank or too long.
    pub fn validated(mut self) -> Result<Self, Error> {
        self.name = normalise_required_text("name", &self.name)?;
        Ok(self)
    }
}

/// Partial update of a character. `None` leaves the attribute unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CharacterPatch {
    /// Replacement catalogue identity.
    pub external_id: Option<ExternalId>,
    /// Replacement name.
    pub name: Option<String>,
    /// Replacement birth year.
    pub birth_year: Option<Option<String>>,
    /// Replacement eye colour.
    pub eye_color: Option<Option<String>>,
    /// Replacement gender.
    pub gender: Option<Option<String>>,
    /// Replacement hair colour.
    pub hair_color: Option<Option<String>>,
    /// Replacement height.
    pub height: Option<Option<i32>>,
    /// Replacement mass.
    pub mass: Option<Option<String>>,
    /// Replacement skin colour.
    pub skin_color: Option<Option<String>>,
    /// Replacement homeworld.
    pub homeworld: Option<Option<String>>,
    /// Replacement film set.
    pub films: Option<Vec<FilmId>>,
}

impl CharacterPatch {
    /// Build a patch that overwrites every writable attribute and the film set.
    pub fn replacing(character: NewCharacter, films: Vec<FilmId>) -> Self {
        Self {
            external_id: Some(character.external_id),
            name: Some(character.name),
            birth_year: Some(character.birth_year),
            eye_color: Some(character.eye_color),
            gender: Some(character.gender),
            hair_color: Some(character.hair_color),
            height: Some(character.height),
            mass: Some(character.mass),
            skin_color: Some(character.skin_color),
            homeworld: Some(character.homeworld),
            films: Some(films),
        }
    }

    /// Normalise and validate a supplied name.
    ///
    /// # Errors
    ///
    /// Returns an invalid-request error when a supplied name is invalid.
    pub fn validated(mut self) -> Result<Self, Error> {
        self.name = self
            .name
            .map(|name| normalise_required_text("name", &name))
            .transpose()?;
        Ok(self)
    }

    /// Apply the scalar attributes of the patch to a loaded character.
    ///
    /// The film set is left to the store, which owns relationship rows.
    pub fn apply_to(&self, character: &mut Character) {
        apply(&mut character.external_id, self.external_id);
        apply(&mut character.name, self.name.clone());
        apply(&mut character.birth_year, self.birth_year.clone());
        apply(&mut character.eye_color, self.eye_color.clone());
        apply(&mut character.gender, self.gender.clone());
        apply(&mut character.hair_color, self.hair_color.clone());
        apply(&mut character.height, self.height);
        apply(&mut character.mass, self.mass.clone());
        apply(&mut character.skin_color, self.skin_color.clone());
        apply(&mut character.homeworld, self.homeworld.clone());
    }
}
