//! Catalogue entities: films, characters and starships.
//!
//! Each entity comes in three shapes:
//! - the persisted record (`Film`, `Character`, `Starship`);
//! - the creation attribute set (`NewFilm`, ...) shared by direct creation
//!   and bulk synchronisation;
//! - a patch (`FilmPatch`, ...) where `None` leaves an attribute untouched.

mod character;
mod film;
mod starship;

pub use character::{Character, CharacterId, CharacterPatch, NewCharacter};
pub use film::{Film, FilmId, FilmPatch, NewFilm};
pub use starship::{NewStarship, Starship, StarshipId, StarshipPatch};

use crate::domain::Error;

/// Longest accepted name or model.
pub const MAX_NAME_LENGTH: usize = 200;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            serde::Serialize,
            serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Wrap a raw store identifier.
            #[must_use]
            pub const fn new(value: i64) -> Self {
                Self(value)
            }

            /// Raw store identifier.
            #[must_use]
            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

pub(crate) use entity_id;

/// Validate a required text attribute such as a name or starship model.
///
/// Surrounding whitespace is trimmed; the result must be non-empty and at
/// most [`MAX_NAME_LENGTH`] characters.
///
/// # Errors
///
/// Returns an invalid-request [`Error`] naming `field` when the value fails
/// validation.
pub fn normalise_required_text(field: &str, value: &str) -> Result<String, Error> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::invalid_request(format!("{field} must not be empty")));
    }
    if trimmed.chars().count() > MAX_NAME_LENGTH {
        return Err(Error::invalid_request(format!(
            "{field} must be at most {MAX_NAME_LENGTH} characters"
        )));
    }
    Ok(trimmed.to_owned())
}

/// Apply a patch value to an attribute, keeping the old value when absent.
pub(crate) fn apply<T>(current: &mut T, patch: Option<T>) {
    if let Some(value) = patch {
        *current = value;
    }
}
