//! Film entity.

use chrono::{DateTime, NaiveDate, Utc};

use super::{apply, entity_id, normalise_required_text};
use crate::domain::{Error, ExternalId};

entity_id! {
    /// Store identifier of a film.
    FilmId
}

/// A persisted film.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Film {
    /// Store identifier.
    pub id: FilmId,
    /// Catalogue identity, or [`ExternalId::LOCAL`].
    pub external_id: ExternalId,
    /// Unique title.
    pub name: String,
    /// Episode number within the saga.
    pub episode_id: Option<i32>,
    /// Opening crawl text.
    pub opening_crawl: Option<String>,
    /// Director credit.
    pub director: Option<String>,
    /// Producer credit.
    pub producer: Option<String>,
    /// Theatrical release date.
    pub release_date: Option<NaiveDate>,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
    /// When the record was last changed.
    pub edited_at: DateTime<Utc>,
}

/// Attributes needed to create a film.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewFilm {
    /// Catalogue identity, or [`ExternalId::LOCAL`].
    pub external_id: ExternalId,
    /// Unique title.
    pub name: String,
    /// Episode number within the saga.
    pub episode_id: Option<i32>,
    /// Opening crawl text.
    pub opening_crawl: Option<String>,
    /// Director credit.
    pub director: Option<String>,
    /// Producer credit.
    pub producer: Option<String>,
    /// Theatrical release date.
    pub release_date: Option<NaiveDate>,
}

impl NewFilm {
    /// Normalise and validate the title.
    ///
    /// # Errors
    ///
    /// Returns an invalid-request error when the title is blank or too long.
    pub fn validated(mut self) -> Result<Self, Error> {
        self.name = normalise_required_text("name", &self.name)?;
        Ok(self)
    }
}

/// Partial update of a film. `None` leaves the attribute unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilmPatch {
    /// Replacement catalogue identity.
    pub external_id: Option<ExternalId>,
    /// Replacement title.
    pub name: Option<String>,
    /// Replacement episode number; `Some(None)` clears it.
    pub episode_id: Option<Option<i32>>,
    /// Replacement opening crawl.
    pub opening_crawl: Option<Option<String>>,
    /// Replacement director credit.
    pub director: Option<Option<String>>,
    /// Replacement producer credit.
    pub producer: Option<Option<String>>,
    /// Replacement release date.
    pub release_date: Option<Option<NaiveDate>>,
}

impl FilmPatch {
    /// Build a patch that overwrites every writable attribute.
    pub fn replacing(film: NewFilm) -> Self {
        Self {
            external_id: Some(film.external_id),
            name: Some(film.name),
            episode_id: Some(film.episode_id),
            opening_crawl: Some(film.opening_crawl),
            director: Some(film.director),
            producer: Some(film.producer),
            release_date: Some(film.release_date),
        }
    }

    /// Normalise and validate a supplied title.
    ///
    /// # Errors
    ///
    /// Returns an invalid-request error when a supplied title is invalid.
    pub fn validated(mut self) -> Result<Self, Error> {
        self.name = self
            .name
            .map(|name| normalise_required_text("name", &name))
            .transpose()?;
        Ok(self)
    }

    /// Apply the patch to a loaded film.
    pub fn apply_to(&self, film: &mut Film) {
        apply(&mut film.external_id, self.external_id);
        apply(&mut film.name, self.name.clone());
        apply(&mut film.episode_id, self.episode_id);
        apply(&mut film.opening_crawl, self.opening_crawl.clone());
        apply(&mut film.director, self.director.clone());
        apply(&mut film.producer, self.producer.clone());
        apply(&mut film.release_date, self.release_date);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn film() -> Film {
        let at = Utc.with_ymd_and_hms(2025, 5, 4, 12, 0, 0).single().expect("valid time");
        Film {
            id: FilmId::new(1),
            external_id: ExternalId::new(1),
            name: "A New Hope".to_owned(),
            episode_id: Some(4),
            opening_crawl: None,
            director: Some("George Lucas".to_owned()),
            producer: None,
            release_date: NaiveDate::from_ymd_opt(1977, 5, 25),
            created_at: at,
            edited_at: at,
        }
    }

    #[test]
    fn patch_touches_only_supplied_attributes() {
        let mut film = film();
        let patch = FilmPatch {
            producer: Some(Some("Gary Kurtz".to_owned())),
            director: Some(None),
            ..FilmPatch::default()
        };

        patch.apply_to(&mut film);

        assert_eq!(film.name, "A New Hope");
        assert_eq!(film.episode_id, Some(4));
        assert_eq!(film.producer.as_deref(), Some("Gary Kurtz"));
        assert!(film.director.is_none());
    }

    #[test]
    fn replacing_patch_overwrites_everything() {
        let mut film = film();
        let patch = FilmPatch::replacing(NewFilm {
            name: "Episode IV".to_owned(),
            ..NewFilm::default()
        });

        patch.apply_to(&mut film);

        assert_eq!(film.name, "Episode IV");
        assert_eq!(film.external_id, ExternalId::LOCAL);
        assert!(film.episode_id.is_none());
        assert!(film.release_date.is_none());
    }

    #[test]
    fn validated_patch_rejects_blank_title() {
        let patch = FilmPatch {
            name: Some("  ".to_owned()),
            ..FilmPatch::default()
        };
        assert!(patch.validated().is_err());
    }
}
