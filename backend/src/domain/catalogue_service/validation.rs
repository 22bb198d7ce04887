//! Upstream catalogue checks applied when records are created directly.
//!
//! A record with a catalogue identity must exist upstream under the same
//! name (and model, for starships). Local records are accepted only when
//! unofficial records are allowed.

use tracing::debug;

use crate::domain::catalogue_client::CatalogueClient;
use crate::domain::ports::CatalogueSourceError;
use crate::domain::{Error, ExternalId, NewCharacter, NewFilm, NewStarship};

/// Checks new records against the upstream catalogue.
#[derive(Clone)]
pub struct CatalogueValidator {
    client: CatalogueClient,
    allow_unofficial: bool,
}

impl CatalogueValidator {
    pub fn new(client: CatalogueClient, allow_unofficial: bool) -> Self {
        Self {
            client,
            allow_unofficial,
        }
    }

    /// Check a film draft.
    ///
    /// # Errors
    ///
    /// `InvalidRequest` when the draft disagrees with the catalogue or is a
    /// disallowed local record; `ServiceUnavailable` when the catalogue
    /// cannot be read.
    pub async fn check_film(&self, film: &NewFilm) -> Result<(), Error> {
        let Some(id) = self.catalogue_identity("film", film.external_id)? else {
            return Ok(());
        };
        let record = self
            .client
            .fetch_film(id)
            .await
            .map_err(unavailable)?
            .ok_or_else(|| not_in_catalogue("film", id))?;
        ensure_matches("film", "title", id, &film.name, record.title.as_deref())
    }

    /// Check a character draft.
    ///
    /// # Errors
    ///
    /// See [`Self::check_film`].
    pub async fn check_character(&self, character: &NewCharacter) -> Result<(), Error> {
        let Some(id) = self.catalogue_identity("character", character.external_id)? else {
            return Ok(());
        };
        let record = self
            .client
            .fetch_character(id)
            .await
            .map_err(unavailable)?
            .ok_or_else(|| not_in_catalogue("character", id))?;
        ensure_matches(
            "character",
            "name",
            id,
            &character.name,
            record.name.as_deref(),
        )
    }

    /// Check a starship draft, comparing both name and model.
    ///
    /// # Errors
    ///
    /// See [`Self::check_film`].
    pub async fn check_starship(&self, starship: &NewStarship) -> Result<(), Error> {
        let Some(id) = self.catalogue_identity("starship", starship.external_id)? else {
            return Ok(());
        };
        let record = self
            .client
            .fetch_starship(id)
            .await
            .map_err(unavailable)?
            .ok_or_else(|| not_in_catalogue("starship", id))?;
        ensure_matches(
            "starship",
            "name",
            id,
            &starship.name,
            record.name.as_deref(),
        )?;
        ensure_matches(
            "starship",
            "model",
            id,
            &starship.model,
            record.model.as_deref(),
        )
    }

    /// Return the identity to look up, or `None` for an accepted local record.
    fn catalogue_identity(
        &self,
        kind: &str,
        external_id: ExternalId,
    ) -> Result<Option<ExternalId>, Error> {
        match external_id.catalogue() {
            Some(id) => Ok(Some(id)),
            None if self.allow_unofficial => {
                debug!(kind, "accepting local record");
                Ok(None)
            }
            None => Err(Error::invalid_request(format!(
                "{kind} is not in the catalogue and unofficial records are not allowed"
            ))),
        }
    }
}

fn unavailable(error: CatalogueSourceError) -> Error {
    Error::service_unavailable(format!("catalogue validation unavailable: {error}"))
}

fn not_in_catalogue(kind: &str, id: ExternalId) -> Error {
    Error::invalid_request(format!("no {kind} found in the catalogue with id {id}"))
}

fn ensure_matches(
    kind: &str,
    field: &str,
    id: ExternalId,
    supplied: &str,
    published: Option<&str>,
) -> Result<(), Error> {
    let matches = published
        .is_some_and(|published| published.trim().to_lowercase() == supplied.to_lowercase());
    if matches {
        return Ok(());
    }
    Err(Error::invalid_request(format!(
        "{kind} {field} '{supplied}' does not match catalogue record {id}"
    )))
}
