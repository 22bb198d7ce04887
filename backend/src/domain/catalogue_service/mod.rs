//! Catalogue use-cases behind the REST endpoints.
//!
//! [`CatalogueService`] implements the `CatalogueQuery` and
//! `CatalogueCommand` driving ports on top of the per-type store ports. Writes go through
//! [`CatalogueValidator`] on creation and clear the response cache once they
//! commit.

use std::sync::Arc;

use tracing::warn;

use crate::domain::Error;
use crate::domain::ports::{
    CatalogueRepositoryError, CharacterRepository, FilmRepository, ResponseCache,
    StarshipRepository,
};

mod command;
mod query;
mod validation;

pub use validation::CatalogueValidator;

/// Store and cache ports used by the catalogue service.
#[derive(Clone)]
pub struct CatalogueServicePorts {
    pub films: Arc<dyn FilmRepository>,
    pub characters: Arc<dyn CharacterRepository>,
    pub starships: Arc<dyn StarshipRepository>,
    pub cache: Arc<dyn ResponseCache>,
}

/// Catalogue read and write use-cases.
#[derive(Clone)]
pub struct CatalogueService {
    films: Arc<dyn FilmRepository>,
    characters: Arc<dyn CharacterRepository>,
    starships: Arc<dyn StarshipRepository>,
    cache: Arc<dyn ResponseCache>,
    validator: CatalogueValidator,
}

impl CatalogueService {
    /// Create a service over the given ports.
    pub fn new(ports: CatalogueServicePorts, validator: CatalogueValidator) -> Self {
        Self {
            films: ports.films,
            characters: ports.characters,
            starships: ports.starships,
            cache: ports.cache,
            validator,
        }
    }

    fn map_repository_error(error: CatalogueRepositoryError) -> Error {
        match error {
            CatalogueRepositoryError::Connection { message } => {
                Error::service_unavailable(format!("catalogue store unavailable: {message}"))
            }
            CatalogueRepositoryError::Query { message } => {
                Error::internal(format!("catalogue store error: {message}"))
            }
            CatalogueRepositoryError::Conflict { message } => Error::conflict(message),
            CatalogueRepositoryError::InvalidReference { message } => {
                Error::invalid_request(message)
            }
        }
    }

    fn search_term(name: &str) -> Result<&str, Error> {
        let term = name.trim();
        if term.is_empty() {
            return Err(Error::invalid_request(
                "provide a non-empty 'name' parameter to search",
            ));
        }
        Ok(term)
    }

    /// Drop every cached response after a committed write.
    ///
    /// Cache failures are logged; the write has already succeeded.
    async fn invalidate_cache(&self) {
        if let Err(error) = self.cache.invalidate_all().await {
            warn!(%error, "response cache invalidation failed");
        }
    }
}
