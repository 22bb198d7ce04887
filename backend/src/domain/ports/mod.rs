//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod cache_key;
mod catalogue_command;
mod catalogue_query;
mod catalogue_repository;
mod catalogue_source;
mod catalogue_sync_command;
mod character_repository;
mod film_repository;
mod response_cache;
mod starship_repository;
mod sync_metrics;

pub use cache_key::{ResponseCacheKey, ResponseCacheKeyValidationError};
#[cfg(test)]
pub use catalogue_command::MockCatalogueCommand;
pub use catalogue_command::CatalogueCommand;
#[cfg(test)]
pub use catalogue_query::MockCatalogueQuery;
pub use catalogue_query::CatalogueQuery;
pub use catalogue_repository::{CatalogueRepositoryError, RecordSlice};
#[cfg(test)]
pub use catalogue_source::MockCatalogueSource;
pub use catalogue_source::{
    CatalogueRecord, CatalogueResource, CatalogueSource, CatalogueSourceError, ExternalCharacter,
    ExternalFilm, ExternalStarship, FixtureCatalogueSource, PageResult,
};
#[cfg(test)]
pub use catalogue_sync_command::MockCatalogueSyncCommand;
pub use catalogue_sync_command::{
    CatalogueSyncCommand, FixtureCatalogueSyncCommand, SyncStatus, SyncTicket,
};
#[cfg(test)]
pub use character_repository::MockCharacterRepository;
pub use character_repository::{CharacterRepository, FixtureCharacterRepository};
#[cfg(test)]
pub use film_repository::MockFilmRepository;
pub use film_repository::{FilmRepository, FixtureFilmRepository};
#[cfg(test)]
pub use response_cache::MockResponseCache;
pub use response_cache::{CachedResponse, NoOpResponseCache, ResponseCache, ResponseCacheError};
#[cfg(test)]
pub use starship_repository::MockStarshipRepository;
pub use starship_repository::{FixtureStarshipRepository, StarshipRepository};
#[cfg(test)]
pub use sync_metrics::MockSyncMetrics;
pub use sync_metrics::{NoOpSyncMetrics, SyncMetrics, SyncMetricsError};
