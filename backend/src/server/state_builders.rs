//! Builders for the catalogue store, catalogue client and HTTP state.

use std::sync::Arc;

use actix_web::web;
use mockable::{Clock, DefaultClock};
use starwars_rest::domain::catalogue_client::{CatalogueClient, RetryPolicy};
use starwars_rest::domain::catalogue_service::{
    CatalogueService, CatalogueServicePorts, CatalogueValidator,
};
use starwars_rest::domain::catalogue_sync::{
    BackgroundCatalogueSync, CatalogueSyncPorts, CatalogueSyncService,
};
use starwars_rest::domain::ports::{
    CatalogueSource, CharacterRepository, FilmRepository, StarshipRepository, SyncMetrics,
};
use starwars_rest::inbound::http::state::{HttpState, HttpStatePorts};
use starwars_rest::outbound::memory::InMemoryCatalogueStore;
use starwars_rest::outbound::persistence::{
    DieselCharacterRepository, DieselFilmRepository, DieselStarshipRepository,
};
use starwars_rest::outbound::swapi::SwapiHttpSource;

use super::ServerConfig;

/// Film, character and starship repositories sharing one backing store.
#[derive(Clone)]
struct Repositories {
    films: Arc<dyn FilmRepository>,
    characters: Arc<dyn CharacterRepository>,
    starships: Arc<dyn StarshipRepository>,
}

/// Select the Diesel repositories when a pool is configured, otherwise one
/// shared in-memory store.
fn build_repositories(config: &ServerConfig) -> Repositories {
    match &config.db_pool {
        Some(pool) => Repositories {
            films: Arc::new(DieselFilmRepository::new(pool.clone())),
            characters: Arc::new(DieselCharacterRepository::new(pool.clone())),
            starships: Arc::new(DieselStarshipRepository::new(pool.clone())),
        },
        None => {
            let store = Arc::new(InMemoryCatalogueStore::default());
            Repositories {
                films: store.clone(),
                characters: store.clone(),
                starships: store,
            }
        }
    }
}

fn build_catalogue_source(config: &ServerConfig) -> std::io::Result<Arc<dyn CatalogueSource>> {
    let source = SwapiHttpSource::new(&config.catalogue_url, config.catalogue_timeout)
        .map_err(|err| std::io::Error::other(format!("catalogue client setup failed: {err}")))?;
    Ok(Arc::new(source))
}

/// Build the shared HTTP state over the upstream catalogue API.
///
/// # Errors
/// Returns [`std::io::Error`] when the HTTP client cannot be constructed.
pub(super) fn build_http_state(
    config: &ServerConfig,
    sync_metrics: Arc<dyn SyncMetrics>,
) -> std::io::Result<web::Data<HttpState>> {
    let source = build_catalogue_source(config)?;
    Ok(build_http_state_with_source(config, source, sync_metrics))
}

fn build_http_state_with_source(
    config: &ServerConfig,
    source: Arc<dyn CatalogueSource>,
    sync_metrics: Arc<dyn SyncMetrics>,
) -> web::Data<HttpState> {
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
    let repositories = build_repositories(config);
    let client = CatalogueClient::new(source, clock.clone(), RetryPolicy::default());

    let service = CatalogueService::new(
        CatalogueServicePorts {
            films: repositories.films.clone(),
            characters: repositories.characters.clone(),
            starships: repositories.starships.clone(),
            cache: config.cache.clone(),
        },
        CatalogueValidator::new(client.clone(), config.allow_unofficial),
    );
    let sync_service = CatalogueSyncService::new(
        client,
        CatalogueSyncPorts {
            films: repositories.films,
            characters: repositories.characters,
            starships: repositories.starships,
            cache: config.cache.clone(),
        },
        clock,
    );
    let sync = BackgroundCatalogueSync::new(Arc::new(sync_service)).with_metrics(sync_metrics);

    let service = Arc::new(service);
    web::Data::new(HttpState::new(
        HttpStatePorts {
            query: service.clone(),
            command: service,
            sync: Arc::new(sync),
        },
        config.access.clone(),
    ))
}
