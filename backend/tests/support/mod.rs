//! Shared application builder for HTTP-level tests.
//!
//! Wires the real catalogue service and sync engine over the in-memory
//! store, the in-memory response cache and a scripted catalogue source.

use std::sync::Arc;
use std::time::Duration;

use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, web};
use mockable::{Clock, DefaultClock};
use starwars_rest::Trace;
use starwars_rest::domain::AccessPolicy;
use starwars_rest::domain::catalogue_client::{CatalogueClient, RetryPolicy};
use starwars_rest::domain::catalogue_service::{
    CatalogueService, CatalogueServicePorts, CatalogueValidator,
};
use starwars_rest::domain::catalogue_sync::{
    BackgroundCatalogueSync, CatalogueSyncPorts, CatalogueSyncService,
};
use starwars_rest::domain::ports::ResponseCache;
use starwars_rest::inbound::http::configure_api;
use starwars_rest::inbound::http::state::{HttpState, HttpStatePorts};
use starwars_rest::middleware::ResponseCacheLayer;
use starwars_rest::outbound::cache::InMemoryResponseCache;
use starwars_rest::outbound::memory::InMemoryCatalogueStore;
use starwars_rest::test_support::catalogue_source::ScriptedCatalogueSource;

/// Token accepted for writes.
pub const TOKEN: &str = "jedi-council";

/// Authorization header value carrying [`TOKEN`].
pub fn bearer() -> (&'static str, String) {
    ("authorization", format!("Bearer {TOKEN}"))
}

/// Handles kept by a test after the app is built.
pub struct Harness {
    pub state: web::Data<HttpState>,
    pub cache: Arc<InMemoryResponseCache>,
}

impl Harness {
    /// Build the harness over `source`, accepting local records.
    pub fn new(source: ScriptedCatalogueSource) -> Self {
        Self::with_unofficial(source, true)
    }

    pub fn with_unofficial(source: ScriptedCatalogueSource, allow_unofficial: bool) -> Self {
        let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
        let store = Arc::new(InMemoryCatalogueStore::default());
        let cache = Arc::new(InMemoryResponseCache::default());
        let client = CatalogueClient::new(Arc::new(source), clock.clone(), RetryPolicy::default());

        let service = Arc::new(CatalogueService::new(
            CatalogueServicePorts {
                films: store.clone(),
                characters: store.clone(),
                starships: store.clone(),
                cache: cache.clone(),
            },
            CatalogueValidator::new(client.clone(), allow_unofficial),
        ));
        let sync = BackgroundCatalogueSync::new(Arc::new(CatalogueSyncService::new(
            client,
            CatalogueSyncPorts {
                films: store.clone(),
                characters: store.clone(),
                starships: store,
                cache: cache.clone(),
            },
            clock,
        )));

        let state = web::Data::new(HttpState::new(
            HttpStatePorts {
                query: service.clone(),
                command: service,
                sync: Arc::new(sync),
            },
            AccessPolicy::from_list(TOKEN),
        ));
        Self { state, cache }
    }

    /// Application mounting the API under `/api/v1` behind the response cache.
    pub fn app(
        &self,
    ) -> App<
        impl ServiceFactory<
            ServiceRequest,
            Config = (),
            Response = ServiceResponse,
            Error = actix_web::Error,
            InitError = (),
        > + use<>,
    > {
        let cache: Arc<dyn ResponseCache> = self.cache.clone();
        App::new()
            .app_data(self.state.clone())
            .wrap(Trace)
            .service(
                web::scope("/api/v1")
                    .wrap(ResponseCacheLayer::new(cache, Duration::from_secs(300)))
                    .configure(configure_api),
            )
    }
}
