//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports (use-cases) and remain testable without I/O.

use std::sync::Arc;

use crate::domain::AccessPolicy;
use crate::domain::ports::{CatalogueCommand, CatalogueQuery, CatalogueSyncCommand};

/// Parameter object bundling all port implementations for HTTP handlers.
#[derive(Clone)]
pub struct HttpStatePorts {
    pub query: Arc<dyn CatalogueQuery>,
    pub command: Arc<dyn CatalogueCommand>,
    pub sync: Arc<dyn CatalogueSyncCommand>,
}

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub query: Arc<dyn CatalogueQuery>,
    pub command: Arc<dyn CatalogueCommand>,
    pub sync: Arc<dyn CatalogueSyncCommand>,
    /// Gate applied to every non-safe request.
    pub access: Arc<AccessPolicy>,
}

impl HttpState {
    /// Construct state from a ports bundle and the write access policy.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    ///
    /// use starwars_rest::domain::AccessPolicy;
    /// use starwars_rest::domain::ports::FixtureCatalogueSyncCommand;
    /// use starwars_rest::domain::catalogue_service::{
    ///     CatalogueService, CatalogueServicePorts, CatalogueValidator,
    /// };
    /// use starwars_rest::inbound::http::state::{HttpState, HttpStatePorts};
    /// # use starwars_rest::domain::catalogue_client::{CatalogueClient, RetryPolicy};
    /// # use starwars_rest::domain::ports::{
    /// #     FixtureCatalogueSource, FixtureCharacterRepository, FixtureFilmRepository,
    /// #     FixtureStarshipRepository, NoOpResponseCache,
    /// # };
    /// # let client = CatalogueClient::new(
    /// #     Arc::new(FixtureCatalogueSource),
    /// #     Arc::new(mockable::DefaultClock),
    /// #     RetryPolicy::default(),
    /// # );
    /// # let service = Arc::new(CatalogueService::new(
    /// #     CatalogueServicePorts {
    /// #         films: Arc::new(FixtureFilmRepository),
    /// #         characters: Arc::new(FixtureCharacterRepository),
    /// #         starships: Arc::new(FixtureStarshipRepository),
    /// #         cache: Arc::new(NoOpResponseCache),
    /// #     },
    /// #     CatalogueValidator::new(client, true),
    /// # ));
    ///
    /// let state = HttpState::new(
    ///     HttpStatePorts {
    ///         query: service.clone(),
    ///         command: service,
    ///         sync: Arc::new(FixtureCatalogueSyncCommand),
    ///     },
    ///     AccessPolicy::from_list("jedi"),
    /// );
    /// assert!(state.access.accepts_writes());
    /// ```
    pub fn new(ports: HttpStatePorts, access: AccessPolicy) -> Self {
        Self {
            query: ports.query,
            command: ports.command,
            sync: ports.sync,
            access: Arc::new(access),
        }
    }
}
