//! HTTP server configuration object and helpers.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use reqwest::Url;
use starwars_rest::domain::AccessPolicy;
use starwars_rest::domain::ports::ResponseCache;
use starwars_rest::outbound::cache::InMemoryResponseCache;
use starwars_rest::outbound::persistence::DbPool;

#[cfg(feature = "metrics")]
use actix_web_prom::PrometheusMetrics;

/// Builder-style configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) bind_addr: SocketAddr,
    pub(crate) catalogue_url: Url,
    pub(crate) catalogue_timeout: Duration,
    pub(crate) allow_unofficial: bool,
    pub(crate) access: AccessPolicy,
    pub(crate) db_pool: Option<DbPool>,
    pub(crate) cache: Arc<dyn ResponseCache>,
    pub(crate) cache_ttl: Duration,
    #[cfg(feature = "metrics")]
    pub(crate) prometheus: Option<PrometheusMetrics>,
}

impl ServerConfig {
    /// Construct a configuration with an in-memory store and cache.
    #[must_use]
    pub fn new(bind_addr: SocketAddr, catalogue_url: Url, access: AccessPolicy) -> Self {
        Self {
            bind_addr,
            catalogue_url,
            catalogue_timeout: Duration::from_secs(10),
            allow_unofficial: true,
            access,
            db_pool: None,
            cache: Arc::new(InMemoryResponseCache::default()),
            cache_ttl: Duration::from_secs(300),
            #[cfg(feature = "metrics")]
            prometheus: None,
        }
    }

    /// Attach a database connection pool.
    ///
    /// When provided, films, characters and starships are stored in
    /// PostgreSQL instead of process memory.
    #[must_use]
    pub fn with_db_pool(mut self, pool: DbPool) -> Self {
        self.db_pool = Some(pool);
        self
    }

    /// Replace the response cache and the lifetime of its entries.
    #[must_use]
    pub fn with_cache(mut self, cache: Arc<dyn ResponseCache>, ttl: Duration) -> Self {
        self.cache = cache;
        self.cache_ttl = ttl;
        self
    }

    #[must_use]
    pub fn with_catalogue_timeout(mut self, timeout: Duration) -> Self {
        self.catalogue_timeout = timeout;
        self
    }

    /// Whether records created through the API may lack a catalogue identity.
    #[must_use]
    pub fn with_unofficial_records(mut self, allow: bool) -> Self {
        self.allow_unofficial = allow;
        self
    }

    #[cfg(feature = "metrics")]
    /// Attach Prometheus middleware to the configuration.
    #[must_use]
    pub fn with_metrics(mut self, prometheus: Option<PrometheusMetrics>) -> Self {
        self.prometheus = prometheus;
        self
    }
}
