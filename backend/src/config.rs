//! Application settings loaded via OrthoConfig.
//!
//! Values come from CLI flags, `STARWARS_*` environment variables and an
//! optional configuration file, in that order of precedence.

use std::net::SocketAddr;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;

use crate::domain::AccessPolicy;
pub use crate::outbound::swapi::DEFAULT_CATALOGUE_URL;

/// Listener used when no bind address is configured.
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

/// Settings shared by the HTTP server and the sync job.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "STARWARS")]
pub struct AppSettings {
    /// Socket address the HTTP server binds to.
    pub bind_addr: Option<String>,
    /// PostgreSQL URL; without one the process keeps records in memory.
    pub database_url: Option<String>,
    /// Redis URL for the shared response cache.
    pub redis_url: Option<String>,
    /// Root of the upstream catalogue API.
    pub catalogue_url: Option<String>,
    /// Per-request timeout for catalogue calls.
    #[ortho_config(default = 10)]
    pub catalogue_timeout_secs: u64,
    /// Lifetime of cached catalogue responses.
    #[ortho_config(default = 300)]
    pub cache_ttl_secs: u64,
    /// Accept directly created records that carry no catalogue identity.
    #[ortho_config(default = true)]
    pub allow_unofficial_records: bool,
    /// Comma separated bearer tokens accepted for writes.
    pub api_tokens: Option<String>,
}

impl AppSettings {
    /// Parse the bind address, falling back to [`DEFAULT_BIND_ADDR`].
    ///
    /// # Errors
    ///
    /// Returns an `InvalidInput` error when the configured value is not a
    /// socket address.
    pub fn bind_addr(&self) -> std::io::Result<SocketAddr> {
        let raw = self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
        raw.parse().map_err(|err| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("invalid bind address `{raw}`: {err}"),
            )
        })
    }

    /// Configured database URL, falling back to the conventional `DATABASE_URL`.
    pub fn database_url(&self) -> Option<String> {
        self.database_url
            .clone()
            .or_else(|| std::env::var("DATABASE_URL").ok())
            .filter(|url| !url.trim().is_empty())
    }

    pub fn redis_url(&self) -> Option<&str> {
        self.redis_url.as_deref().filter(|url| !url.trim().is_empty())
    }

    /// Catalogue API root without a trailing slash.
    pub fn catalogue_url(&self) -> &str {
        self.catalogue_url
            .as_deref()
            .unwrap_or(DEFAULT_CATALOGUE_URL)
            .trim_end_matches('/')
    }

    pub fn catalogue_timeout(&self) -> Duration {
        Duration::from_secs(self.catalogue_timeout_secs)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// Write access policy built from the configured tokens.
    pub fn access_policy(&self) -> AccessPolicy {
        AccessPolicy::from_list(self.api_tokens.as_deref().unwrap_or_default())
    }
}
