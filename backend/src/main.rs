//! Backend entry-point: loads settings, wires the catalogue store, response
//! cache and catalogue client, then serves the REST API.

mod server;

use std::sync::Arc;

use actix_web::web;
#[cfg(feature = "metrics")]
use actix_web_prom::PrometheusMetricsBuilder;
use ortho_config::OrthoConfig;
use reqwest::Url;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use starwars_rest::config::AppSettings;
use starwars_rest::domain::ports::ResponseCache;
use starwars_rest::inbound::http::health::HealthState;
use starwars_rest::outbound::cache::{InMemoryResponseCache, RedisResponseCache};
use starwars_rest::outbound::persistence::{DbPool, PoolConfig, run_migrations};

use server::{ServerConfig, create_server};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = AppSettings::load_from_iter(std::env::args_os())
        .map_err(|e| std::io::Error::other(format!("failed to load settings: {e}")))?;
    let config = build_server_config(&settings).await?;

    let health_state = web::Data::new(HealthState::new());
    let server = create_server(health_state, config)?;
    info!(bind_addr = %settings.bind_addr()?, "server started");
    server.await
}

async fn build_server_config(settings: &AppSettings) -> std::io::Result<ServerConfig> {
    let catalogue_url = Url::parse(settings.catalogue_url()).map_err(|e| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("invalid catalogue url `{}`: {e}", settings.catalogue_url()),
        )
    })?;

    let config = ServerConfig::new(
        settings.bind_addr()?,
        catalogue_url,
        settings.access_policy(),
    )
    .with_catalogue_timeout(settings.catalogue_timeout())
    .with_unofficial_records(settings.allow_unofficial_records)
    .with_cache(build_cache(settings).await, settings.cache_ttl());

    let config = match settings.database_url() {
        Some(url) => config.with_db_pool(connect_database(url).await?),
        None => {
            warn!("no database url configured; records are kept in memory");
            config
        }
    };

    #[cfg(feature = "metrics")]
    let config = config.with_metrics(Some(make_metrics()?));

    Ok(config)
}

/// Apply pending migrations, then open the connection pool.
async fn connect_database(url: String) -> std::io::Result<DbPool> {
    let migration_url = url.clone();
    let applied = tokio::task::spawn_blocking(move || run_migrations(&migration_url))
        .await
        .map_err(|e| std::io::Error::other(format!("migration task failed: {e}")))?
        .map_err(|e| std::io::Error::other(format!("failed to run migrations: {e}")))?;
    info!(applied, "database migrations complete");

    DbPool::new(PoolConfig::new(url))
        .await
        .map_err(|e| std::io::Error::other(format!("failed to create database pool: {e}")))
}

/// Connect to Redis when configured; an unreachable Redis degrades to a
/// process-local cache rather than refusing to start.
async fn build_cache(settings: &AppSettings) -> Arc<dyn ResponseCache> {
    let Some(url) = settings.redis_url() else {
        return Arc::new(InMemoryResponseCache::default());
    };
    match RedisResponseCache::connect(url).await {
        Ok(cache) => {
            info!("using redis response cache");
            Arc::new(cache)
        }
        Err(error) => {
            warn!(%error, "redis unavailable; using in-memory response cache");
            Arc::new(InMemoryResponseCache::default())
        }
    }
}

#[cfg(feature = "metrics")]
fn make_metrics() -> std::io::Result<actix_web_prom::PrometheusMetrics> {
    PrometheusMetricsBuilder::new("starwars")
        .endpoint("/metrics")
        .build()
        .map_err(|e| std::io::Error::other(format!("configure Prometheus metrics: {e}")))
}
