//! Populate the store from the public Star Wars catalogue in the foreground.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

use std::ffi::OsString;
use std::io;
use std::sync::Arc;

use clap::Parser;
use mockable::{Clock, DefaultClock};
use ortho_config::OrthoConfig;
use reqwest::Url;
use tokio::runtime::Builder;
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt};

use starwars_rest::config::AppSettings;
use starwars_rest::domain::catalogue_client::{CatalogueClient, RetryPolicy};
use starwars_rest::domain::catalogue_sync::{
    BackgroundCatalogueSync, CatalogueSyncPorts, CatalogueSyncService, StageReport, SyncOptions,
    SyncReport, SyncState,
};
use starwars_rest::domain::ports::{NoOpResponseCache, ResponseCache};
use starwars_rest::outbound::cache::RedisResponseCache;
use starwars_rest::outbound::persistence::{
    DbPool, DieselCharacterRepository, DieselFilmRepository, DieselStarshipRepository, PoolConfig,
    run_migrations,
};
use starwars_rest::outbound::swapi::SwapiHttpSource;

/// `sync-catalogue` command arguments.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "sync-catalogue",
    about = "Copy films, characters and starships from the Star Wars catalogue into storage",
    version
)]
struct CliArgs {
    /// Stop reading each collection after this many records.
    #[arg(long, value_name = "n", value_parser = clap::value_parser!(u64).range(1..))]
    limit: Option<u64>,
    /// Database connection URL. Falls back to `DATABASE_URL` when omitted.
    #[arg(long = "database-url", value_name = "url")]
    database_url: Option<String>,
    /// Catalogue API root. Falls back to the configured catalogue URL.
    #[arg(long = "catalogue-url", value_name = "url")]
    catalogue_url: Option<Url>,
}

fn main() -> io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|error| io::Error::other(format!("create Tokio runtime: {error}")))?;
    runtime.block_on(async_main())
}

async fn async_main() -> io::Result<()> {
    let args = CliArgs::try_parse().map_err(io::Error::other)?;
    let settings = AppSettings::load_from_iter([OsString::from("sync-catalogue")])
        .map_err(|error| io::Error::other(format!("load settings: {error}")))?;

    let database_url = resolve_database_url(args.database_url, settings.database_url())?;
    let catalogue_url = match args.catalogue_url {
        Some(url) => url,
        None => Url::parse(settings.catalogue_url())
            .map_err(|error| io::Error::other(format!("invalid catalogue url: {error}")))?,
    };

    let migration_url = database_url.clone();
    tokio::task::spawn_blocking(move || run_migrations(&migration_url))
        .await
        .map_err(|error| io::Error::other(format!("migration task failed: {error}")))?
        .map_err(|error| io::Error::other(format!("run migrations: {error}")))?;
    let pool = DbPool::new(PoolConfig::new(database_url))
        .await
        .map_err(|error| io::Error::other(format!("create database pool: {error}")))?;

    let source = SwapiHttpSource::new(&catalogue_url, settings.catalogue_timeout())
        .map_err(|error| io::Error::other(format!("create catalogue client: {error}")))?;
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
    let client = CatalogueClient::new(Arc::new(source), clock.clone(), RetryPolicy::default());
    let service = CatalogueSyncService::new(
        client,
        CatalogueSyncPorts {
            films: Arc::new(DieselFilmRepository::new(pool.clone())),
            characters: Arc::new(DieselCharacterRepository::new(pool.clone())),
            starships: Arc::new(DieselStarshipRepository::new(pool)),
            cache: shared_cache(settings.redis_url()).await,
        },
        clock,
    );

    let options = SyncOptions {
        limit: args
            .limit
            .map(|limit| usize::try_from(limit).unwrap_or(usize::MAX)),
    };
    let report = BackgroundCatalogueSync::new(Arc::new(service))
        .run_now(options)
        .await
        .map_err(|error| io::Error::other(format!("sync failed: {error}")))?;

    for stage in &report.stages {
        println!("{}", stage_line(stage));
    }
    outcome(&report)
}

/// The server's Redis cache, when configured, so a foreground run still
/// invalidates what running servers have cached.
async fn shared_cache(redis_url: Option<&str>) -> Arc<dyn ResponseCache> {
    let Some(url) = redis_url else {
        return Arc::new(NoOpResponseCache);
    };
    match RedisResponseCache::connect(url).await {
        Ok(cache) => Arc::new(cache),
        Err(error) => {
            warn!(%error, "redis unavailable; cached responses will age out");
            Arc::new(NoOpResponseCache)
        }
    }
}

fn stage_line(stage: &StageReport) -> String {
    format!(
        "stage={} created={} skipped={} invalid={} status={}",
        stage.stage, stage.created, stage.skipped, stage.invalid, stage.status
    )
}

fn outcome(report: &SyncReport) -> io::Result<()> {
    match &report.state {
        SyncState::Failed { stage, error } => Err(io::Error::other(format!(
            "stage={stage} failed: {error}"
        ))),
        _ => Ok(()),
    }
}

fn resolve_database_url(explicit: Option<String>, configured: Option<String>) -> io::Result<String> {
    if let Some(value) = explicit {
        if value.trim().is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "--database-url must not be empty when provided",
            ));
        }
        return Ok(value);
    }
    configured.ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            "database URL missing: set --database-url or DATABASE_URL",
        )
    })
}

#[cfg(test)]
mod tests {
    //! Unit tests for argument handling and report output.

    use chrono::Utc;
    use clap::Parser;
    use rstest::rstest;
    use starwars_rest::domain::catalogue_sync::SyncStage;
    use uuid::Uuid;

    use super::*;

    fn report(state: SyncState) -> SyncReport {
        SyncReport {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            finished_at: Utc::now(),
            state,
            stages: Vec::new(),
        }
    }

    #[rstest]
    fn explicit_database_url_wins() {
        let url = resolve_database_url(
            Some("postgres://cli/starwars".to_owned()),
            Some("postgres://env/starwars".to_owned()),
        )
        .expect("url resolves");
        assert_eq!(url, "postgres://cli/starwars");
    }

    #[rstest]
    #[case::blank(Some("  ".to_owned()), None)]
    #[case::missing(None, None)]
    fn unusable_database_url_is_rejected(
        #[case] explicit: Option<String>,
        #[case] configured: Option<String>,
    ) {
        let error = resolve_database_url(explicit, configured).expect_err("should fail");
        assert_eq!(error.kind(), io::ErrorKind::InvalidInput);
    }

    #[rstest]
    fn stage_line_lists_counts() {
        let stage = StageReport {
            stage: SyncStage::Characters,
            fetched: 12,
            created: 10,
            skipped: 1,
            invalid: 1,
            linked: 20,
            status: "ok with 1 invalid records".to_owned(),
        };

        assert_eq!(
            stage_line(&stage),
            "stage=characters created=10 skipped=1 invalid=1 status=ok with 1 invalid records"
        );
    }

    #[rstest]
    fn failed_run_names_the_stage() {
        let failed = report(SyncState::Failed {
            stage: SyncStage::Starships,
            error: "catalogue fetch failed: timeout".to_owned(),
        });

        let error = outcome(&failed).expect_err("failure is reported");
        assert!(error.to_string().contains("stage=starships"));
        assert!(outcome(&report(SyncState::Done)).is_ok());
    }

    #[rstest]
    fn zero_limit_is_rejected() {
        assert!(CliArgs::try_parse_from(["sync-catalogue", "--limit", "0"]).is_err());
        let args = CliArgs::try_parse_from([
            "sync-catalogue",
            "--limit",
            "3",
            "--catalogue-url",
            "http://swapi.local/api",
        ])
        .expect("args parse");
        assert_eq!(args.limit, Some(3));
    }
}
