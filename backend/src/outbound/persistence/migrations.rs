//! Embedded schema migrations applied at startup.

use diesel::{Connection, PgConnection};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tracing::info;

use super::pool::PoolError;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Apply every pending migration to the database at `database_url`.
///
/// Diesel's migration harness is synchronous, so callers on an async runtime
/// should run this through `tokio::task::spawn_blocking`.
///
/// # Errors
///
/// Returns [`PoolError::Build`] when the connection cannot be opened or a
/// migration fails.
pub fn run_migrations(database_url: &str) -> Result<usize, PoolError> {
    let mut conn = PgConnection::establish(database_url)
        .map_err(|err| PoolError::build(format!("migration connection: {err}")))?;
    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|err| PoolError::build(format!("migration: {err}")))?;
    for version in &applied {
        info!(%version, "applied migration");
    }
    Ok(applied.len())
}
