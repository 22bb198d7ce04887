//! Embedded PostgreSQL provisioning for repository integration tests.
//!
//! Every test gets its own temporary database on one shared cluster, with
//! the crate's migrations applied. Setting `SKIP_TEST_CLUSTER` turns a
//! cluster that cannot start into a skipped suite instead of a failure.

use std::time::Duration;

use pg_embedded_setup_unpriv::TemporaryDatabase;
use pg_embedded_setup_unpriv::test_support::shared_cluster_handle;
use starwars_rest::outbound::persistence::run_migrations;

const CLUSTER_RETRIES: u32 = 3;
const CLUSTER_RETRY_DELAY: Duration = Duration::from_millis(500);

/// Returns true when `SKIP_TEST_CLUSTER` is "1", "true" or "yes".
pub fn should_skip_test_cluster() -> bool {
    std::env::var("SKIP_TEST_CLUSTER")
        .map(|value| matches!(value.to_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

/// Skip with a marker when allowed, otherwise fail loudly.
pub fn handle_cluster_setup_failure<T>(reason: impl std::fmt::Display) -> Option<T> {
    if should_skip_test_cluster() {
        eprintln!("SKIP-TEST-CLUSTER: {reason}");
        None
    } else {
        panic!("Test cluster setup failed: {reason}. Set SKIP_TEST_CLUSTER=1 to skip.");
    }
}

/// Provision a fresh database with every migration applied.
///
/// Must be called outside a Tokio runtime; the cluster bootstrap and the
/// migration harness both block.
pub fn migrated_database() -> Result<TemporaryDatabase, String> {
    let mut attempt = 1;
    let cluster = loop {
        match shared_cluster_handle() {
            Ok(cluster) => break cluster,
            Err(error) if attempt < CLUSTER_RETRIES => {
                eprintln!("pg-embed: cluster attempt {attempt} failed: {error:?}");
                std::thread::sleep(CLUSTER_RETRY_DELAY);
                attempt += 1;
            }
            Err(error) => return Err(format!("{error:?}")),
        }
    };
    let database = cluster
        .create_temporary_database()
        .map_err(|error| format!("create database: {error:?}"))?;
    run_migrations(database.url()).map_err(|error| error.to_string())?;
    Ok(database)
}
