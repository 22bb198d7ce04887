//! Driving port for starting catalogue synchronisation runs.
//!
//! Inbound adapters call this port to start a run in the background and to
//! read the outcome of the most recent one.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::Error;
use crate::domain::catalogue_sync::{SyncOptions, SyncReport};

/// Acknowledgement of an accepted run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SyncTicket {
    /// Identifier the finished report will carry.
    pub run_id: Uuid,
}

/// Whether a run is active and how the last one ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatus {
    pub running: bool,
    pub last_report: Option<SyncReport>,
}

/// Driving port for catalogue synchronisation.
#[cfg_attr(test, mockall::automock)]
pub trait CatalogueSyncCommand: Send + Sync {
    /// Start a run in the background.
    ///
    /// # Errors
    ///
    /// Returns a `Conflict` error while another run is active.
    fn trigger(&self, options: SyncOptions) -> Result<SyncTicket, Error>;

    /// Report whether a run is active and the last finished report.
    fn status(&self) -> SyncStatus;
}

/// Fixture implementation that accepts every trigger and never runs.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureCatalogueSyncCommand;

impl CatalogueSyncCommand for FixtureCatalogueSyncCommand {
    fn trigger(&self, _options: SyncOptions) -> Result<SyncTicket, Error> {
        Ok(SyncTicket {
            run_id: Uuid::new_v4(),
        })
    }

    fn status(&self) -> SyncStatus {
        SyncStatus {
            running: false,
            last_report: None,
        }
    }
}
