//! Domain port for recording catalogue sync outcomes.
//!
//! Keeps the sync runner independent of any metrics backend. The Prometheus
//! adapter lives behind the `metrics` feature; everything else uses the
//! no-op implementation.

use async_trait::async_trait;

use super::define_port_error;
use crate::domain::catalogue_sync::SyncReport;

define_port_error! {
    /// Errors exposed when recording sync metrics.
    pub enum SyncMetricsError {
        /// Metric exporter rejected the write.
        Export { message: String } => "sync metrics exporter failed: {message}",
    }
}

/// Metrics recording port for finished sync runs.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SyncMetrics: Send + Sync {
    /// Record the stage counts and final state of one run.
    async fn record_run(&self, report: &SyncReport) -> Result<(), SyncMetricsError>;
}

/// No-op implementation for when metrics are disabled or in tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpSyncMetrics;

#[async_trait]
impl SyncMetrics for NoOpSyncMetrics {
    async fn record_run(&self, _report: &SyncReport) -> Result<(), SyncMetricsError> {
        Ok(())
    }
}
