//! Prometheus adapter for catalogue sync metrics.
//!
//! # Metric Specification
//!
//! - `starwars_sync_runs_total{result}`: finished runs, `result` is
//!   `completed` or `failed`.
//! - `starwars_sync_records_total{stage, outcome}`: records per stage, with
//!   `outcome` one of `created`, `skipped` or `invalid`.

use async_trait::async_trait;
use prometheus::{IntCounterVec, Opts, Registry};

use crate::domain::catalogue_sync::SyncReport;
use crate::domain::ports::{SyncMetrics, SyncMetricsError};

/// Prometheus-backed sync metrics recorder.
pub struct PrometheusSyncMetrics {
    runs_total: IntCounterVec,
    records_total: IntCounterVec,
}

impl PrometheusSyncMetrics {
    /// Create and register the counters with `registry`.
    ///
    /// # Errors
    ///
    /// Returns an error when a metric with the same name is already
    /// registered.
    pub fn new(registry: &Registry) -> Result<Self, prometheus::Error> {
        let runs_total = IntCounterVec::new(
            Opts::new("starwars_sync_runs_total", "Finished catalogue sync runs"),
            &["result"],
        )?;
        let records_total = IntCounterVec::new(
            Opts::new(
                "starwars_sync_records_total",
                "Catalogue records handled by sync stages",
            ),
            &["stage", "outcome"],
        )?;
        registry.register(Box::new(runs_total.clone()))?;
        registry.register(Box::new(records_total.clone()))?;
        Ok(Self {
            runs_total,
            records_total,
        })
    }

    fn add_records(&self, stage: &str, outcome: &str, count: usize) {
        let count = u64::try_from(count).unwrap_or(u64::MAX);
        self.records_total
            .with_label_values(&[stage, outcome])
            .inc_by(count);
    }
}

#[async_trait]
impl SyncMetrics for PrometheusSyncMetrics {
    async fn record_run(&self, report: &SyncReport) -> Result<(), SyncMetricsError> {
        let result = if report.succeeded() {
            "completed"
        } else {
            "failed"
        };
        self.runs_total.with_label_values(&[result]).inc();
        for stage in &report.stages {
            let label = stage.stage.as_str();
            self.add_records(label, "created", stage.created);
            self.add_records(label, "skipped", stage.skipped);
            self.add_records(label, "invalid", stage.invalid);
        }
        Ok(())
    }
}
