//! Single-flight execution of sync runs.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tracing::{info, warn};
use uuid::Uuid;

use super::{CatalogueSyncService, SyncOptions, SyncReport};
use crate::domain::ports::{
    CatalogueSyncCommand, NoOpSyncMetrics, SyncMetrics, SyncStatus, SyncTicket,
};
use crate::domain::{Error, TraceId};

/// Runs sync in the background, at most one run per process.
#[derive(Clone)]
pub struct BackgroundCatalogueSync {
    service: Arc<CatalogueSyncService>,
    running: Arc<AtomicBool>,
    last_report: Arc<Mutex<Option<SyncReport>>>,
    metrics: Arc<dyn SyncMetrics>,
}

/// Clears the running flag when dropped, including on panic.
struct RunGuard(Arc<AtomicBool>);

impl RunGuard {
    fn acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(Arc::clone(flag)))
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl BackgroundCatalogueSync {
    /// Wrap `service` with no run active and metrics discarded.
    pub fn new(service: Arc<CatalogueSyncService>) -> Self {
        Self {
            service,
            running: Arc::new(AtomicBool::new(false)),
            last_report: Arc::new(Mutex::new(None)),
            metrics: Arc::new(NoOpSyncMetrics),
        }
    }

    /// Record every finished run with `metrics`.
    #[must_use]
    pub fn with_metrics(mut self, metrics: Arc<dyn SyncMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Run in the foreground, still honouring the single-flight guard.
    ///
    /// # Errors
    ///
    /// Returns a `Conflict` error while another run is active.
    pub async fn run_now(&self, options: SyncOptions) -> Result<SyncReport, Error> {
        let _guard = self.acquire()?;
        let report = self.service.run(Uuid::new_v4(), options).await;
        finish_run(self.metrics.as_ref(), &self.last_report, report.clone()).await;
        Ok(report)
    }

    fn acquire(&self) -> Result<RunGuard, Error> {
        RunGuard::acquire(&self.running)
            .ok_or_else(|| Error::conflict("a catalogue sync run is already in progress"))
    }
}

impl CatalogueSyncCommand for BackgroundCatalogueSync {
    fn trigger(&self, options: SyncOptions) -> Result<SyncTicket, Error> {
        let guard = self.acquire()?;
        let run_id = Uuid::new_v4();
        let service = Arc::clone(&self.service);
        let last_report = Arc::clone(&self.last_report);
        let metrics = Arc::clone(&self.metrics);

        info!(%run_id, "catalogue sync accepted");
        tokio::spawn(TraceId::propagate(async move {
            let _guard = guard;
            let report = service.run(run_id, options).await;
            finish_run(metrics.as_ref(), &last_report, report).await;
        }));
        Ok(SyncTicket { run_id })
    }

    fn status(&self) -> SyncStatus {
        let last_report = match self.last_report.lock() {
            Ok(report) => report.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        };
        SyncStatus {
            running: self.running.load(Ordering::Acquire),
            last_report,
        }
    }
}

async fn finish_run(
    metrics: &dyn SyncMetrics,
    slot: &Mutex<Option<SyncReport>>,
    report: SyncReport,
) {
    if let Err(error) = metrics.record_run(&report).await {
        warn!(run_id = %report.run_id, %error, "failed to record sync metrics");
    }
    store_report(slot, report);
}

fn store_report(slot: &Mutex<Option<SyncReport>>, report: SyncReport) {
    match slot.lock() {
        Ok(mut last) => *last = Some(report),
        Err(poisoned) => {
            warn!("sync report slot was poisoned; overwriting");
            *poisoned.into_inner() = Some(report);
        }
    }
}
