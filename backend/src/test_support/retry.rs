//! Clock, sleep and jitter doubles for retry and sync tests.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Local, TimeDelta, TimeZone, Utc};
use mockable::Clock;

use crate::domain::catalogue_client::{BackoffJitter, CatalogueClientRuntime, RetrySleeper};

/// Clock that only moves when told to.
pub struct MutableClock(Mutex<DateTime<Utc>>);

impl MutableClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    /// Clock pinned to 2026-05-04T12:00:00Z.
    pub fn fixed() -> Self {
        match Utc.with_ymd_and_hms(2026, 5, 4, 12, 0, 0).single() {
            Some(now) => Self::new(now),
            None => panic!("fixture timestamp is valid"),
        }
    }

    pub fn advance_seconds(&self, seconds: i64) {
        *self.lock_clock() += TimeDelta::seconds(seconds);
    }

    fn lock_clock(&self) -> std::sync::MutexGuard<'_, DateTime<Utc>> {
        match self.0.lock() {
            Ok(guard) => guard,
            Err(_) => panic!("clock mutex"),
        }
    }
}

impl Clock for MutableClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.lock_clock()
    }
}

/// Sleeper that returns at once and remembers each requested delay.
#[derive(Default)]
pub struct RecordingSleeper(Mutex<Vec<Duration>>);

impl RecordingSleeper {
    /// Delays requested so far.
    pub fn delays(&self) -> Vec<Duration> {
        match self.0.lock() {
            Ok(entries) => entries.clone(),
            Err(_) => panic!("sleeper mutex"),
        }
    }
}

#[async_trait]
impl RetrySleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        let mut entries = match self.0.lock() {
            Ok(entries) => entries,
            Err(_) => panic!("sleeper mutex"),
        };
        entries.push(duration);
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoJitter;

impl BackoffJitter for NoJitter {
    fn jittered_delay(&self, base: Duration, _attempt: u32, _now: DateTime<Utc>) -> Duration {
        base
    }
}

/// Runtime that never sleeps and never jitters, plus a handle on its delays.
pub fn recording_runtime() -> (CatalogueClientRuntime, Arc<RecordingSleeper>) {
    let sleeper = Arc::new(RecordingSleeper::default());
    let runtime = CatalogueClientRuntime {
        sleeper: Arc::clone(&sleeper) as Arc<dyn RetrySleeper>,
        jitter: Arc::new(NoJitter),
    };
    (runtime, sleeper)
}
