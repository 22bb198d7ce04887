//! Sleep and jitter strategies used between retry attempts.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Async sleeping abstraction for retries.
#[async_trait]
pub trait RetrySleeper: Send + Sync {
    /// Suspend execution for `duration`.
    async fn sleep(&self, duration: Duration);
}

/// Retry backoff jitter abstraction.
pub trait BackoffJitter: Send + Sync {
    /// Return a jittered delay from the exponential base delay.
    ///
    /// ```rust
    /// use starwars_rest::domain::catalogue_client::BackoffJitter;
    /// use chrono::{TimeZone, Utc};
    /// use std::time::Duration;
    /// struct FixedJitter;
    /// impl BackoffJitter for FixedJitter {
    ///     fn jittered_delay(&self, base: Duration, attempt: u32, _now: chrono::DateTime<Utc>) -> Duration {
    ///         base + Duration::from_millis(u64::from(attempt) * 10)
    ///     }
    /// }
    /// let now = Utc.with_ymd_and_hms(2026, 5, 4, 12, 0, 0).single().expect("valid time");
    /// assert_eq!(
    ///     FixedJitter.jittered_delay(Duration::from_secs(1), 2, now),
    ///     Duration::from_millis(1020),
    /// );
    /// ```
    fn jittered_delay(&self, base: Duration, attempt: u32, now: DateTime<Utc>) -> Duration;
}

/// Runtime helpers used by the retry loop.
pub struct CatalogueClientRuntime {
    /// Async sleep implementation.
    pub sleeper: Arc<dyn RetrySleeper>,
    /// Jitter strategy for retry delays.
    pub jitter: Arc<dyn BackoffJitter>,
}

impl Default for CatalogueClientRuntime {
    fn default() -> Self {
        Self {
            sleeper: Arc::new(TokioSleeper),
            jitter: Arc::new(AttemptJitter),
        }
    }
}

/// Tokio-based sleeper implementation.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl RetrySleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Adds up to a quarter of the base delay, seeded from the clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct AttemptJitter;

impl BackoffJitter for AttemptJitter {
    fn jittered_delay(&self, base: Duration, attempt: u32, now: DateTime<Utc>) -> Duration {
        let base_ms = u64::try_from(base.as_millis()).unwrap_or(u64::MAX);
        let max_extra = (base_ms / 4).max(1);
        let seed = u64::from(now.timestamp_subsec_nanos()) ^ u64::from(attempt);
        let extra = seed % (max_extra.saturating_add(1));
        Duration::from_millis(base_ms.saturating_add(extra))
    }
}
