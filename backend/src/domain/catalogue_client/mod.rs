//! Domain-side client for the upstream catalogue.
//!
//! Wraps a [`CatalogueSource`] adapter with the retry policy (jittered
//! exponential backoff over transient failures) and exposes paged traversal
//! through [`CataloguePager`].

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use mockable::Clock;
use tracing::warn;

use crate::domain::ExternalId;
use crate::domain::ports::{
    CatalogueRecord, CatalogueSource, CatalogueSourceError, ExternalCharacter, ExternalFilm,
    ExternalStarship,
};

mod pager;
mod runtime;

pub use pager::CataloguePager;
pub use runtime::{AttemptJitter, BackoffJitter, CatalogueClientRuntime, RetrySleeper, TokioSleeper};

/// Retry policy applied to every catalogue call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum attempts per call, including the first.
    pub max_attempts: u32,
    /// Delay before the second attempt.
    pub initial_backoff: Duration,
    /// Upper bound for any single backoff before jitter.
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(8),
        }
    }
}

impl RetryPolicy {
    /// Un-jittered delay after failed attempt number `attempt` (1-based).
    ///
    /// # Examples
    /// ```
    /// use std::time::Duration;
    /// use starwars_rest::domain::catalogue_client::RetryPolicy;
    ///
    /// let policy = RetryPolicy::default();
    /// assert_eq!(policy.retry_base_delay(1), Duration::from_secs(1));
    /// assert_eq!(policy.retry_base_delay(3), Duration::from_secs(4));
    /// assert_eq!(policy.retry_base_delay(10), Duration::from_secs(8));
    /// ```
    pub fn retry_base_delay(&self, attempt: u32) -> Duration {
        let exponent = 2_u32.saturating_pow(attempt.saturating_sub(1));
        let base_ms = u64::try_from(self.initial_backoff.as_millis()).unwrap_or(u64::MAX);
        let max_ms = u64::try_from(self.max_backoff.as_millis()).unwrap_or(u64::MAX);
        Duration::from_millis(base_ms.saturating_mul(u64::from(exponent)).min(max_ms))
    }
}

/// Catalogue reader with retries.
#[derive(Clone)]
pub struct CatalogueClient {
    source: Arc<dyn CatalogueSource>,
    clock: Arc<dyn Clock>,
    sleeper: Arc<dyn RetrySleeper>,
    jitter: Arc<dyn BackoffJitter>,
    policy: RetryPolicy,
}

impl CatalogueClient {
    /// Build a client using Tokio sleeps and attempt-seeded jitter.
    pub fn new(source: Arc<dyn CatalogueSource>, clock: Arc<dyn Clock>, policy: RetryPolicy) -> Self {
        Self::with_runtime(source, clock, CatalogueClientRuntime::default(), policy)
    }

    /// Build a client with injected sleep and jitter strategies.
    pub fn with_runtime(
        source: Arc<dyn CatalogueSource>,
        clock: Arc<dyn Clock>,
        runtime: CatalogueClientRuntime,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            source,
            clock,
            sleeper: runtime.sleeper,
            jitter: runtime.jitter,
            policy,
        }
    }

    /// Start a traversal of one collection from its first page.
    pub fn pages<R: CatalogueRecord>(&self) -> CataloguePager<'_, R> {
        CataloguePager::new(self, self.source.resource_url(R::RESOURCE))
    }

    /// Drain one collection, stopping early once `limit` records are held.
    ///
    /// # Errors
    ///
    /// Returns the first fatal [`CatalogueSourceError`]; records from pages
    /// read before the failure are discarded.
    pub async fn fetch_all<R: CatalogueRecord>(
        &self,
        limit: Option<usize>,
    ) -> Result<Vec<R>, CatalogueSourceError> {
        let mut pager = self.pages::<R>();
        let mut records = Vec::new();
        while let Some(page) = pager.next_page().await? {
            records.extend(page);
            if let Some(limit) = limit.filter(|limit| records.len() >= *limit) {
                records.truncate(limit);
                break;
            }
        }
        Ok(records)
    }

    /// Fetch one film by catalogue identity.
    pub async fn fetch_film(
        &self,
        id: ExternalId,
    ) -> Result<Option<ExternalFilm>, CatalogueSourceError> {
        self.with_retry(|| self.source.fetch_film(id)).await
    }

    /// Fetch one character by catalogue identity.
    pub async fn fetch_character(
        &self,
        id: ExternalId,
    ) -> Result<Option<ExternalCharacter>, CatalogueSourceError> {
        self.with_retry(|| self.source.fetch_character(id)).await
    }

    /// Fetch one starship by catalogue identity.
    pub async fn fetch_starship(
        &self,
        id: ExternalId,
    ) -> Result<Option<ExternalStarship>, CatalogueSourceError> {
        self.with_retry(|| self.source.fetch_starship(id)).await
    }

    pub(crate) fn source(&self) -> &dyn CatalogueSource {
        self.source.as_ref()
    }

    pub(crate) async fn with_retry<T, F, Fut>(&self, mut call: F) -> Result<T, CatalogueSourceError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, CatalogueSourceError>>,
    {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match call().await {
                Ok(value) => return Ok(value),
                Err(error) if error.is_retryable() && attempt < max_attempts => {
                    let base_delay = self.policy.retry_base_delay(attempt);
                    let delay = self
                        .jitter
                        .jittered_delay(base_delay, attempt, self.clock.utc());
                    warn!(
                        %error,
                        attempt,
                        max_attempts,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        "catalogue call failed; retrying"
                    );
                    self.sleeper.sleep(delay).await;
                    attempt += 1;
                }
                Err(error) => return Err(error),
            }
        }
    }
}

#[cfg(test)]
mod tests;
