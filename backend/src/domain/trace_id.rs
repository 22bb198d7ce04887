//! Request-scoped trace identifier.
//!
//! The identifier lives in Tokio task-local storage so errors and log lines
//! can pick it up without threading it through every call. Task-locals are
//! not inherited by spawned tasks; wrap spawned work with
//! [`TraceId::propagate`] to keep correlation across the background sync.

use std::future::Future;

use tokio::task_local;
use uuid::Uuid;

task_local! {
    static TRACE_ID: TraceId;
}

/// Correlation identifier for one request or background run.
///
/// # Examples
/// ```
/// use starwars_rest::TraceId;
///
/// # tokio::runtime::Runtime::new().expect("runtime").block_on(async {
/// let trace_id: TraceId = "00000000-0000-0000-0000-000000000000"
///     .parse()
///     .expect("valid UUID");
/// let observed = TraceId::scope(trace_id, async { TraceId::current() }).await;
/// assert_eq!(observed, Some(trace_id));
/// # });
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TraceId(Uuid);

impl TraceId {
    /// Generate a new random trace identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the trace identifier in scope, if any.
    #[must_use]
    pub fn current() -> Option<Self> {
        TRACE_ID.try_with(|id| *id).ok()
    }

    /// Access the inner UUID.
    #[must_use]
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Run `fut` with `trace_id` in scope.
    pub async fn scope<Fut>(trace_id: TraceId, fut: Fut) -> Fut::Output
    where
        Fut: Future,
    {
        TRACE_ID.scope(trace_id, fut).await
    }

    /// Bind `fut` to the identifier in scope now, or a fresh one.
    ///
    /// The returned future is `'static` when `fut` is, so it can be handed to
    /// `tokio::spawn` while keeping the caller's correlation id.
    pub fn propagate<Fut>(fut: Fut) -> impl Future<Output = Fut::Output>
    where
        Fut: Future,
    {
        let trace_id = Self::current().unwrap_or_else(Self::generate);
        TRACE_ID.scope(trace_id, fut)
    }
}

impl From<Uuid> for TraceId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for TraceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for TraceId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn current_is_none_out_of_scope() {
        assert!(TraceId::current().is_none());
    }

    #[tokio::test]
    async fn current_reflects_scope() {
        let expected = TraceId::generate();
        let observed = TraceId::scope(expected, async move { TraceId::current() }).await;
        assert_eq!(observed, Some(expected));
    }

    #[tokio::test]
    async fn propagate_carries_scope_into_spawned_task() {
        let expected = TraceId::generate();
        let observed = TraceId::scope(expected, async move {
            tokio::spawn(TraceId::propagate(async { TraceId::current() }))
                .await
                .expect("task completes")
        })
        .await;
        assert_eq!(observed, Some(expected));
    }

    #[tokio::test]
    async fn propagate_generates_identifier_when_none_in_scope() {
        let observed = TraceId::propagate(async { TraceId::current() }).await;
        assert!(observed.is_some());
    }

    #[test]
    fn parses_and_displays_uuid() {
        let uuid = Uuid::nil();
        let trace_id: TraceId = uuid.to_string().parse().expect("parse uuid");
        assert_eq!(trace_id.as_uuid(), &uuid);
        assert_eq!(trace_id.to_string(), uuid.to_string());
    }
}
