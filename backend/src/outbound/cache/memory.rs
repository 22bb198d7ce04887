//! Process-local response cache.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use mockable::{Clock, DefaultClock};

use crate::domain::ports::{CachedResponse, ResponseCache, ResponseCacheError, ResponseCacheKey};

struct Entry {
    response: CachedResponse,
    expires_at: DateTime<Utc>,
}

/// Map-backed cache honouring per-entry TTLs.
pub struct InMemoryResponseCache {
    entries: Mutex<HashMap<ResponseCacheKey, Entry>>,
    clock: Arc<dyn Clock>,
}

impl Default for InMemoryResponseCache {
    fn default() -> Self {
        Self::new(Arc::new(DefaultClock))
    }
}

impl InMemoryResponseCache {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            clock,
        }
    }

    /// Number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.lock().map_or(0, |entries| entries.len())
    }

    /// Return `true` when nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<ResponseCacheKey, Entry>>, ResponseCacheError> {
        self.entries
            .lock()
            .map_err(|_| ResponseCacheError::backend("in-memory cache lock poisoned"))
    }
}

#[async_trait]
impl ResponseCache for InMemoryResponseCache {
    async fn get(
        &self,
        key: &ResponseCacheKey,
    ) -> Result<Option<CachedResponse>, ResponseCacheError> {
        let now = self.clock.utc();
        let mut entries = self.lock()?;
        match entries.get(key) {
            Some(entry) if entry.expires_at > now => Ok(Some(entry.response.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn put(
        &self,
        key: &ResponseCacheKey,
        response: &CachedResponse,
        ttl: Duration,
    ) -> Result<(), ResponseCacheError> {
        let ttl = TimeDelta::from_std(ttl)
            .map_err(|error| ResponseCacheError::backend(format!("invalid ttl: {error}")))?;
        let expires_at = self.clock.utc() + ttl;
        self.lock()?.insert(
            key.clone(),
            Entry {
                response: response.clone(),
                expires_at,
            },
        );
        Ok(())
    }

    async fn invalidate_all(&self) -> Result<(), ResponseCacheError> {
        self.lock()?.clear();
        Ok(())
    }
}
