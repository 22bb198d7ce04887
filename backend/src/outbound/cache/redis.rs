//! Redis-backed response cache.
//!
//! Keys are namespaced as `<prefix>:<generation>:<sha256>`. Invalidation
//! bumps the generation counter; stale entries age out through their TTL.

use std::time::Duration;

use async_trait::async_trait;
use bb8_redis::RedisConnectionManager;
use bb8_redis::bb8::Pool;
use bb8_redis::redis::AsyncCommands;
use tracing::debug;

use crate::domain::ports::{CachedResponse, ResponseCache, ResponseCacheError, ResponseCacheKey};

const DEFAULT_PREFIX: &str = "starwars:response";

/// Response cache stored in Redis.
#[derive(Clone)]
pub struct RedisResponseCache {
    pool: Pool<RedisConnectionManager>,
    prefix: String,
}

impl RedisResponseCache {
    /// Connect a pool to `url`.
    ///
    /// # Errors
    ///
    /// Returns [`ResponseCacheError::Backend`] when the URL is invalid or the
    /// pool cannot be built.
    pub async fn connect(url: &str) -> Result<Self, ResponseCacheError> {
        let manager = RedisConnectionManager::new(url).map_err(backend)?;
        let pool = Pool::builder().build(manager).await.map_err(backend)?;
        Ok(Self {
            pool,
            prefix: DEFAULT_PREFIX.to_owned(),
        })
    }

    fn generation_key(&self) -> String {
        format!("{}:generation", self.prefix)
    }

    fn entry_key(&self, generation: u64, key: &ResponseCacheKey) -> String {
        format!("{}:{generation}:{key}", self.prefix)
    }
}

fn backend(error: impl std::fmt::Display) -> ResponseCacheError {
    ResponseCacheError::backend(error.to_string())
}

#[async_trait]
impl ResponseCache for RedisResponseCache {
    async fn get(
        &self,
        key: &ResponseCacheKey,
    ) -> Result<Option<CachedResponse>, ResponseCacheError> {
        let mut pooled = self.pool.get().await.map_err(backend)?;
        let conn = &mut *pooled;
        let generation: Option<u64> = conn.get(self.generation_key()).await.map_err(backend)?;
        let entry_key = self.entry_key(generation.unwrap_or_default(), key);
        let raw: Option<String> = conn.get(&entry_key).await.map_err(backend)?;
        let Some(raw) = raw else {
            debug!(key = %entry_key, "response cache miss");
            return Ok(None);
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|error| ResponseCacheError::serialization(error.to_string()))
    }

    async fn put(
        &self,
        key: &ResponseCacheKey,
        response: &CachedResponse,
        ttl: Duration,
    ) -> Result<(), ResponseCacheError> {
        let payload = serde_json::to_string(response)
            .map_err(|error| ResponseCacheError::serialization(error.to_string()))?;
        let mut pooled = self.pool.get().await.map_err(backend)?;
        let conn = &mut *pooled;
        let generation: Option<u64> = conn.get(self.generation_key()).await.map_err(backend)?;
        let entry_key = self.entry_key(generation.unwrap_or_default(), key);
        let () = conn
            .set_ex(entry_key, payload, ttl.as_secs().max(1))
            .await
            .map_err(backend)?;
        Ok(())
    }

    async fn invalidate_all(&self) -> Result<(), ResponseCacheError> {
        let mut pooled = self.pool.get().await.map_err(backend)?;
        let conn = &mut *pooled;
        let generation: u64 = conn.incr(self.generation_key(), 1_u64).await.map_err(backend)?;
        debug!(generation, "response cache generation bumped");
        Ok(())
    }
}
