//! Port interface for caching rendered catalogue responses.
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{ResponseCacheKey, define_port_error};

define_port_error! {
    /// Errors surfaced by the caching adapter.
    pub enum ResponseCacheError {
        /// Cache backend is unavailable or timing out.
        Backend { message: String } => "response cache backend failure: {message}",
        /// Serialisation or deserialisation of cached content failed.
        Serialization { message: String } => "response cache serialisation failed: {message}",
    }
}

/// A rendered response as stored in the cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedResponse {
    /// HTTP status code.
    pub status: u16,
    /// `Content-Type` header value.
    pub content_type: String,
    /// Response body.
    pub body: String,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ResponseCache: Send + Sync {
    /// Read a cached response.
    async fn get(
        &self,
        key: &ResponseCacheKey,
    ) -> Result<Option<CachedResponse>, ResponseCacheError>;

    /// Store a response for `ttl`.
    async fn put(
        &self,
        key: &ResponseCacheKey,
        response: &CachedResponse,
        ttl: Duration,
    ) -> Result<(), ResponseCacheError>;

    /// Drop every cached response.
    async fn invalidate_all(&self) -> Result<(), ResponseCacheError>;
}

/// Cache that stores nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpResponseCache;

#[async_trait]
impl ResponseCache for NoOpResponseCache {
    async fn get(
        &self,
        _key: &ResponseCacheKey,
    ) -> Result<Option<CachedResponse>, ResponseCacheError> {
        Ok(None)
    }

    async fn put(
        &self,
        _key: &ResponseCacheKey,
        _response: &CachedResponse,
        _ttl: Duration,
    ) -> Result<(), ResponseCacheError> {
        Ok(())
    }

    async fn invalidate_all(&self) -> Result<(), ResponseCacheError> {
        Ok(())
    }
}
