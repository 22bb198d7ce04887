//! Request middleware.
//!
//! Purpose: Define middleware components for request lifecycle concerns such as
//! tracing and catalogue response caching.

pub mod response_cache;
pub mod trace;

pub use response_cache::{ResponseCacheLayer, X_CACHE_HEADER};
pub use trace::Trace;
