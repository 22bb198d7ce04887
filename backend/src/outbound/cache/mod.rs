//! Response cache adapters.
//!
//! - [`InMemoryResponseCache`]: process-local map with expiry, used when no
//!   Redis URL is configured.
//! - [`RedisResponseCache`]: `bb8-redis` pool with generation-prefixed keys,
//!   so dropping every entry is a single `INCR`.

mod memory;
mod redis;

pub use memory::InMemoryResponseCache;
pub use self::redis::RedisResponseCache;
