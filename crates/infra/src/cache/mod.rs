//! Key/value cache backends.
//!
//! Backends store opaque strings with a time-to-live. They are an optimization
//! only; callers treat every [`CacheError`] as a miss (see
//! [`crate::ListingCache`]).

mod memory;
#[cfg(feature = "redis")]
mod redis_cache;

use std::time::Duration;

use thiserror::Error;

pub use memory::{InMemoryCache, DEFAULT_CAPACITY};
#[cfg(feature = "redis")]
pub use redis_cache::RedisCache;

/// Longest TTL a cache entry may carry; longer requests are clamped.
pub const MAX_TTL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CacheError {
    #[error("cache backend unavailable: {0}")]
    Unavailable(String),

    #[error("cache operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("cached value could not be decoded: {0}")]
    Decode(String),
}

#[async_trait::async_trait]
pub trait CacheBackend: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;
    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError>;
}
