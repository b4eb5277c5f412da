use std::time::{Duration, Instant};

use moka::sync::Cache;
use moka::Expiry;

use super::{CacheBackend, CacheError, MAX_TTL};

/// Entry cap for [`InMemoryCache::new`].
pub const DEFAULT_CAPACITY: u64 = 10_000;

#[derive(Clone)]
struct Entry {
    value: String,
    ttl: Duration,
}

/// Each entry lives for the TTL it was written with; a rewrite restarts it.
struct PerEntryTtl;

impl Expiry<String, Entry> for PerEntryTtl {
    fn expire_after_create(&self, _key: &String, entry: &Entry, _created_at: Instant) -> Option<Duration> {
        Some(entry.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        entry: &Entry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(entry.ttl)
    }
}

/// In-process TTL cache backed by Moka (bounded, TinyLFU admission).
pub struct InMemoryCache {
    entries: Cache<String, Entry>,
}

impl core::fmt::Debug for InMemoryCache {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("InMemoryCache")
            .field("entries", &self.entries.entry_count())
            .finish()
    }
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(max_entries: u64) -> Self {
        Self {
            entries: Cache::builder()
                .max_capacity(max_entries)
                .expire_after(PerEntryTtl)
                .build(),
        }
    }

    /// Live entries, after flushing pending evictions.
    pub fn len(&self) -> u64 {
        self.entries.run_pending_tasks();
        self.entries.entry_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl CacheBackend for InMemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        Ok(self.entries.get(key).map(|entry| entry.value))
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        let ttl = ttl.min(MAX_TTL);
        self.entries.insert(key.to_string(), Entry { value, ttl });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn entries_expire_after_ttl() {
        let cache = InMemoryCache::new();
        cache
            .set("k", "v".to_string(), Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(cache.get("k").await.unwrap().as_deref(), Some("v"));

        cache.set("gone", "v".to_string(), Duration::ZERO).await.unwrap();
        assert_eq!(cache.get("gone").await.unwrap(), None);
    }

    #[tokio::test]
    async fn expired_entries_are_evicted_without_being_read() {
        let cache = InMemoryCache::new();
        for i in 0..2_000 {
            cache
                .set(&format!("product_list:{i}"), "[]".to_string(), Duration::from_millis(1))
                .await
                .unwrap();
        }
        // Expirations are swept on a timer wheel with roughly second granularity.
        tokio::time::sleep(Duration::from_millis(2_500)).await;
        cache
            .set("fresh", "[]".to_string(), Duration::from_secs(60))
            .await
            .unwrap();

        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn entry_count_is_bounded() {
        let cache = InMemoryCache::with_capacity(100);
        for i in 0..1_000 {
            cache
                .set(&format!("k{i}"), "v".to_string(), Duration::from_secs(60))
                .await
                .unwrap();
        }
        assert!(cache.len() <= 100);
    }

    #[tokio::test]
    async fn huge_ttl_is_clamped() {
        let cache = InMemoryCache::new();
        cache
            .set("k", "v".to_string(), Duration::from_secs(u64::MAX))
            .await
            .unwrap();
        assert_eq!(cache.get("k").await.unwrap().as_deref(), Some("v"));
    }

    #[tokio::test]
    async fn rewrite_restarts_the_ttl() {
        let cache = InMemoryCache::new();
        cache.set("k", "old".to_string(), Duration::ZERO).await.unwrap();
        cache
            .set("k", "new".to_string(), Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(cache.get("k").await.unwrap().as_deref(), Some("new"));
    }
}
