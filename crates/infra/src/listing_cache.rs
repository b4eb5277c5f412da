//! Read-through cache for computed listings, keyed per viewer.
//!
//! Keys are `"{listing}:{viewer}"` where viewer is a user id or `anonymous`.
//! Values are JSON snapshots taken at write time and expire after the TTL;
//! there is no explicit invalidation.
//!
//! Fail-open: any backend error, timeout, or undecodable value is logged at
//! `warn` and treated as a miss. A listing is identical whether the cache is
//! enabled, empty, or unreachable.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use shopfront_core::UserId;

use crate::cache::{CacheBackend, CacheError};

pub const DEFAULT_TTL: Duration = Duration::from_secs(15 * 60);
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(250);

#[derive(Clone)]
pub struct ListingCache {
    backend: Option<Arc<dyn CacheBackend>>,
    ttl: Duration,
    timeout: Duration,
}

impl core::fmt::Debug for ListingCache {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ListingCache")
            .field("enabled", &self.is_enabled())
            .field("ttl", &self.ttl)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ListingCache {
    pub fn new(backend: Arc<dyn CacheBackend>, ttl: Duration, timeout: Duration) -> Self {
        Self {
            backend: Some(backend),
            ttl,
            timeout,
        }
    }

    /// Every lookup computes directly.
    pub fn disabled() -> Self {
        Self {
            backend: None,
            ttl: DEFAULT_TTL,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.backend.is_some()
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn key(listing: &str, viewer: Option<UserId>) -> String {
        match viewer {
            Some(id) => format!("{listing}:{id}"),
            None => format!("{listing}:anonymous"),
        }
    }

    /// Return the cached snapshot for `(listing, viewer)`, or run `compute`
    /// and store its result. Errors from `compute` are returned uncached.
    pub async fn get_or_compute<T, E, F, Fut>(
        &self,
        listing: &str,
        viewer: Option<UserId>,
        compute: F,
    ) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let Some(backend) = self.backend.as_deref() else {
            return compute().await;
        };
        let key = Self::key(listing, viewer);

        match self.lookup::<T>(backend, &key).await {
            Ok(Some(hit)) => {
                debug!(cache_key = %key, "listing cache hit");
                return Ok(hit);
            }
            Ok(None) => debug!(cache_key = %key, "listing cache miss"),
            Err(e) => warn!(cache_key = %key, error = %e, "listing cache read failed; computing directly"),
        }

        let value = compute().await?;

        if let Err(e) = self.store(backend, &key, &value).await {
            warn!(cache_key = %key, error = %e, "listing cache write failed");
        }
        Ok(value)
    }

    async fn lookup<T: DeserializeOwned>(
        &self,
        backend: &dyn CacheBackend,
        key: &str,
    ) -> Result<Option<T>, CacheError> {
        let raw = tokio::time::timeout(self.timeout, backend.get(key))
            .await
            .map_err(|_| CacheError::Timeout(self.timeout))??;

        raw.map(|s| serde_json::from_str(&s).map_err(|e| CacheError::Decode(e.to_string())))
            .transpose()
    }

    async fn store<T: Serialize>(
        &self,
        backend: &dyn CacheBackend,
        key: &str,
        value: &T,
    ) -> Result<(), CacheError> {
        let encoded = serde_json::to_string(value).map_err(|e| CacheError::Decode(e.to_string()))?;
        tokio::time::timeout(self.timeout, backend.set(key, encoded, self.ttl))
            .await
            .map_err(|_| CacheError::Timeout(self.timeout))?
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::InMemoryCache;

    struct BrokenCache;

    #[async_trait::async_trait]
    impl CacheBackend for BrokenCache {
        async fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
            Err(CacheError::Unavailable("connection refused".to_string()))
        }

        async fn set(&self, _key: &str, _value: String, _ttl: Duration) -> Result<(), CacheError> {
            Err(CacheError::Unavailable("connection refused".to_string()))
        }
    }

    struct SlowCache;

    #[async_trait::async_trait]
    impl CacheBackend for SlowCache {
        async fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(Some("[1]".to_string()))
        }

        async fn set(&self, _key: &str, _value: String, _ttl: Duration) -> Result<(), CacheError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        }
    }

    async fn compute_counted(calls: &AtomicUsize, value: Vec<u32>) -> Result<Vec<u32>, String> {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok(value)
    }

    #[test]
    fn keys_are_per_viewer() {
        let id = UserId::new();
        assert_eq!(ListingCache::key("product_list", None), "product_list:anonymous");
        assert_eq!(
            ListingCache::key("product_list", Some(id)),
            format!("product_list:{id}")
        );
    }

    #[tokio::test]
    async fn second_read_is_served_from_cache() {
        let cache = ListingCache::new(
            Arc::new(InMemoryCache::new()),
            DEFAULT_TTL,
            DEFAULT_TIMEOUT,
        );
        let calls = AtomicUsize::new(0);

        let first = cache
            .get_or_compute("l", None, || compute_counted(&calls, vec![1, 2]))
            .await
            .unwrap();
        let second = cache
            .get_or_compute("l", None, || compute_counted(&calls, vec![9]))
            .await
            .unwrap();

        assert_eq!(first, vec![1, 2]);
        assert_eq!(second, vec![1, 2]);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn viewers_do_not_share_entries() {
        let cache = ListingCache::new(
            Arc::new(InMemoryCache::new()),
            DEFAULT_TTL,
            DEFAULT_TIMEOUT,
        );
        let calls = AtomicUsize::new(0);

        cache
            .get_or_compute("l", None, || compute_counted(&calls, vec![1]))
            .await
            .unwrap();
        let mine = cache
            .get_or_compute("l", Some(UserId::new()), || compute_counted(&calls, vec![1, 2]))
            .await
            .unwrap();

        assert_eq!(mine, vec![1, 2]);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn broken_backend_falls_through_every_time() {
        let cache = ListingCache::new(Arc::new(BrokenCache), DEFAULT_TTL, DEFAULT_TIMEOUT);
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let v = cache
                .get_or_compute("l", None, || compute_counted(&calls, vec![7]))
                .await
                .unwrap();
            assert_eq!(v, vec![7]);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn slow_backend_times_out_into_a_miss() {
        let cache = ListingCache::new(Arc::new(SlowCache), DEFAULT_TTL, Duration::from_millis(10));
        let calls = AtomicUsize::new(0);

        let v = cache
            .get_or_compute("l", None, || compute_counted(&calls, vec![3]))
            .await
            .unwrap();
        assert_eq!(v, vec![3]);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn compute_errors_are_not_cached() {
        let backend = Arc::new(InMemoryCache::new());
        let cache = ListingCache::new(backend.clone(), DEFAULT_TTL, DEFAULT_TIMEOUT);

        let err = cache
            .get_or_compute("l", None, || async { Err::<Vec<u32>, _>("db down") })
            .await
            .unwrap_err();
        assert_eq!(err, "db down");
        assert!(backend.is_empty());
    }

    #[tokio::test]
    async fn disabled_cache_always_computes() {
        let cache = ListingCache::disabled();
        let calls = AtomicUsize::new(0);
        for _ in 0..2 {
            cache
                .get_or_compute("l", None, || compute_counted(&calls, vec![]))
                .await
                .unwrap();
        }
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(!cache.is_enabled());
    }
}
