//! Redis cache backend (optional, `redis` feature).
//!
//! Uses the blocking client on the blocking thread pool, with connect and
//! read/write timeouts so an unreachable server degrades to a fast error.

use std::time::Duration;

use super::{CacheBackend, CacheError};

#[derive(Debug, Clone)]
pub struct RedisCache {
    client: redis::Client,
    timeout: Duration,
}

impl RedisCache {
    pub fn new(redis_url: impl AsRef<str>, timeout: Duration) -> Result<Self, CacheError> {
        let client = redis::Client::open(redis_url.as_ref())
            .map_err(|e| CacheError::Unavailable(e.to_string()))?;
        Ok(Self { client, timeout })
    }

    fn connection(client: &redis::Client, timeout: Duration) -> Result<redis::Connection, CacheError> {
        let conn = client
            .get_connection_with_timeout(timeout)
            .map_err(|e| CacheError::Unavailable(e.to_string()))?;
        conn.set_read_timeout(Some(timeout))
            .and_then(|_| conn.set_write_timeout(Some(timeout)))
            .map_err(|e| CacheError::Unavailable(e.to_string()))?;
        Ok(conn)
    }

    async fn blocking<T, F>(&self, f: F) -> Result<T, CacheError>
    where
        T: Send + 'static,
        F: FnOnce(&mut redis::Connection) -> redis::RedisResult<T> + Send + 'static,
    {
        let client = self.client.clone();
        let timeout = self.timeout;
        tokio::task::spawn_blocking(move || {
            let mut conn = Self::connection(&client, timeout)?;
            f(&mut conn).map_err(|e| CacheError::Unavailable(e.to_string()))
        })
        .await
        .map_err(|e| CacheError::Unavailable(format!("cache task failed: {e}")))?
    }
}

#[async_trait::async_trait]
impl CacheBackend for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let key = key.to_string();
        self.blocking(move |conn| redis::cmd("GET").arg(&key).query::<Option<String>>(conn))
            .await
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        let key = key.to_string();
        let seconds = ttl.as_secs().max(1);
        self.blocking(move |conn| {
            redis::cmd("SET")
                .arg(&key)
                .arg(value)
                .arg("EX")
                .arg(seconds)
                .query::<()>(conn)
        })
        .await
    }
}
