//! Service wiring: stores, caches, notifier and token issuer, built once at
//! startup and shared by every handler through an `Arc<AppServices>`.

use std::sync::Arc;

use chrono::{Duration, Utc};
use thiserror::Error;
use tracing::{debug, info, warn};

use shopfront_auth::{Hs256Jwt, SessionClaims, TokenValidationError, User};
use shopfront_core::SessionId;
use shopfront_infra::config::{CacheConfig, ConfigError};
use shopfront_infra::store::{
    BlogStore, CategoryStore, InMemoryStore, PostgresStore, ProductStore, Session, SessionStore,
    UserStore,
};
use shopfront_infra::{
    AppConfig, CacheBackend, CacheError, InMemoryCache, ListingCache, LogNotifier, Notifier,
    StoreError,
};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error("failed to issue session token: {0}")]
    Token(#[from] TokenValidationError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[derive(Clone)]
enum StoreBackend {
    InMemory,
    Persistent(PostgresStore),
}

#[derive(Clone)]
pub struct AppServices {
    pub users: Arc<dyn UserStore>,
    pub categories: Arc<dyn CategoryStore>,
    pub products: Arc<dyn ProductStore>,
    pub blog: Arc<dyn BlogStore>,
    pub sessions: Arc<dyn SessionStore>,
    /// `/products/` listing cache.
    pub listing_cache: ListingCache,
    /// Product detail cache; disabled unless `cache.product_detail` is set.
    pub detail_cache: ListingCache,
    pub notifier: Arc<dyn Notifier>,
    pub jwt: Arc<Hs256Jwt>,
    pub session_ttl: Duration,
    pub mail_from: String,
    backend: StoreBackend,
}

impl AppServices {
    /// In-memory stores, caching disabled, log-only notifier.
    pub fn in_memory(jwt_secret: &str) -> Self {
        Self::with_store(
            Arc::new(InMemoryStore::new()),
            StoreBackend::InMemory,
            jwt_secret,
        )
    }

    fn with_store<S>(store: Arc<S>, backend: StoreBackend, jwt_secret: &str) -> Self
    where
        S: UserStore + CategoryStore + ProductStore + BlogStore + SessionStore + 'static,
    {
        let defaults = AppConfig::default();
        Self {
            users: store.clone(),
            categories: store.clone(),
            products: store.clone(),
            blog: store.clone(),
            sessions: store,
            listing_cache: ListingCache::disabled(),
            detail_cache: ListingCache::disabled(),
            notifier: Arc::new(LogNotifier),
            jwt: Arc::new(Hs256Jwt::new(jwt_secret.as_bytes())),
            session_ttl: defaults.auth.session_ttl(),
            mail_from: defaults.mail.from,
            backend,
        }
    }

    pub fn with_listing_cache(mut self, cache: ListingCache) -> Self {
        self.listing_cache = cache;
        self
    }

    pub fn with_detail_cache(mut self, cache: ListingCache) -> Self {
        self.detail_cache = cache;
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    pub fn with_mail_from(mut self, from: impl Into<String>) -> Self {
        self.mail_from = from.into();
        self
    }

    /// Wire everything from configuration. A database URL selects Postgres
    /// (migrations are applied on connect); otherwise stores are in-memory.
    pub async fn from_config(config: &AppConfig) -> Result<Self, ServiceError> {
        config.validate()?;
        if config.auth.uses_dev_secret() {
            warn!("auth.jwt_secret not set; using insecure dev default");
        }

        let services = match &config.database.url {
            Some(url) => {
                let store = PostgresStore::connect(url, config.database.max_connections).await?;
                store.run_migrations().await?;
                info!("using postgres stores");
                Self::with_store(
                    Arc::new(store.clone()),
                    StoreBackend::Persistent(store),
                    &config.auth.jwt_secret,
                )
            }
            None => {
                info!("database.url not set; using in-memory stores");
                Self::in_memory(&config.auth.jwt_secret)
            }
        };

        let mut services = services
            .with_session_ttl(config.auth.session_ttl())
            .with_mail_from(config.mail.from.clone());

        if let Some(backend) = cache_backend(&config.cache)? {
            let cache = ListingCache::new(backend, config.cache.ttl(), config.cache.timeout());
            if config.cache.product_detail {
                services = services.with_detail_cache(cache.clone());
            }
            services = services.with_listing_cache(cache);
        }

        Ok(services)
    }

    /// Persist a new session for `user` and return its bearer token.
    pub async fn start_session(&self, user: &User) -> Result<String, ServiceError> {
        let now = Utc::now();
        let session = Session {
            id: SessionId::new(),
            user_id: user.id,
            created_at: now,
            expires_at: now + self.session_ttl,
        };
        self.sessions.create_session(&session).await?;
        match self.sessions.prune_expired_sessions(now).await {
            Ok(0) => {}
            Ok(n) => debug!(pruned = n, "expired sessions removed"),
            Err(e) => warn!(error = %e, "failed to prune expired sessions"),
        }

        let claims = SessionClaims::new(user.id, session.id, now, self.session_ttl);
        Ok(self.jwt.issue(&claims)?)
    }

    pub async fn health_check(&self) -> Result<(), StoreError> {
        match &self.backend {
            StoreBackend::InMemory => Ok(()),
            StoreBackend::Persistent(store) => store.health_check().await,
        }
    }
}

fn cache_backend(cfg: &CacheConfig) -> Result<Option<Arc<dyn CacheBackend>>, ServiceError> {
    if !cfg.enabled {
        return Ok(None);
    }

    let backend: Arc<dyn CacheBackend> = match &cfg.redis_url {
        #[cfg(feature = "redis")]
        Some(url) => {
            info!(ttl_seconds = cfg.ttl_seconds, "listing cache enabled (redis)");
            Arc::new(shopfront_infra::cache::RedisCache::new(url, cfg.timeout())?)
        }
        #[cfg(not(feature = "redis"))]
        Some(_) => {
            warn!("cache.redis_url set but redis support is not compiled in; using in-process cache");
            Arc::new(InMemoryCache::with_capacity(cfg.max_entries))
        }
        None => {
            info!(ttl_seconds = cfg.ttl_seconds, "listing cache enabled (in-process)");
            Arc::new(InMemoryCache::with_capacity(cfg.max_entries))
        }
    };
    Ok(Some(backend))
}
