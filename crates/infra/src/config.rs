//! Application configuration.
//!
//! Sources, lowest to highest precedence: built-in defaults, an optional
//! `config/shopfront.toml`, an optional explicit file, and `SHOPFRONT__*`
//! environment variables (`SHOPFRONT__CACHE__ENABLED=true`).

use std::path::Path;
use std::time::Duration;

use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;

use crate::cache::{DEFAULT_CAPACITY, MAX_TTL};

pub const DEFAULT_CONFIG_BASENAME: &str = "config/shopfront";
pub const ENV_PREFIX: &str = "SHOPFRONT";
pub const DEV_JWT_SECRET: &str = "dev-secret";

/// Upper bound for `auth.session_ttl_minutes` (one year).
pub const MAX_SESSION_TTL_MINUTES: i64 = 365 * 24 * 60;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub database: DatabaseConfig,
    pub cache: CacheConfig,
    pub mail: MailConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
        }
    }
}

#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub session_ttl_minutes: i64,
}

impl core::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"<redacted>")
            .field("session_ttl_minutes", &self.session_ttl_minutes)
            .finish()
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: DEV_JWT_SECRET.to_string(),
            session_ttl_minutes: 14 * 24 * 60,
        }
    }
}

impl AuthConfig {
    pub fn uses_dev_secret(&self) -> bool {
        self.jwt_secret == DEV_JWT_SECRET
    }

    /// Clamped to `1..=MAX_SESSION_TTL_MINUTES`.
    pub fn session_ttl(&self) -> chrono::Duration {
        let minutes = self.session_ttl_minutes.clamp(1, MAX_SESSION_TTL_MINUTES);
        chrono::Duration::try_minutes(minutes).unwrap_or_else(|| chrono::Duration::days(14))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Unset selects the in-memory stores.
    pub url: Option<String>,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: 5,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    pub ttl_seconds: u64,
    /// Unset (with `enabled`) selects the in-process backend.
    pub redis_url: Option<String>,
    pub timeout_ms: u64,
    pub product_detail: bool,
    /// Entry cap for the in-process backend.
    pub max_entries: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            ttl_seconds: 15 * 60,
            redis_url: None,
            timeout_ms: 250,
            product_detail: false,
            max_entries: DEFAULT_CAPACITY,
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds).min(MAX_TTL)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MailConfig {
    pub from: String,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            from: "noreply@shopfront.local".to_string(),
        }
    }
}

impl AppConfig {
    /// Load from the default file (if present) and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Like [`AppConfig::load`], with an extra required file layered on top of
    /// the default one.
    pub fn load_from(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder =
            Config::builder().add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false));

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        );

        let config: Self = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would overflow time arithmetic or disable a bound.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_SESSION_TTL_MINUTES).contains(&self.auth.session_ttl_minutes) {
            return Err(ConfigError::Invalid(format!(
                "auth.session_ttl_minutes must be between 1 and {MAX_SESSION_TTL_MINUTES}"
            )));
        }
        if self.cache.ttl_seconds == 0 || self.cache.ttl_seconds > MAX_TTL.as_secs() {
            return Err(ConfigError::Invalid(format!(
                "cache.ttl_seconds must be between 1 and {}",
                MAX_TTL.as_secs()
            )));
        }
        if self.cache.max_entries == 0 {
            return Err(ConfigError::Invalid(
                "cache.max_entries must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
