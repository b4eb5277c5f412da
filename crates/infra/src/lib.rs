//! Infrastructure layer: stores, cache backends, notifier, config.

pub mod cache;
pub mod config;
pub mod error;
pub mod listing_cache;
pub mod notifier;
pub mod store;

pub use cache::{CacheBackend, CacheError, InMemoryCache};
pub use config::AppConfig;
pub use error::StoreError;
pub use listing_cache::ListingCache;
pub use notifier::{send_best_effort, LogNotifier, Message, Notifier, NotifyError};
pub use store::{
    BlogStore, CategoryStore, InMemoryStore, PostgresStore, ProductStore, Session, SessionStore,
    UserStore,
};
