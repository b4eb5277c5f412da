//! Persistence abstractions.
//!
//! Each trait is the narrow store surface one part of the application needs.
//! Handles are passed explicitly (`Arc<dyn ...>`); nothing here is global.

mod memory;
mod postgres;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use shopfront_auth::{Group, User};
use shopfront_blog::BlogPost;
use shopfront_catalog::{Category, Product, ProductStatus};
use shopfront_core::{BlogPostId, CategoryId, ProductId, SessionId, UserId};

use crate::StoreError;

pub use memory::InMemoryStore;
pub use postgres::PostgresStore;

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait::async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a new user. The (normalized) email must be unused.
    async fn create_user(&self, user: &User) -> StoreResult<()>;
    async fn get_user(&self, id: UserId) -> StoreResult<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    /// Persist the profile fields only.
    async fn update_profile(&self, user: &User) -> StoreResult<()>;
    async fn add_to_group(&self, id: UserId, group: &Group) -> StoreResult<()>;
    async fn remove_from_group(&self, id: UserId, group: &Group) -> StoreResult<()>;
    async fn set_superuser(&self, id: UserId, is_superuser: bool) -> StoreResult<()>;
}

#[async_trait::async_trait]
pub trait CategoryStore: Send + Sync {
    async fn create_category(&self, category: &Category) -> StoreResult<()>;
    async fn get_category(&self, id: CategoryId) -> StoreResult<Option<Category>>;
    /// All categories ordered by name.
    async fn list_categories(&self) -> StoreResult<Vec<Category>>;
    /// Delete a category together with every product that references it.
    async fn delete_category(&self, id: CategoryId) -> StoreResult<()>;
}

/// Candidate filter for product listings.
///
/// `viewer` widens the published set with that user's own products. The store
/// may return a superset; callers re-apply the listing policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProductFilter {
    pub viewer: Option<UserId>,
    pub category: Option<CategoryId>,
}

#[async_trait::async_trait]
pub trait ProductStore: Send + Sync {
    async fn create_product(&self, product: &Product) -> StoreResult<()>;
    async fn get_product(&self, id: ProductId) -> StoreResult<Option<Product>>;
    /// Published products plus those owned by `filter.viewer`, ordered by
    /// name then category name.
    async fn list_products(&self, filter: ProductFilter) -> StoreResult<Vec<Product>>;
    /// Persist the editable fields. Owner and status are left as stored.
    async fn update_product(&self, product: &Product) -> StoreResult<()>;
    /// Give an ownerless product to `owner`. `Ok(false)` when the product
    /// already has an owner (or is gone); an existing owner is never replaced.
    async fn claim_ownerless(&self, id: ProductId, owner: UserId) -> StoreResult<bool>;
    /// Single-column status write.
    async fn set_status(&self, id: ProductId, status: ProductStatus) -> StoreResult<()>;
    async fn delete_product(&self, id: ProductId) -> StoreResult<()>;
}

#[async_trait::async_trait]
pub trait BlogStore: Send + Sync {
    async fn create_post(&self, post: &BlogPost) -> StoreResult<()>;
    async fn get_post(&self, id: BlogPostId) -> StoreResult<Option<BlogPost>>;
    /// Published posts, newest first.
    async fn list_published_posts(&self) -> StoreResult<Vec<BlogPost>>;
    /// Persist editable fields; never touches `views_count` or `created_at`.
    async fn update_post(&self, post: &BlogPost) -> StoreResult<()>;
    async fn delete_post(&self, id: BlogPostId) -> StoreResult<()>;
    /// Atomically add one view and return the new count.
    async fn increment_views(&self, id: BlogPostId) -> StoreResult<u64>;
}

/// An authenticated session, referenced by the `sid` claim of a bearer token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

#[async_trait::async_trait]
pub trait SessionStore: Send + Sync {
    async fn create_session(&self, session: &Session) -> StoreResult<()>;
    async fn get_session(&self, id: SessionId) -> StoreResult<Option<Session>>;
    /// Removing a missing session is not an error.
    async fn delete_session(&self, id: SessionId) -> StoreResult<()>;
    /// Drop every session expired at `now`; returns how many were removed.
    async fn prune_expired_sessions(&self, now: DateTime<Utc>) -> StoreResult<u64>;
}
