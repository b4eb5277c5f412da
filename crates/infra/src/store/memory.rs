use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};

use shopfront_auth::{Group, User};
use shopfront_blog::BlogPost;
use shopfront_catalog::{Category, Product, ProductStatus};
use shopfront_core::{BlogPostId, CategoryId, ProductId, SessionId, UserId};

use super::{
    BlogStore, CategoryStore, ProductFilter, ProductStore, Session, SessionStore, StoreResult,
    UserStore,
};
use crate::StoreError;

/// In-memory store for tests/dev.
///
/// One lock per table. No lock is held across an `.await`.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    users: RwLock<HashMap<UserId, User>>,
    categories: RwLock<HashMap<CategoryId, Category>>,
    products: RwLock<HashMap<ProductId, Product>>,
    posts: RwLock<HashMap<BlogPostId, BlogPost>>,
    sessions: RwLock<HashMap<SessionId, Session>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn read<T>(lock: &RwLock<T>) -> StoreResult<RwLockReadGuard<'_, T>> {
    lock.read()
        .map_err(|_| StoreError::backend("in-memory store lock poisoned"))
}

fn write<T>(lock: &RwLock<T>) -> StoreResult<RwLockWriteGuard<'_, T>> {
    lock.write()
        .map_err(|_| StoreError::backend("in-memory store lock poisoned"))
}

fn with_user<F>(store: &InMemoryStore, id: UserId, f: F) -> StoreResult<()>
where
    F: FnOnce(&mut User),
{
    let mut users = write(&store.users)?;
    let user = users.get_mut(&id).ok_or(StoreError::NotFound)?;
    f(user);
    Ok(())
}

#[async_trait::async_trait]
impl UserStore for InMemoryStore {
    async fn create_user(&self, user: &User) -> StoreResult<()> {
        let mut users = write(&self.users)?;
        if users.values().any(|u| u.email == user.email) {
            return Err(StoreError::Conflict(format!(
                "email already registered: {}",
                user.email
            )));
        }
        users.insert(user.id, user.clone());
        Ok(())
    }

    async fn get_user(&self, id: UserId) -> StoreResult<Option<User>> {
        Ok(read(&self.users)?.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(read(&self.users)?
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn update_profile(&self, user: &User) -> StoreResult<()> {
        with_user(self, user.id, |stored| {
            stored.first_name = user.first_name.clone();
            stored.last_name = user.last_name.clone();
            stored.phone_number = user.phone_number.clone();
            stored.country = user.country.clone();
            stored.avatar = user.avatar.clone();
        })
    }

    async fn add_to_group(&self, id: UserId, group: &Group) -> StoreResult<()> {
        with_user(self, id, |user| {
            if !user.groups.contains(group) {
                user.groups.push(group.clone());
                user.groups.sort();
            }
        })
    }

    async fn remove_from_group(&self, id: UserId, group: &Group) -> StoreResult<()> {
        with_user(self, id, |user| user.groups.retain(|g| g != group))
    }

    async fn set_superuser(&self, id: UserId, is_superuser: bool) -> StoreResult<()> {
        with_user(self, id, |user| user.is_superuser = is_superuser)
    }
}

#[async_trait::async_trait]
impl CategoryStore for InMemoryStore {
    async fn create_category(&self, category: &Category) -> StoreResult<()> {
        write(&self.categories)?.insert(category.id, category.clone());
        Ok(())
    }

    async fn get_category(&self, id: CategoryId) -> StoreResult<Option<Category>> {
        Ok(read(&self.categories)?.get(&id).cloned())
    }

    async fn list_categories(&self) -> StoreResult<Vec<Category>> {
        let mut out: Vec<Category> = read(&self.categories)?.values().cloned().collect();
        out.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(out)
    }

    async fn delete_category(&self, id: CategoryId) -> StoreResult<()> {
        // Lock order: categories, then products.
        let mut categories = write(&self.categories)?;
        if categories.remove(&id).is_none() {
            return Err(StoreError::NotFound);
        }
        write(&self.products)?.retain(|_, p| p.category_id != id);
        Ok(())
    }
}

#[async_trait::async_trait]
impl ProductStore for InMemoryStore {
    async fn create_product(&self, product: &Product) -> StoreResult<()> {
        if !read(&self.categories)?.contains_key(&product.category_id) {
            return Err(StoreError::MissingReference(format!(
                "category {}",
                product.category_id
            )));
        }
        write(&self.products)?.insert(product.id, product.clone());
        Ok(())
    }

    async fn get_product(&self, id: ProductId) -> StoreResult<Option<Product>> {
        Ok(read(&self.products)?.get(&id).cloned())
    }

    async fn list_products(&self, filter: ProductFilter) -> StoreResult<Vec<Product>> {
        let categories = read(&self.categories)?;
        let products = read(&self.products)?;

        let mut out: Vec<Product> = products
            .values()
            .filter(|p| filter.category.is_none_or(|c| p.category_id == c))
            .filter(|p| p.is_published() || (filter.viewer.is_some() && p.owner == filter.viewer))
            .cloned()
            .collect();

        let category_name = |p: &Product| {
            categories
                .get(&p.category_id)
                .map(|c| c.name.clone())
                .unwrap_or_default()
        };
        out.sort_by(|a, b| {
            a.name
                .cmp(&b.name)
                .then_with(|| category_name(a).cmp(&category_name(b)))
                .then(a.id.cmp(&b.id))
        });
        Ok(out)
    }

    async fn update_product(&self, product: &Product) -> StoreResult<()> {
        if !read(&self.categories)?.contains_key(&product.category_id) {
            return Err(StoreError::MissingReference(format!(
                "category {}",
                product.category_id
            )));
        }
        let mut products = write(&self.products)?;
        let stored = products.get_mut(&product.id).ok_or(StoreError::NotFound)?;
        let (owner, status) = (stored.owner, stored.status);
        *stored = product.clone();
        stored.owner = owner;
        stored.status = status;
        Ok(())
    }

    async fn claim_ownerless(&self, id: ProductId, owner: UserId) -> StoreResult<bool> {
        let mut products = write(&self.products)?;
        match products.get_mut(&id) {
            Some(stored) if stored.owner.is_none() => {
                stored.owner = Some(owner);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn set_status(&self, id: ProductId, status: ProductStatus) -> StoreResult<()> {
        let mut products = write(&self.products)?;
        let stored = products.get_mut(&id).ok_or(StoreError::NotFound)?;
        stored.status = status;
        Ok(())
    }

    async fn delete_product(&self, id: ProductId) -> StoreResult<()> {
        write(&self.products)?
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }
}

#[async_trait::async_trait]
impl BlogStore for InMemoryStore {
    async fn create_post(&self, post: &BlogPost) -> StoreResult<()> {
        write(&self.posts)?.insert(post.id, post.clone());
        Ok(())
    }

    async fn get_post(&self, id: BlogPostId) -> StoreResult<Option<BlogPost>> {
        Ok(read(&self.posts)?.get(&id).cloned())
    }

    async fn list_published_posts(&self) -> StoreResult<Vec<BlogPost>> {
        let mut out: Vec<BlogPost> = read(&self.posts)?
            .values()
            .filter(|p| p.is_published)
            .cloned()
            .collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(out)
    }

    async fn update_post(&self, post: &BlogPost) -> StoreResult<()> {
        let mut posts = write(&self.posts)?;
        let stored = posts.get_mut(&post.id).ok_or(StoreError::NotFound)?;
        stored.title = post.title.clone();
        stored.content = post.content.clone();
        stored.preview = post.preview.clone();
        stored.is_published = post.is_published;
        Ok(())
    }

    async fn delete_post(&self, id: BlogPostId) -> StoreResult<()> {
        write(&self.posts)?
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }

    async fn increment_views(&self, id: BlogPostId) -> StoreResult<u64> {
        let mut posts = write(&self.posts)?;
        let stored = posts.get_mut(&id).ok_or(StoreError::NotFound)?;
        stored.views_count += 1;
        Ok(stored.views_count)
    }
}

#[async_trait::async_trait]
impl SessionStore for InMemoryStore {
    async fn create_session(&self, session: &Session) -> StoreResult<()> {
        write(&self.sessions)?.insert(session.id, session.clone());
        Ok(())
    }

    async fn get_session(&self, id: SessionId) -> StoreResult<Option<Session>> {
        Ok(read(&self.sessions)?.get(&id).cloned())
    }

    async fn delete_session(&self, id: SessionId) -> StoreResult<()> {
        write(&self.sessions)?.remove(&id);
        Ok(())
    }

    async fn prune_expired_sessions(&self, now: DateTime<Utc>) -> StoreResult<u64> {
        let mut sessions = write(&self.sessions)?;
        let before = sessions.len();
        sessions.retain(|_, s| s.is_live(now));
        Ok((before - sessions.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};
    use shopfront_auth::Registration;
    use shopfront_blog::BlogPostInput;
    use shopfront_catalog::{NewCategory, ProductInput};

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    async fn category(store: &InMemoryStore, name: &str) -> Category {
        let c = Category::create(NewCategory {
            name: name.to_string(),
            description: String::new(),
        })
        .unwrap();
        store.create_category(&c).await.unwrap();
        c
    }

    async fn product(
        store: &InMemoryStore,
        name: &str,
        category: CategoryId,
        owner: UserId,
        status: ProductStatus,
    ) -> Product {
        let mut p = Product::create(
            ProductInput {
                name: name.to_string(),
                description: String::new(),
                photo: None,
                category_id: category,
                price: 1,
                created_at: None,
                updated_at: None,
            },
            owner,
            day(),
        )
        .unwrap();
        p.status = status;
        store.create_product(&p).await.unwrap();
        p
    }

    fn user(email: &str) -> User {
        User::register(
            Registration {
                email: email.to_string(),
                password: "pw".to_string(),
                password_confirmation: "pw".to_string(),
            },
            Utc::now(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn duplicate_email_conflicts() {
        let store = InMemoryStore::new();
        store.create_user(&user("a@example.com")).await.unwrap();
        let err = store.create_user(&user("a@example.com")).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn listing_is_published_plus_own() {
        let store = InMemoryStore::new();
        let c = category(&store, "Phones").await;
        let me = UserId::new();
        let other = UserId::new();
        let published = product(&store, "B", c.id, other, ProductStatus::Published).await;
        let mine = product(&store, "A", c.id, me, ProductStatus::Draft).await;
        product(&store, "C", c.id, other, ProductStatus::Draft).await;

        let anon = store.list_products(ProductFilter::default()).await.unwrap();
        assert_eq!(anon, vec![published.clone()]);

        let own = store
            .list_products(ProductFilter {
                viewer: Some(me),
                category: None,
            })
            .await
            .unwrap();
        assert_eq!(own, vec![mine, published]);
    }

    #[tokio::test]
    async fn deleting_category_cascades() {
        let store = InMemoryStore::new();
        let phones = category(&store, "Phones").await;
        let books = category(&store, "Books").await;
        let owner = UserId::new();
        let p = product(&store, "Phone", phones.id, owner, ProductStatus::Published).await;
        let b = product(&store, "Book", books.id, owner, ProductStatus::Published).await;

        store.delete_category(phones.id).await.unwrap();

        assert_eq!(store.get_product(p.id).await.unwrap(), None);
        assert!(store.get_product(b.id).await.unwrap().is_some());
        assert_eq!(
            store.delete_category(phones.id).await.unwrap_err(),
            StoreError::NotFound
        );
    }

    #[tokio::test]
    async fn set_status_touches_only_status() {
        let store = InMemoryStore::new();
        let c = category(&store, "Phones").await;
        let p = product(&store, "Phone", c.id, UserId::new(), ProductStatus::Published).await;

        store.set_status(p.id, ProductStatus::Draft).await.unwrap();

        let stored = store.get_product(p.id).await.unwrap().unwrap();
        assert_eq!(stored.status, ProductStatus::Draft);
        assert_eq!(Product { status: p.status, ..stored }, p);
    }

    #[tokio::test]
    async fn view_counter_increments_by_one() {
        let store = InMemoryStore::new();
        let post = BlogPost::create(
            BlogPostInput {
                title: "T".to_string(),
                content: "C".to_string(),
                preview: None,
                is_published: true,
            },
            Utc::now(),
        )
        .unwrap();
        store.create_post(&post).await.unwrap();

        assert_eq!(store.increment_views(post.id).await.unwrap(), 1);
        assert_eq!(store.increment_views(post.id).await.unwrap(), 2);
        assert_eq!(
            store.increment_views(BlogPostId::new()).await.unwrap_err(),
            StoreError::NotFound
        );
    }

    #[tokio::test]
    async fn ownership_goes_to_the_first_claimant() {
        let store = InMemoryStore::new();
        let c = category(&store, "Phones").await;
        let mut p = Product::create(
            ProductInput {
                name: "Legacy".to_string(),
                description: String::new(),
                photo: None,
                category_id: c.id,
                price: 1,
                created_at: None,
                updated_at: None,
            },
            UserId::new(),
            day(),
        )
        .unwrap();
        p.owner = None;
        store.create_product(&p).await.unwrap();
        let (first, second) = (UserId::new(), UserId::new());

        assert!(store.claim_ownerless(p.id, first).await.unwrap());
        assert!(!store.claim_ownerless(p.id, second).await.unwrap());
        assert!(!store.claim_ownerless(ProductId::new(), second).await.unwrap());

        let stored = store.get_product(p.id).await.unwrap().unwrap();
        assert_eq!(stored.owner, Some(first));
    }

    #[tokio::test]
    async fn update_never_rewrites_the_owner() {
        let store = InMemoryStore::new();
        let c = category(&store, "Phones").await;
        let owner = UserId::new();
        let mut stale = product(&store, "Phone", c.id, owner, ProductStatus::Draft).await;

        stale.owner = Some(UserId::new());
        stale.name = "Phone 2".to_string();
        store.update_product(&stale).await.unwrap();

        let stored = store.get_product(stale.id).await.unwrap().unwrap();
        assert_eq!(stored.name, "Phone 2");
        assert_eq!(stored.owner, Some(owner));
    }

    #[tokio::test]
    async fn expired_sessions_are_pruned() {
        let store = InMemoryStore::new();
        let now = Utc::now();
        let session = |created_at: DateTime<Utc>, ttl: Duration| Session {
            id: SessionId::new(),
            user_id: UserId::new(),
            created_at,
            expires_at: created_at + ttl,
        };
        let expired = session(now - Duration::hours(2), Duration::hours(1));
        let live = session(now, Duration::hours(1));
        store.create_session(&expired).await.unwrap();
        store.create_session(&live).await.unwrap();

        assert_eq!(store.prune_expired_sessions(now).await.unwrap(), 1);
        assert_eq!(store.get_session(expired.id).await.unwrap(), None);
        assert_eq!(store.get_session(live.id).await.unwrap(), Some(live));
        assert_eq!(store.prune_expired_sessions(now).await.unwrap(), 0);
    }
}
