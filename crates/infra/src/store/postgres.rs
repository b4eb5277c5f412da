//! Postgres-backed stores.
//!
//! One [`PostgresStore`] implements every store trait over a shared pool.
//! SQLx errors are mapped through [`map_sqlx_error`].

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use tracing::instrument;
use uuid::Uuid;

use shopfront_auth::{Group, PasswordHash, User};
use shopfront_blog::BlogPost;
use shopfront_catalog::{Category, Product, ProductStatus};
use shopfront_core::{BlogPostId, CategoryId, ProductId, SessionId, UserId};

use super::{
    BlogStore, CategoryStore, ProductFilter, ProductStore, Session, SessionStore, StoreResult,
    UserStore,
};
use crate::error::map_sqlx_error;
use crate::StoreError;

#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: Arc<PgPool>,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    pub async fn connect(url: &str, max_connections: u32) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }

    pub async fn run_migrations(&self) -> StoreResult<()> {
        sqlx::migrate!("./migrations")
            .run(&*self.pool)
            .await
            .map_err(|e| StoreError::backend(format!("migrations failed: {e}")))
    }

    pub async fn health_check(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1")
            .execute(&*self.pool)
            .await
            .map(|_| ())
            .map_err(|e| map_sqlx_error("health_check", e))
    }

    fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn affected_one(rows: u64) -> StoreResult<()> {
    if rows == 0 {
        Err(StoreError::NotFound)
    } else {
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Row mapping
// ─────────────────────────────────────────────────────────────────────────────

const USER_COLUMNS: &str = r#"
    u.id, u.email, u.password_hash, u.first_name, u.last_name, u.phone_number,
    u.country, u.avatar, u.is_superuser, u.is_active, u.date_joined,
    COALESCE(
        ARRAY_AGG(g.group_name ORDER BY g.group_name) FILTER (WHERE g.group_name IS NOT NULL),
        '{}'
    ) AS groups
"#;

fn user_from_row(row: &PgRow) -> Result<User, sqlx::Error> {
    let groups: Vec<String> = row.try_get("groups")?;
    Ok(User {
        id: UserId::from_uuid(row.try_get::<Uuid, _>("id")?),
        email: row.try_get("email")?,
        password_hash: PasswordHash::from_stored(row.try_get::<String, _>("password_hash")?),
        first_name: row.try_get("first_name")?,
        last_name: row.try_get("last_name")?,
        phone_number: row.try_get("phone_number")?,
        country: row.try_get("country")?,
        avatar: row.try_get("avatar")?,
        groups: groups.into_iter().map(Group::new).collect(),
        is_superuser: row.try_get("is_superuser")?,
        is_active: row.try_get("is_active")?,
        date_joined: row.try_get("date_joined")?,
    })
}

fn category_from_row(row: &PgRow) -> Result<Category, sqlx::Error> {
    Ok(Category {
        id: CategoryId::from_uuid(row.try_get::<Uuid, _>("id")?),
        name: row.try_get("name")?,
        description: row.try_get("description")?,
    })
}

fn product_from_row(row: &PgRow) -> Result<Product, sqlx::Error> {
    let status: String = row.try_get("status")?;
    let status = ProductStatus::parse(&status).map_err(|e| sqlx::Error::ColumnDecode {
        index: "status".to_string(),
        source: Box::new(e),
    })?;
    Ok(Product {
        id: ProductId::from_uuid(row.try_get::<Uuid, _>("id")?),
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        photo: row.try_get("photo")?,
        category_id: CategoryId::from_uuid(row.try_get::<Uuid, _>("category_id")?),
        price: row.try_get("price")?,
        owner: row
            .try_get::<Option<Uuid>, _>("owner_id")?
            .map(UserId::from_uuid),
        status,
        created_at: row.try_get::<NaiveDate, _>("created_at")?,
        updated_at: row.try_get::<NaiveDate, _>("updated_at")?,
    })
}

fn post_from_row(row: &PgRow) -> Result<BlogPost, sqlx::Error> {
    let views: i64 = row.try_get("views_count")?;
    Ok(BlogPost {
        id: BlogPostId::from_uuid(row.try_get::<Uuid, _>("id")?),
        title: row.try_get("title")?,
        content: row.try_get("content")?,
        preview: row.try_get("preview")?,
        is_published: row.try_get("is_published")?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
        views_count: u64::try_from(views).unwrap_or_default(),
    })
}

fn session_from_row(row: &PgRow) -> Result<Session, sqlx::Error> {
    Ok(Session {
        id: SessionId::from_uuid(row.try_get::<Uuid, _>("id")?),
        user_id: UserId::from_uuid(row.try_get::<Uuid, _>("user_id")?),
        created_at: row.try_get("created_at")?,
        expires_at: row.try_get("expires_at")?,
    })
}

fn decode<T>(
    operation: &str,
    row: Option<PgRow>,
    f: fn(&PgRow) -> Result<T, sqlx::Error>,
) -> StoreResult<Option<T>> {
    row.map(|r| f(&r))
        .transpose()
        .map_err(|e| map_sqlx_error(operation, e))
}

fn decode_all<T>(
    operation: &str,
    rows: Vec<PgRow>,
    f: fn(&PgRow) -> Result<T, sqlx::Error>,
) -> StoreResult<Vec<T>> {
    rows.iter()
        .map(f)
        .collect::<Result<_, _>>()
        .map_err(|e| map_sqlx_error(operation, e))
}

// ─────────────────────────────────────────────────────────────────────────────
// Users
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait::async_trait]
impl UserStore for PostgresStore {
    #[instrument(skip(self, user), fields(user_id = %user.id), err)]
    async fn create_user(&self, user: &User) -> StoreResult<()> {
        let mut tx = self
            .pool()
            .begin()
            .await
            .map_err(|e| map_sqlx_error("create_user", e))?;

        sqlx::query(
            r#"
            INSERT INTO users (
                id, email, password_hash, first_name, last_name, phone_number,
                country, avatar, is_superuser, is_active, date_joined
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(user.id.as_uuid())
        .bind(&user.email)
        .bind(user.password_hash.as_str())
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.phone_number)
        .bind(&user.country)
        .bind(&user.avatar)
        .bind(user.is_superuser)
        .bind(user.is_active)
        .bind(user.date_joined)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("create_user", e))?;

        for group in &user.groups {
            sqlx::query("INSERT INTO user_groups (user_id, group_name) VALUES ($1, $2)")
                .bind(user.id.as_uuid())
                .bind(group.as_str())
                .execute(&mut *tx)
                .await
                .map_err(|e| map_sqlx_error("create_user", e))?;
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("create_user", e))
    }

    async fn get_user(&self, id: UserId) -> StoreResult<Option<User>> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users u \
             LEFT JOIN user_groups g ON g.user_id = u.id \
             WHERE u.id = $1 GROUP BY u.id"
        );
        let row = sqlx::query(&sql)
            .bind(id.as_uuid())
            .fetch_optional(self.pool())
            .await
            .map_err(|e| map_sqlx_error("get_user", e))?;
        decode("get_user", row, user_from_row)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users u \
             LEFT JOIN user_groups g ON g.user_id = u.id \
             WHERE u.email = $1 GROUP BY u.id"
        );
        let row = sqlx::query(&sql)
            .bind(email)
            .fetch_optional(self.pool())
            .await
            .map_err(|e| map_sqlx_error("find_user_by_email", e))?;
        decode("find_user_by_email", row, user_from_row)
    }

    async fn update_profile(&self, user: &User) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET first_name = $2, last_name = $3, phone_number = $4, country = $5, avatar = $6
            WHERE id = $1
            "#,
        )
        .bind(user.id.as_uuid())
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.phone_number)
        .bind(&user.country)
        .bind(&user.avatar)
        .execute(self.pool())
        .await
        .map_err(|e| map_sqlx_error("update_profile", e))?;
        affected_one(result.rows_affected())
    }

    async fn add_to_group(&self, id: UserId, group: &Group) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO user_groups (user_id, group_name) VALUES ($1, $2)
            ON CONFLICT (user_id, group_name) DO NOTHING
            "#,
        )
        .bind(id.as_uuid())
        .bind(group.as_str())
        .execute(self.pool())
        .await
        .map(|_| ())
        .map_err(|e| match map_sqlx_error("add_to_group", e) {
            StoreError::MissingReference(_) => StoreError::NotFound,
            other => other,
        })
    }

    async fn remove_from_group(&self, id: UserId, group: &Group) -> StoreResult<()> {
        if self.get_user(id).await?.is_none() {
            return Err(StoreError::NotFound);
        }
        sqlx::query("DELETE FROM user_groups WHERE user_id = $1 AND group_name = $2")
            .bind(id.as_uuid())
            .bind(group.as_str())
            .execute(self.pool())
            .await
            .map(|_| ())
            .map_err(|e| map_sqlx_error("remove_from_group", e))
    }

    async fn set_superuser(&self, id: UserId, is_superuser: bool) -> StoreResult<()> {
        let result = sqlx::query("UPDATE users SET is_superuser = $2 WHERE id = $1")
            .bind(id.as_uuid())
            .bind(is_superuser)
            .execute(self.pool())
            .await
            .map_err(|e| map_sqlx_error("set_superuser", e))?;
        affected_one(result.rows_affected())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Catalog
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait::async_trait]
impl CategoryStore for PostgresStore {
    async fn create_category(&self, category: &Category) -> StoreResult<()> {
        sqlx::query("INSERT INTO categories (id, name, description) VALUES ($1, $2, $3)")
            .bind(category.id.as_uuid())
            .bind(&category.name)
            .bind(&category.description)
            .execute(self.pool())
            .await
            .map(|_| ())
            .map_err(|e| map_sqlx_error("create_category", e))
    }

    async fn get_category(&self, id: CategoryId) -> StoreResult<Option<Category>> {
        let row = sqlx::query("SELECT id, name, description FROM categories WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(self.pool())
            .await
            .map_err(|e| map_sqlx_error("get_category", e))?;
        decode("get_category", row, category_from_row)
    }

    async fn list_categories(&self) -> StoreResult<Vec<Category>> {
        let rows = sqlx::query("SELECT id, name, description FROM categories ORDER BY name, id")
            .fetch_all(self.pool())
            .await
            .map_err(|e| map_sqlx_error("list_categories", e))?;
        decode_all("list_categories", rows, category_from_row)
    }

    #[instrument(skip(self), fields(category_id = %id), err)]
    async fn delete_category(&self, id: CategoryId) -> StoreResult<()> {
        // products.category_id is ON DELETE CASCADE.
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id.as_uuid())
            .execute(self.pool())
            .await
            .map_err(|e| map_sqlx_error("delete_category", e))?;
        affected_one(result.rows_affected())
    }
}

const PRODUCT_COLUMNS: &str = "p.id, p.name, p.description, p.photo, p.category_id, p.price, \
                               p.owner_id, p.status, p.created_at, p.updated_at";

#[async_trait::async_trait]
impl ProductStore for PostgresStore {
    async fn create_product(&self, product: &Product) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO products (
                id, name, description, photo, category_id, price,
                owner_id, status, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(product.id.as_uuid())
        .bind(&product.name)
        .bind(&product.description)
        .bind(&product.photo)
        .bind(product.category_id.as_uuid())
        .bind(product.price)
        .bind(product.owner.map(Uuid::from))
        .bind(product.status.as_str())
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(self.pool())
        .await
        .map(|_| ())
        .map_err(|e| map_sqlx_error("create_product", e))
    }

    async fn get_product(&self, id: ProductId) -> StoreResult<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products p WHERE p.id = $1");
        let row = sqlx::query(&sql)
            .bind(id.as_uuid())
            .fetch_optional(self.pool())
            .await
            .map_err(|e| map_sqlx_error("get_product", e))?;
        decode("get_product", row, product_from_row)
    }

    async fn list_products(&self, filter: ProductFilter) -> StoreResult<Vec<Product>> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products p \
             JOIN categories c ON c.id = p.category_id \
             WHERE (p.status = 'published' OR ($1::uuid IS NOT NULL AND p.owner_id = $1)) \
               AND ($2::uuid IS NULL OR p.category_id = $2) \
             ORDER BY p.name, c.name, p.id"
        );
        let rows = sqlx::query(&sql)
            .bind(filter.viewer.map(Uuid::from))
            .bind(filter.category.map(Uuid::from))
            .fetch_all(self.pool())
            .await
            .map_err(|e| map_sqlx_error("list_products", e))?;
        decode_all("list_products", rows, product_from_row)
    }

    async fn update_product(&self, product: &Product) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE products
            SET name = $2, description = $3, photo = $4, category_id = $5, price = $6,
                created_at = $7, updated_at = $8
            WHERE id = $1
            "#,
        )
        .bind(product.id.as_uuid())
        .bind(&product.name)
        .bind(&product.description)
        .bind(&product.photo)
        .bind(product.category_id.as_uuid())
        .bind(product.price)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(self.pool())
        .await
        .map_err(|e| map_sqlx_error("update_product", e))?;
        affected_one(result.rows_affected())
    }

    #[instrument(skip(self), fields(product_id = %id, owner = %owner), err)]
    async fn claim_ownerless(&self, id: ProductId, owner: UserId) -> StoreResult<bool> {
        let result =
            sqlx::query("UPDATE products SET owner_id = $2 WHERE id = $1 AND owner_id IS NULL")
                .bind(id.as_uuid())
                .bind(owner.as_uuid())
                .execute(self.pool())
                .await
                .map_err(|e| map_sqlx_error("claim_ownerless", e))?;
        Ok(result.rows_affected() == 1)
    }

    #[instrument(skip(self), fields(product_id = %id, status = %status), err)]
    async fn set_status(&self, id: ProductId, status: ProductStatus) -> StoreResult<()> {
        let result = sqlx::query("UPDATE products SET status = $2 WHERE id = $1")
            .bind(id.as_uuid())
            .bind(status.as_str())
            .execute(self.pool())
            .await
            .map_err(|e| map_sqlx_error("set_status", e))?;
        affected_one(result.rows_affected())
    }

    async fn delete_product(&self, id: ProductId) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id.as_uuid())
            .execute(self.pool())
            .await
            .map_err(|e| map_sqlx_error("delete_product", e))?;
        affected_one(result.rows_affected())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Blog
// ─────────────────────────────────────────────────────────────────────────────

const POST_COLUMNS: &str =
    "id, title, content, preview, is_published, created_at, views_count";

#[async_trait::async_trait]
impl BlogStore for PostgresStore {
    async fn create_post(&self, post: &BlogPost) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO blog_posts (id, title, content, preview, is_published, created_at, views_count)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(post.id.as_uuid())
        .bind(&post.title)
        .bind(&post.content)
        .bind(&post.preview)
        .bind(post.is_published)
        .bind(post.created_at)
        .bind(i64::try_from(post.views_count).unwrap_or(i64::MAX))
        .execute(self.pool())
        .await
        .map(|_| ())
        .map_err(|e| map_sqlx_error("create_post", e))
    }

    async fn get_post(&self, id: BlogPostId) -> StoreResult<Option<BlogPost>> {
        let sql = format!("SELECT {POST_COLUMNS} FROM blog_posts WHERE id = $1");
        let row = sqlx::query(&sql)
            .bind(id.as_uuid())
            .fetch_optional(self.pool())
            .await
            .map_err(|e| map_sqlx_error("get_post", e))?;
        decode("get_post", row, post_from_row)
    }

    async fn list_published_posts(&self) -> StoreResult<Vec<BlogPost>> {
        let sql = format!(
            "SELECT {POST_COLUMNS} FROM blog_posts WHERE is_published \
             ORDER BY created_at DESC, id DESC"
        );
        let rows = sqlx::query(&sql)
            .fetch_all(self.pool())
            .await
            .map_err(|e| map_sqlx_error("list_published_posts", e))?;
        decode_all("list_published_posts", rows, post_from_row)
    }

    async fn update_post(&self, post: &BlogPost) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE blog_posts
            SET title = $2, content = $3, preview = $4, is_published = $5
            WHERE id = $1
            "#,
        )
        .bind(post.id.as_uuid())
        .bind(&post.title)
        .bind(&post.content)
        .bind(&post.preview)
        .bind(post.is_published)
        .execute(self.pool())
        .await
        .map_err(|e| map_sqlx_error("update_post", e))?;
        affected_one(result.rows_affected())
    }

    async fn delete_post(&self, id: BlogPostId) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM blog_posts WHERE id = $1")
            .bind(id.as_uuid())
            .execute(self.pool())
            .await
            .map_err(|e| map_sqlx_error("delete_post", e))?;
        affected_one(result.rows_affected())
    }

    async fn increment_views(&self, id: BlogPostId) -> StoreResult<u64> {
        let row = sqlx::query(
            "UPDATE blog_posts SET views_count = views_count + 1 WHERE id = $1 RETURNING views_count",
        )
        .bind(id.as_uuid())
        .fetch_optional(self.pool())
        .await
        .map_err(|e| map_sqlx_error("increment_views", e))?
        .ok_or(StoreError::NotFound)?;

        let views: i64 = row
            .try_get("views_count")
            .map_err(|e| map_sqlx_error("increment_views", e))?;
        Ok(u64::try_from(views).unwrap_or_default())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Sessions
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait::async_trait]
impl SessionStore for PostgresStore {
    async fn create_session(&self, session: &Session) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO sessions (id, user_id, created_at, expires_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(session.id.as_uuid())
        .bind(session.user_id.as_uuid())
        .bind(session.created_at)
        .bind(session.expires_at)
        .execute(self.pool())
        .await
        .map(|_| ())
        .map_err(|e| map_sqlx_error("create_session", e))
    }

    async fn get_session(&self, id: SessionId) -> StoreResult<Option<Session>> {
        let row = sqlx::query(
            "SELECT id, user_id, created_at, expires_at FROM sessions WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(self.pool())
        .await
        .map_err(|e| map_sqlx_error("get_session", e))?;
        decode("get_session", row, session_from_row)
    }

    async fn delete_session(&self, id: SessionId) -> StoreResult<()> {
        sqlx::query("DELETE FROM sessions WHERE id = $1")
            .bind(id.as_uuid())
            .execute(self.pool())
            .await
            .map(|_| ())
            .map_err(|e| map_sqlx_error("delete_session", e))
    }

    async fn prune_expired_sessions(&self, now: DateTime<Utc>) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= $1")
            .bind(now)
            .execute(self.pool())
            .await
            .map_err(|e| map_sqlx_error("prune_expired_sessions", e))?;
        Ok(result.rows_affected())
    }
}
