use serde::{Deserialize, Serialize};

use shopfront_auth::{Actor, Group, User};
use shopfront_blog::BlogPost;
use shopfront_catalog::{Category, Product};
use shopfront_core::UserId;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct ItemsResponse<T> {
    pub items: Vec<T>,
}

impl<T> From<Vec<T>> for ItemsResponse<T> {
    fn from(items: Vec<T>) -> Self {
        Self { items }
    }
}

pub type ProductList = ItemsResponse<Product>;
pub type CategoryList = ItemsResponse<Category>;
pub type BlogPostList = ItemsResponse<BlogPost>;

#[derive(Debug, Serialize)]
pub struct CategoryProducts {
    pub category: Category,
    pub items: Vec<Product>,
}

/// The current actor plus the role flags the UI needs.
#[derive(Debug, Serialize)]
pub struct ActorView {
    pub id: UserId,
    pub email: String,
    pub groups: Vec<Group>,
    pub is_superuser: bool,
    pub is_product_moderator: bool,
    pub is_content_manager: bool,
}

impl From<&Actor> for ActorView {
    fn from(actor: &Actor) -> Self {
        Self {
            id: actor.user_id,
            email: actor.email.clone(),
            groups: actor.groups.clone(),
            is_superuser: actor.is_superuser,
            is_product_moderator: actor.is_product_moderator(),
            is_content_manager: actor.is_content_manager(),
        }
    }
}

/// Returned by register and login.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub token: String,
    pub user: ActorView,
}

#[derive(Debug, Serialize)]
pub struct ProfileView {
    pub id: UserId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: Option<String>,
    pub country: Option<String>,
    pub avatar: Option<String>,
}

impl From<&User> for ProfileView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            phone_number: user.phone_number.clone(),
            country: user.country.clone(),
            avatar: user.avatar.clone(),
        }
    }
}
