use axum::{
    routing::{get, post},
    Router,
};

pub mod accounts;
pub mod blog;
pub mod categories;
pub mod products;
pub mod system;

/// Router for every endpoint behind the auth middleware.
///
/// Anonymous requests reach the handlers; each handler asks the access policy
/// whether the viewer may proceed.
pub fn router() -> Router {
    Router::new()
        .route("/", get(products::home))
        .route("/whoami", get(system::whoami))
        // accounts
        .route("/register", post(accounts::register))
        .route("/login", post(accounts::login))
        .route("/logout", post(accounts::logout))
        .route("/profile", get(accounts::profile).post(accounts::update_profile))
        // catalog
        .route("/products/", get(products::list_products))
        .route("/products/create", post(products::create_product))
        .route("/products/:id", get(products::get_product))
        .route(
            "/products/:id/update",
            get(products::edit_product).post(products::update_product),
        )
        .route("/products/:id/delete", post(products::delete_product))
        .route("/products/:id/unpublish", post(products::unpublish_product))
        .route("/categories/", get(categories::list_categories))
        .route("/categories/:id/", get(categories::category_products))
        // blog
        .route("/blog/", get(blog::list_posts))
        .route("/blog/create", post(blog::create_post))
        .route("/blog/:id/", get(blog::get_post))
        .route("/blog/:id/edit", post(blog::edit_post))
        .route("/blog/:id/delete", post(blog::delete_post))
}
