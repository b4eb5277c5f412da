//! HTTP application wiring (Axum router + service wiring).
//!
//! - `services.rs`: stores, caches, notifier and token issuer
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `dto.rs`: request/response DTOs
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{routing::get, Extension, Router};
use tower::ServiceBuilder;

use shopfront_infra::AppConfig;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

use services::{AppServices, ServiceError};

/// Build the full HTTP router from configuration (used by `main.rs`).
pub async fn build_app(config: &AppConfig) -> Result<Router, ServiceError> {
    let services = Arc::new(AppServices::from_config(config).await?);
    Ok(build_app_with_services(services))
}

/// Build the router around already-wired services.
pub fn build_app_with_services(services: Arc<AppServices>) -> Router {
    let viewer_routes = routes::router().layer(axum::middleware::from_fn_with_state(
        services.clone(),
        middleware::auth_middleware,
    ));

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(viewer_routes)
        .layer(ServiceBuilder::new().layer(Extension(services)))
}
