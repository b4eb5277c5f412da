use std::sync::Arc;

use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use tracing::error;

use crate::app::dto::ActorView;
use crate::app::errors;
use crate::app::services::AppServices;
use crate::context::ViewerContext;

pub async fn health(Extension(services): Extension<Arc<AppServices>>) -> StatusCode {
    match services.health_check().await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            error!(error = %e, "health check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

pub async fn whoami(Extension(viewer): Extension<ViewerContext>) -> axum::response::Response {
    match viewer.actor() {
        Some(actor) => (StatusCode::OK, Json(ActorView::from(actor))).into_response(),
        None => errors::denial_to_response(shopfront_auth::Denial::Unauthenticated),
    }
}
