use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use shopfront_core::CategoryId;

use crate::app::dto::{CategoryList, CategoryProducts};
use crate::app::errors;
use crate::app::routes::products::visible_products;
use crate::app::services::AppServices;
use crate::context::ViewerContext;

pub async fn list_categories(Extension(services): Extension<Arc<AppServices>>) -> Response {
    match services.categories.list_categories().await {
        Ok(items) => (StatusCode::OK, Json(CategoryList::from(items))).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

/// A category with the products the viewer may see in it.
pub async fn category_products(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(viewer): Extension<ViewerContext>,
    Path(id): Path<String>,
) -> Response {
    let id: CategoryId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let category = match services.categories.get_category(id).await {
        Ok(Some(c)) => c,
        Ok(None) => return errors::not_found("category"),
        Err(e) => return errors::store_error_to_response(e),
    };

    match visible_products(&services, viewer.actor(), Some(id)).await {
        Ok(items) => (StatusCode::OK, Json(CategoryProducts { category, items })).into_response(),
        Err(resp) => resp,
    }
}
