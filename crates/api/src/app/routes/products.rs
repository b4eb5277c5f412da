use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde_json::json;
use tracing::info;

use shopfront_auth::{policy, Actor, Decision};
use shopfront_catalog::{moderation, Product, ProductInput};
use shopfront_core::{CategoryId, ProductId};
use shopfront_infra::store::ProductFilter;

use crate::app::dto::ProductList;
use crate::app::errors;
use crate::app::services::AppServices;
use crate::context::ViewerContext;

const PRODUCT_LIST: &str = "product_list";
const PRODUCT_DETAIL: &str = "product_detail";

/// Candidate rows from the store, narrowed by the listing policy.
pub(crate) async fn visible_products(
    services: &AppServices,
    viewer: Option<&Actor>,
    category: Option<CategoryId>,
) -> Result<Vec<Product>, Response> {
    let filter = ProductFilter {
        viewer: viewer.map(|a| a.user_id),
        category,
    };
    let mut products = services
        .products
        .list_products(filter)
        .await
        .map_err(errors::store_error_to_response)?;
    products.retain(|p| policy::product_listed(viewer, &p.target()));
    Ok(products)
}

async fn load(services: &AppServices, id: ProductId) -> Result<Product, Response> {
    services
        .products
        .get_product(id)
        .await
        .map_err(errors::store_error_to_response)?
        .ok_or_else(|| errors::not_found("product"))
}

async fn ensure_category(services: &AppServices, id: CategoryId) -> Result<(), Response> {
    let found = services
        .categories
        .get_category(id)
        .await
        .map_err(errors::store_error_to_response)?;
    match found {
        Some(_) => Ok(()),
        None => Err(errors::field_error("category_id", "select a valid category")),
    }
}

fn require_actor(viewer: &ViewerContext) -> Result<&Actor, Response> {
    viewer
        .actor()
        .ok_or_else(|| errors::denial_to_response(shopfront_auth::Denial::Unauthenticated))
}

/// Home page: published products only, whoever asks.
pub async fn home(Extension(services): Extension<Arc<AppServices>>) -> Response {
    match visible_products(&services, None, None).await {
        Ok(items) => (StatusCode::OK, Json(ProductList::from(items))).into_response(),
        Err(resp) => resp,
    }
}

/// Published products plus the viewer's own, through the listing cache.
pub async fn list_products(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(viewer): Extension<ViewerContext>,
) -> Response {
    let result = services
        .listing_cache
        .get_or_compute(PRODUCT_LIST, viewer.user_id(), || {
            visible_products(&services, viewer.actor(), None)
        })
        .await;

    match result {
        Ok(items) => (StatusCode::OK, Json(ProductList::from(items))).into_response(),
        Err(resp) => resp,
    }
}

pub async fn get_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(viewer): Extension<ViewerContext>,
    Path(id): Path<String>,
) -> Response {
    if let Decision::Deny(denial) = policy::view_product(viewer.actor()) {
        return errors::denial_to_response(denial);
    }
    let id: ProductId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let listing = format!("{PRODUCT_DETAIL}:{id}");
    let result = services
        .detail_cache
        .get_or_compute(&listing, viewer.user_id(), || load(&services, id))
        .await;

    match result {
        Ok(product) => (StatusCode::OK, Json(product)).into_response(),
        Err(resp) => resp,
    }
}

pub async fn create_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(viewer): Extension<ViewerContext>,
    Json(body): Json<ProductInput>,
) -> Response {
    if let Decision::Deny(denial) = policy::create_product(viewer.actor()) {
        return errors::denial_to_response(denial);
    }
    let actor = match require_actor(&viewer) {
        Ok(a) => a,
        Err(resp) => return resp,
    };

    let category_id = body.category_id;
    let product = match Product::create(body, actor.user_id, Utc::now().date_naive()) {
        Ok(p) => p,
        Err(e) => return errors::domain_error_to_response(e),
    };
    if let Err(resp) = ensure_category(&services, category_id).await {
        return resp;
    }

    if let Err(e) = services.products.create_product(&product).await {
        return errors::store_error_to_response(e);
    }

    info!(product_id = %product.id, owner = %actor.user_id, "product created");
    (StatusCode::CREATED, Json(product)).into_response()
}

/// Load the product and run the edit policy, persisting an ownership claim
/// when the product has no owner yet.
async fn authorize_edit(
    services: &AppServices,
    viewer: &ViewerContext,
    raw_id: &str,
) -> Result<Product, Response> {
    let actor = require_actor(viewer)?;
    let id: ProductId = errors::parse_id(raw_id)?;
    let mut product = load(services, id).await?;

    match policy::edit_product(Some(actor), &product.target()) {
        Decision::Allow => {}
        Decision::AllowClaimingOwnership => {
            let claimed = services
                .products
                .claim_ownerless(id, actor.user_id)
                .await
                .map_err(errors::store_error_to_response)?;
            if claimed {
                product.owner = Some(actor.user_id);
                info!(product_id = %id, owner = %actor.user_id, "ownerless product claimed");
            } else {
                // Someone else claimed it first; judge against the stored owner.
                product = load(services, id).await?;
                if let Decision::Deny(denial) = policy::edit_product(Some(actor), &product.target()) {
                    return Err(errors::denial_to_response(denial));
                }
            }
        }
        Decision::Deny(denial) => return Err(errors::denial_to_response(denial)),
    }

    Ok(product)
}

/// Edit form data. Like the submit, this claims an ownerless product.
pub async fn edit_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(viewer): Extension<ViewerContext>,
    Path(id): Path<String>,
) -> Response {
    match authorize_edit(&services, &viewer, &id).await {
        Ok(product) => (StatusCode::OK, Json(product)).into_response(),
        Err(resp) => resp,
    }
}

pub async fn update_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(viewer): Extension<ViewerContext>,
    Path(id): Path<String>,
    Json(body): Json<ProductInput>,
) -> Response {
    let mut product = match authorize_edit(&services, &viewer, &id).await {
        Ok(p) => p,
        Err(resp) => return resp,
    };

    let category_id = body.category_id;
    if let Err(e) = product.apply(body, Utc::now().date_naive()) {
        return errors::domain_error_to_response(e);
    }
    if let Err(resp) = ensure_category(&services, category_id).await {
        return resp;
    }

    if let Err(e) = services.products.update_product(&product).await {
        return errors::store_error_to_response(e);
    }

    info!(product_id = %product.id, "product updated");
    (StatusCode::OK, Json(product)).into_response()
}

pub async fn delete_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(viewer): Extension<ViewerContext>,
    Path(id): Path<String>,
) -> Response {
    let actor = match require_actor(&viewer) {
        Ok(a) => a,
        Err(resp) => return resp,
    };
    let id: ProductId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let product = match load(&services, id).await {
        Ok(p) => p,
        Err(resp) => return resp,
    };

    if let Err(denial) = policy::delete_product(Some(actor), &product.target()).check() {
        return errors::denial_to_response(denial);
    }

    if let Err(e) = services.products.delete_product(id).await {
        return errors::store_error_to_response(e);
    }

    info!(product_id = %id, actor = %actor.user_id, "product deleted");
    (StatusCode::OK, Json(json!({ "id": id, "deleted": true }))).into_response()
}

/// Published -> Draft. Permission is checked before the product is looked up.
pub async fn unpublish_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(viewer): Extension<ViewerContext>,
    Path(id): Path<String>,
) -> Response {
    if let Err(denial) = policy::unpublish_product(viewer.actor()).check() {
        return errors::denial_to_response(denial);
    }
    let id: ProductId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let mut product = match load(&services, id).await {
        Ok(p) => p,
        Err(resp) => return resp,
    };

    let step = moderation::unpublish(product.status);
    if step.needs_write() {
        if let Err(e) = services.products.set_status(id, step.next_status()).await {
            return errors::store_error_to_response(e);
        }
        info!(product_id = %id, "product unpublished");
    }
    product.status = step.next_status();

    (StatusCode::OK, Json(product)).into_response()
}
