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

use shopfront_auth::policy;
use shopfront_blog::{BlogPost, BlogPostInput};
use shopfront_core::BlogPostId;

use crate::app::dto::BlogPostList;
use crate::app::errors;
use crate::app::services::AppServices;
use crate::context::ViewerContext;

pub async fn list_posts(Extension(services): Extension<Arc<AppServices>>) -> Response {
    match services.blog.list_published_posts().await {
        Ok(mut items) => {
            items.retain(|p| policy::blog_listed(&p.target()));
            (StatusCode::OK, Json(BlogPostList::from(items))).into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}

/// Every successful read counts one view, published or not.
pub async fn get_post(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(viewer): Extension<ViewerContext>,
    Path(id): Path<String>,
) -> Response {
    if let Err(denial) = policy::view_blog_post(viewer.actor()).check() {
        return errors::denial_to_response(denial);
    }
    let id: BlogPostId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    if let Err(e) = services.blog.increment_views(id).await {
        return errors::store_error_to_response(e);
    }

    match services.blog.get_post(id).await {
        Ok(Some(post)) => (StatusCode::OK, Json(post)).into_response(),
        Ok(None) => errors::not_found("blog post"),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn create_post(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(viewer): Extension<ViewerContext>,
    Json(body): Json<BlogPostInput>,
) -> Response {
    if let Err(denial) = policy::manage_blog(viewer.actor()).check() {
        return errors::denial_to_response(denial);
    }

    let post = match BlogPost::create(body, Utc::now()) {
        Ok(p) => p,
        Err(e) => return errors::domain_error_to_response(e),
    };
    if let Err(e) = services.blog.create_post(&post).await {
        return errors::store_error_to_response(e);
    }

    info!(post_id = %post.id, "blog post created");
    (StatusCode::CREATED, Json(post)).into_response()
}

pub async fn edit_post(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(viewer): Extension<ViewerContext>,
    Path(id): Path<String>,
    Json(body): Json<BlogPostInput>,
) -> Response {
    if let Err(denial) = policy::manage_blog(viewer.actor()).check() {
        return errors::denial_to_response(denial);
    }
    let id: BlogPostId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let mut post = match services.blog.get_post(id).await {
        Ok(Some(p)) => p,
        Ok(None) => return errors::not_found("blog post"),
        Err(e) => return errors::store_error_to_response(e),
    };
    if let Err(e) = post.apply(body) {
        return errors::domain_error_to_response(e);
    }
    if let Err(e) = services.blog.update_post(&post).await {
        return errors::store_error_to_response(e);
    }

    info!(post_id = %id, "blog post updated");
    (StatusCode::OK, Json(post)).into_response()
}

pub async fn delete_post(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(viewer): Extension<ViewerContext>,
    Path(id): Path<String>,
) -> Response {
    if let Err(denial) = policy::manage_blog(viewer.actor()).check() {
        return errors::denial_to_response(denial);
    }
    let id: BlogPostId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.blog.delete_post(id).await {
        Ok(()) => {
            info!(post_id = %id, "blog post deleted");
            (StatusCode::OK, Json(json!({ "id": id, "deleted": true }))).into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}
