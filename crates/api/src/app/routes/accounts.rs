use std::sync::Arc;

use axum::{
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde_json::json;
use tracing::{error, info};

use shopfront_auth::{normalize_email, Denial, ProfileUpdate, Registration, User};
use shopfront_infra::{send_best_effort, Message, StoreError};

use crate::app::dto::{ActorView, LoginRequest, ProfileView, SessionResponse};
use crate::app::errors;
use crate::app::services::AppServices;
use crate::context::ViewerContext;

fn session_response(status: StatusCode, token: String, user: &User) -> Response {
    let body = SessionResponse {
        token,
        user: ActorView::from(&user.to_actor()),
    };
    (status, Json(body)).into_response()
}

fn session_failure(e: impl std::fmt::Display) -> Response {
    error!(error = %e, "failed to start session");
    errors::json_error(
        StatusCode::INTERNAL_SERVER_ERROR,
        "session_error",
        "could not start session",
    )
}

/// Create an account, log it in, and send the welcome message.
pub async fn register(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<Registration>,
) -> Response {
    let user = match User::register(body, Utc::now()) {
        Ok(u) => u,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.users.create_user(&user).await {
        Ok(()) => {}
        Err(StoreError::Conflict(_)) => {
            return errors::json_error(
                StatusCode::CONFLICT,
                "conflict",
                "a user with this email already exists",
            );
        }
        Err(e) => return errors::store_error_to_response(e),
    }
    info!(user_id = %user.id, "user registered");

    let token = match services.start_session(&user).await {
        Ok(t) => t,
        Err(e) => return session_failure(e),
    };

    let welcome = Message::welcome(services.mail_from.clone(), user.email.clone());
    send_best_effort(services.notifier.as_ref(), &welcome).await;

    session_response(StatusCode::CREATED, token, &user)
}

pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<LoginRequest>,
) -> Response {
    let email = normalize_email(&body.email);
    let user = match services.users.find_user_by_email(&email).await {
        Ok(u) => u,
        Err(e) => return errors::store_error_to_response(e),
    };

    let Some(user) = user.filter(|u| u.check_password(&body.password)) else {
        return errors::json_error(
            StatusCode::UNAUTHORIZED,
            "invalid_credentials",
            "invalid email or password",
        );
    };

    match services.start_session(&user).await {
        Ok(token) => session_response(StatusCode::OK, token, &user),
        Err(e) => session_failure(e),
    }
}

/// Ends the current session. Anonymous logout is a no-op.
pub async fn logout(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(viewer): Extension<ViewerContext>,
) -> Response {
    if let Some(sid) = viewer.session_id() {
        if let Err(e) = services.sessions.delete_session(sid).await {
            return errors::store_error_to_response(e);
        }
        info!(session_id = %sid, "session ended");
    }
    (StatusCode::OK, Json(json!({ "logged_out": true }))).into_response()
}

async fn current_user(services: &AppServices, viewer: &ViewerContext) -> Result<User, Response> {
    let Some(id) = viewer.user_id() else {
        return Err(errors::denial_to_response(Denial::Unauthenticated));
    };
    services
        .users
        .get_user(id)
        .await
        .map_err(errors::store_error_to_response)?
        .ok_or_else(|| errors::denial_to_response(Denial::Unauthenticated))
}

pub async fn profile(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(viewer): Extension<ViewerContext>,
) -> Response {
    match current_user(&services, &viewer).await {
        Ok(user) => (StatusCode::OK, Json(ProfileView::from(&user))).into_response(),
        Err(resp) => resp,
    }
}

pub async fn update_profile(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(viewer): Extension<ViewerContext>,
    Json(body): Json<ProfileUpdate>,
) -> Response {
    let mut user = match current_user(&services, &viewer).await {
        Ok(u) => u,
        Err(resp) => return resp,
    };
    if let Err(e) = user.apply_profile(body) {
        return errors::domain_error_to_response(e);
    }
    if let Err(e) = services.users.update_profile(&user).await {
        return errors::store_error_to_response(e);
    }

    info!(user_id = %user.id, "profile updated");
    (StatusCode::OK, Json(ProfileView::from(&user))).into_response()
}
