use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use tracing::{debug, error};

use shopfront_core::{SessionId, UserId};

use crate::app::errors::json_error;
use crate::app::services::AppServices;
use crate::context::ViewerContext;

/// Resolve the bearer token (if any) into a [`ViewerContext`].
///
/// No `Authorization` header means an anonymous viewer. A header that does not
/// resolve to a live session of an active user is rejected with 401.
pub async fn auth_middleware(
    State(services): State<Arc<AppServices>>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let viewer = match extract_bearer(req.headers()) {
        Ok(None) => ViewerContext::anonymous(),
        Ok(Some(token)) => match resolve(&services, token).await {
            Ok(viewer) => viewer,
            Err(resp) => return resp,
        },
        Err(status) => {
            return json_error(status, "unauthenticated", "malformed authorization header");
        }
    };

    req.extensions_mut().insert(viewer);
    next.run(req).await
}

async fn resolve(services: &AppServices, token: &str) -> Result<ViewerContext, Response> {
    let now = Utc::now();
    let claims = services.jwt.validate(token, now).map_err(|e| {
        debug!(error = %e, "bearer token rejected");
        json_error(StatusCode::UNAUTHORIZED, "unauthenticated", e.to_string())
    })?;

    let session = services
        .sessions
        .get_session(claims.sid)
        .await
        .map_err(|e| {
            error!(error = %e, "session lookup failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        })?;

    let live = session
        .as_ref()
        .is_some_and(|s| s.user_id == claims.sub && s.is_live(now));
    if !live {
        return Err(session_ended(claims.sid, claims.sub));
    }

    let user = services.users.get_user(claims.sub).await.map_err(|e| {
        error!(error = %e, "user lookup failed");
        StatusCode::INTERNAL_SERVER_ERROR.into_response()
    })?;

    match user {
        Some(user) if user.is_active => {
            Ok(ViewerContext::authenticated(user.to_actor(), claims.sid))
        }
        _ => Err(session_ended(claims.sid, claims.sub)),
    }
}

fn session_ended(sid: SessionId, sub: UserId) -> Response {
    debug!(session_id = %sid, user_id = %sub, "session no longer valid");
    json_error(
        StatusCode::UNAUTHORIZED,
        "unauthenticated",
        "session has ended; log in again",
    )
}

/// `Ok(None)` when there is no `Authorization` header at all.
fn extract_bearer(headers: &HeaderMap) -> Result<Option<&str>, StatusCode> {
    let Some(header) = headers.get(axum::http::header::AUTHORIZATION) else {
        return Ok(None);
    };

    let header = header.to_str().map_err(|_| StatusCode::UNAUTHORIZED)?;

    let header = header
        .strip_prefix("Bearer ")
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let token = header.trim();
    if token.is_empty() {
        return Err(StatusCode::UNAUTHORIZED);
    }

    Ok(Some(token))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn missing_header_is_anonymous() {
        assert_eq!(extract_bearer(&HeaderMap::new()), Ok(None));
    }

    #[test]
    fn bearer_token_is_extracted() {
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::AUTHORIZATION,
            HeaderValue::from_static("Bearer abc.def"),
        );
        assert_eq!(extract_bearer(&headers), Ok(Some("abc.def")));
    }

    #[test]
    fn other_schemes_are_rejected() {
        for value in ["Basic dXNlcg==", "Bearer   "] {
            let mut headers = HeaderMap::new();
            headers.insert(
                axum::http::header::AUTHORIZATION,
                HeaderValue::from_static(value),
            );
            assert_eq!(extract_bearer(&headers), Err(StatusCode::UNAUTHORIZED));
        }
    }
}
