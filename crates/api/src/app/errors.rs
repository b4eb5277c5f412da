use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::{debug, error};

use shopfront_auth::Denial;
use shopfront_core::{DomainError, FieldError};
use shopfront_infra::StoreError;

pub fn json_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

/// Field-level rejection: the request was not applied.
pub fn field_error(field: &str, message: impl Into<String>) -> Response {
    (
        StatusCode::BAD_REQUEST,
        axum::Json(json!({
            "error": "validation_error",
            "field": field,
            "message": message.into(),
        })),
    )
        .into_response()
}

/// Several rejected fields. `field`/`message` repeat the first one so
/// single-field clients keep working.
fn fields_error(fields: Vec<FieldError>) -> Response {
    let (field, message) = fields
        .first()
        .map(|f| (f.field, f.message.clone()))
        .unwrap_or(("", String::new()));
    (
        StatusCode::BAD_REQUEST,
        axum::Json(json!({
            "error": "validation_error",
            "field": field,
            "message": message,
            "fields": fields,
        })),
    )
        .into_response()
}

pub fn domain_error_to_response(err: DomainError) -> Response {
    match err {
        DomainError::InvalidField { field, message } => field_error(field, message),
        DomainError::InvalidFields(fields) => fields_error(fields),
        DomainError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        DomainError::InvalidId(msg) => json_error(StatusCode::BAD_REQUEST, "invalid_id", msg),
        DomainError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", "not found"),
        DomainError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
        DomainError::Unauthorized => json_error(StatusCode::FORBIDDEN, "forbidden", "forbidden"),
    }
}

/// Policy refusal: 401 without an actor, 403 otherwise.
pub fn denial_to_response(denial: Denial) -> Response {
    debug!(denial = %denial, "request denied by policy");
    match denial {
        Denial::Unauthenticated => json_error(
            StatusCode::UNAUTHORIZED,
            "unauthenticated",
            "authentication required",
        ),
        Denial::Forbidden(reason) => json_error(StatusCode::FORBIDDEN, "forbidden", reason),
    }
}

pub fn store_error_to_response(err: StoreError) -> Response {
    match err {
        StoreError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", "not found"),
        StoreError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
        StoreError::MissingReference(msg) => {
            json_error(StatusCode::BAD_REQUEST, "missing_reference", msg)
        }
        StoreError::Backend(msg) => {
            error!(error = %msg, "store operation failed");
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "store_error",
                "internal storage error",
            )
        }
    }
}

pub fn not_found(what: &'static str) -> Response {
    json_error(StatusCode::NOT_FOUND, "not_found", format!("{what} not found"))
}

/// Parse a path identifier, mapping failures to 400.
pub fn parse_id<T>(raw: &str) -> Result<T, Response>
where
    T: core::str::FromStr<Err = DomainError>,
{
    raw.parse::<T>().map_err(domain_error_to_response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::borrow::Cow;

    #[test]
    fn status_codes_follow_the_error_taxonomy() {
        assert_eq!(
            domain_error_to_response(DomainError::field("price", "negative")).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            denial_to_response(Denial::Unauthenticated).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            denial_to_response(Denial::Forbidden(Cow::Borrowed("no"))).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            store_error_to_response(StoreError::Conflict("dup".into())).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            store_error_to_response(StoreError::backend("boom")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn several_rejected_fields_are_one_bad_request() {
        let res = domain_error_to_response(DomainError::InvalidFields(vec![
            FieldError::new("name", "required"),
            FieldError::new("price", "negative"),
        ]));
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn malformed_ids_are_bad_requests() {
        let res = parse_id::<shopfront_core::ProductId>("not-a-uuid").unwrap_err();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }
}
