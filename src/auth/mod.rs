//! Optional pre-shared key guard for the catalog API.
//!
//! Keys are compared in constant time.

use axum::{
    extract::Request,
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use subtle::ConstantTimeEq;

use crate::errors::{AppError, ErrorResponse};

/// Header name for the API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Reject requests that do not carry `expected_psk`; pass everything when no key is configured.
pub async fn psk_auth_layer(
    expected_psk: Option<String>,
    request: Request,
    next: Next,
) -> Response {
    let Some(expected) = expected_psk else {
        return next.run(request).await;
    };

    let verdict = provided_key(request.headers()).map(|key| keys_match(key, &expected));
    match verdict {
        Some(true) => next.run(request).await,
        Some(false) => unauthorized_response("Invalid API key"),
        None => unauthorized_response("Missing API key"),
    }
}

/// Key from `x-api-key`, or else from an `Authorization: Bearer` header.
fn provided_key(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .or_else(|| {
            headers
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.strip_prefix("Bearer "))
        })
}

fn keys_match(provided: &str, expected: &str) -> bool {
    provided.as_bytes().ct_eq(expected.as_bytes()).into()
}

fn unauthorized_response(message: &str) -> Response {
    tracing::debug!("Rejected request: {}", message);
    let error = AppError::Unauthorized(message.to_string());
    (StatusCode::UNAUTHORIZED, Json(ErrorResponse::new(&error, 0))).into_response()
}
