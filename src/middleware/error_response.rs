//! Error response normalization middleware
//!
//! Framework-level rejections (query strings, unknown routes, wrong methods)
//! answer with text/plain. This layer rewrites them into the same
//! `{error, message}` body `AppError` produces, without parser details.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Endpoints whose plain-text answers are part of their contract
const PLAIN_TEXT_PATHS: &[&str] = &["/health", "/ready"];

pub async fn normalize_error_response(request: Request<Body>, next: Next) -> Response {
    let passthrough = PLAIN_TEXT_PATHS.contains(&request.uri().path());
    let response = next.run(request).await;

    let status = response.status();
    if passthrough || !(status.is_client_error() || status.is_server_error()) {
        return response;
    }

    let is_json = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.contains("application/json"));
    if is_json {
        return response;
    }

    generic_error_response(status)
}

fn generic_error_response(status: StatusCode) -> Response {
    let (error_type, message) = match status {
        StatusCode::BAD_REQUEST => ("bad_request", "Invalid request"),
        StatusCode::NOT_FOUND => ("not_found", "Not found"),
        StatusCode::METHOD_NOT_ALLOWED => ("method_not_allowed", "Method not allowed"),
        StatusCode::PAYLOAD_TOO_LARGE => ("payload_too_large", "Request body too large"),
        StatusCode::UNSUPPORTED_MEDIA_TYPE => ("unsupported_media_type", "Unsupported content type"),
        StatusCode::UNPROCESSABLE_ENTITY => ("validation", "Validation error"),
        _ if status.is_client_error() => ("client_error", "Client error"),
        _ => ("internal_error", "An internal error occurred"),
    };

    (
        status,
        Json(json!({
            "error": error_type,
            "message": message,
        })),
    )
        .into_response()
}
