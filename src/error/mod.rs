//! Unified error handling for the Identity Registry

use axum::{
    extract::{multipart::MultipartError, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;
use validator::{ValidationErrors, ValidationErrorsKind};

/// Application-wide result type
pub type Result<T> = std::result::Result<T, AppError>;

/// Offending field path mapped to its violation codes
pub type FieldViolations = BTreeMap<String, Vec<String>>;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation failed on {} field(s)", .0.len())]
    InvalidFields(FieldViolations),

    /// A projection was asked to write into an absent target
    #[error("Copy target {0} is absent")]
    NullTarget(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut details = None;
        let (status, error_type, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg.clone()),
            AppError::InvalidFields(fields) => {
                details = serde_json::to_value(fields).ok();
                (StatusCode::UNPROCESSABLE_ENTITY, "validation", self.to_string())
            }
            AppError::NullTarget(what) => {
                tracing::error!("Copy into absent {}", what);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                )
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "database_error",
                    "A database error occurred".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = Json(ErrorResponse {
            error: error_type.to_string(),
            message,
            details,
        });

        (status, body).into_response()
    }
}

// Conversion from validation errors
impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        let mut fields = FieldViolations::new();
        flatten_violations(&errors, None, &mut fields);
        AppError::InvalidFields(fields)
    }
}

fn flatten_violations(errors: &ValidationErrors, prefix: Option<&str>, out: &mut FieldViolations) {
    for (field, kind) in errors.errors() {
        let path = match prefix {
            Some(prefix) => format!("{}.{}", prefix, field),
            None => field.to_string(),
        };
        match kind {
            ValidationErrorsKind::Field(violations) => {
                let codes = out.entry(path).or_default();
                codes.extend(violations.iter().map(|v| v.code.to_string()));
                codes.sort();
            }
            ValidationErrorsKind::Struct(inner) => flatten_violations(inner, Some(&path), out),
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    let item_path = format!("{}[{}]", path, index);
                    flatten_violations(inner, Some(&item_path), out);
                }
            }
        }
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        AppError::BadRequest(format!("Invalid multipart body: {}", err.body_text()))
    }
}

// Body rejections carry parser positions; only the offending field is kept
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonDataError(err) => {
                let (field, code) = describe_data_error(&err.body_text());
                AppError::InvalidFields(FieldViolations::from([(field, vec![code.to_string()])]))
            }
            JsonRejection::JsonSyntaxError(_) => {
                AppError::BadRequest("Request body is not valid JSON".to_string())
            }
            JsonRejection::MissingJsonContentType(_) => {
                AppError::BadRequest("Expected an application/json request body".to_string())
            }
            _ => AppError::BadRequest("Invalid request body".to_string()),
        }
    }
}

/// Field path (snake_case, like validation errors) and violation code of a
/// deserialization failure such as
/// `...target type: identityProviderAttributes[0]: missing field `attributeName` at line 1 column 9`
fn describe_data_error(text: &str) -> (String, &'static str) {
    let detail = text
        .split_once("target type: ")
        .map_or(text, |(_, detail)| detail);
    let (path, message) = match detail.split_once(": ") {
        Some((path, message)) if !path.contains(' ') => (Some(to_snake_case(path)), message),
        _ => (None, detail),
    };

    let missing = message
        .strip_prefix("missing field `")
        .and_then(|rest| rest.split('`').next())
        .map(to_snake_case);

    match (path, missing) {
        (Some(path), Some(field)) => (format!("{}.{}", path, field), "required"),
        (None, Some(field)) => (field, "required"),
        (Some(path), None) => (path, "invalid"),
        (None, None) => ("body".to_string(), "invalid"),
    }
}

fn to_snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for c in name.chars() {
        if c.is_ascii_uppercase() {
            out.push('_');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}
