//! Organization logo

use crate::error::{AppError, Result};
use sqlx::FromRow;

/// Mime types accepted for uploaded logos
pub const SUPPORTED_LOGO_TYPES: &[&str] = &["image/png", "image/jpeg"];

/// Image owned by exactly one organization
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Logo {
    pub id: Option<i64>,
    pub image: Vec<u8>,
    pub mime_type: String,
}

impl Logo {
    pub fn new(image: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            id: None,
            image,
            mime_type: mime_type.into(),
        }
    }

    /// Build a logo from uploaded bytes, rejecting empty payloads and
    /// unsupported image formats.
    pub fn from_upload(image: Vec<u8>, content_type: Option<&str>) -> Result<Self> {
        if image.is_empty() {
            return Err(AppError::BadRequest("Logo image is empty".to_string()));
        }

        let mime_type = content_type
            .map(|ct| ct.split(';').next().unwrap_or(ct).trim().to_lowercase())
            .ok_or_else(|| AppError::BadRequest("Logo content type is missing".to_string()))?;

        if !SUPPORTED_LOGO_TYPES.contains(&mime_type.as_str()) {
            return Err(AppError::BadRequest(format!(
                "Unsupported logo type '{}', expected one of: {}",
                mime_type,
                SUPPORTED_LOGO_TYPES.join(", ")
            )));
        }

        Ok(Self::new(image, mime_type))
    }
}
