//! Organization logo endpoints

use crate::api::MessageResponse;
use crate::domain::Logo;
use crate::error::{AppError, Result};
use crate::state::HasOrganizations;
use axum::{
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};

/// Multipart field carrying the image
const LOGO_FIELD: &str = "logo";

#[utoipa::path(
    get,
    path = "/api/org/{short_name}/logo",
    tag = "Organizations",
    params(("short_name" = String, Path, description = "Organization short name")),
    responses(
        (status = 200, description = "Logo image bytes with their stored content type"),
        (status = 404, description = "Unknown organization or no logo")
    )
)]
pub async fn get_logo<S: HasOrganizations>(
    State(state): State<S>,
    Path(short_name): Path<String>,
) -> Result<impl IntoResponse> {
    let logo = state.organization_service().get_logo(&short_name).await?;
    Ok(([(header::CONTENT_TYPE, logo.mime_type)], logo.image))
}

/// Upload a PNG or JPEG logo as the `logo` field of a multipart form. An
/// existing logo is replaced.
#[utoipa::path(
    post,
    path = "/api/org/{short_name}/logo",
    tag = "Organizations",
    params(("short_name" = String, Path, description = "Organization short name")),
    responses(
        (status = 201, description = "Logo stored", body = MessageResponse),
        (status = 400, description = "Missing or unsupported image"),
        (status = 404, description = "Unknown organization")
    )
)]
pub async fn upload_logo<S: HasOrganizations>(
    State(state): State<S>,
    Path(short_name): Path<String>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse> {
    let mut logo = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(LOGO_FIELD) {
            continue;
        }
        let content_type = field.content_type().map(str::to_string);
        let image = field.bytes().await?;
        logo = Some(Logo::from_upload(image.to_vec(), content_type.as_deref())?);
        break;
    }

    let logo = logo.ok_or_else(|| {
        AppError::BadRequest(format!("Multipart field '{}' is missing", LOGO_FIELD))
    })?;

    state
        .organization_service()
        .set_logo(&short_name, logo)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("Logo uploaded successfully")),
    ))
}

#[utoipa::path(
    delete,
    path = "/api/org/{short_name}/logo",
    tag = "Organizations",
    params(("short_name" = String, Path, description = "Organization short name")),
    responses(
        (status = 200, description = "Logo removed", body = MessageResponse),
        (status = 404, description = "Unknown organization or no logo")
    )
)]
pub async fn delete_logo<S: HasOrganizations>(
    State(state): State<S>,
    Path(short_name): Path<String>,
) -> Result<impl IntoResponse> {
    state
        .organization_service()
        .delete_logo(&short_name)
        .await?;
    Ok(Json(MessageResponse::new("Logo deleted successfully")))
}
