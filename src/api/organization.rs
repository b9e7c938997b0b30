//! Organization API handlers
//!
//! Mounted under both `/oidc` and `/x509`; the paths below are relative to
//! those prefixes.

use crate::api::{
    outbound, JsonBody, MessageResponse, PaginatedResponse, PaginationQuery, SuccessResponse,
};
use crate::domain::Organization;
use crate::error::Result;
use crate::state::HasOrganizations;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

/// Register a new organization. It stays unapproved until an administrator
/// approves it.
#[utoipa::path(
    post,
    path = "/api/org/apply",
    tag = "Organizations",
    request_body = Organization,
    responses(
        (status = 201, description = "Organization registered"),
        (status = 409, description = "Short name already taken"),
        (status = 422, description = "Invalid organization fields")
    )
)]
pub async fn apply<S: HasOrganizations>(
    State(state): State<S>,
    JsonBody(input): JsonBody<Organization>,
) -> Result<impl IntoResponse> {
    let org = state.organization_service().create(input).await?;
    Ok((StatusCode::CREATED, Json(SuccessResponse::new(outbound(org)))))
}

#[utoipa::path(
    get,
    path = "/api/orgs",
    tag = "Organizations",
    params(PaginationQuery),
    responses(
        (status = 200, description = "Page of organizations")
    )
)]
pub async fn list<S: HasOrganizations>(
    State(state): State<S>,
    Query(pagination): Query<PaginationQuery>,
) -> Result<impl IntoResponse> {
    let (orgs, total) = state
        .organization_service()
        .list(pagination.page, pagination.per_page)
        .await?;
    let orgs = orgs.into_iter().map(outbound).collect();
    Ok(Json(PaginatedResponse::new(
        orgs,
        pagination.page,
        pagination.per_page,
        total,
    )))
}

#[utoipa::path(
    get,
    path = "/api/org/{short_name}",
    tag = "Organizations",
    params(("short_name" = String, Path, description = "Organization short name")),
    responses(
        (status = 200, description = "Organization", body = Organization),
        (status = 404, description = "Unknown organization")
    )
)]
pub async fn get<S: HasOrganizations>(
    State(state): State<S>,
    Path(short_name): Path<String>,
) -> Result<impl IntoResponse> {
    let org = state
        .organization_service()
        .get_by_short_name(&short_name)
        .await?;
    Ok(Json(SuccessResponse::new(outbound(org))))
}

/// Update the descriptive fields and identity-provider attributes. Short
/// name, approval, logo and certificates in the body are ignored.
///
/// `identityProviderAttributes` replaces the stored list as a whole and is
/// never returned by the read operations. A body without it deletes every
/// stored attribute, so clients must always resend the complete list.
#[utoipa::path(
    put,
    path = "/api/org/{short_name}",
    tag = "Organizations",
    params(("short_name" = String, Path, description = "Organization short name")),
    request_body = Organization,
    responses(
        (status = 200, description = "Organization updated"),
        (status = 404, description = "Unknown organization"),
        (status = 422, description = "Invalid organization fields")
    )
)]
pub async fn update<S: HasOrganizations>(
    State(state): State<S>,
    Path(short_name): Path<String>,
    JsonBody(input): JsonBody<Organization>,
) -> Result<impl IntoResponse> {
    let org = state
        .organization_service()
        .update(&short_name, input)
        .await?;
    Ok(Json(SuccessResponse::new(outbound(org))))
}

#[utoipa::path(
    delete,
    path = "/api/org/{short_name}",
    tag = "Organizations",
    params(("short_name" = String, Path, description = "Organization short name")),
    responses(
        (status = 200, description = "Organization deleted", body = MessageResponse),
        (status = 404, description = "Unknown organization")
    )
)]
pub async fn delete<S: HasOrganizations>(
    State(state): State<S>,
    Path(short_name): Path<String>,
) -> Result<impl IntoResponse> {
    state.organization_service().delete(&short_name).await?;
    Ok(Json(MessageResponse::new("Organization deleted successfully")))
}

#[utoipa::path(
    post,
    path = "/api/org/{short_name}/approve",
    tag = "Organizations",
    params(("short_name" = String, Path, description = "Organization short name")),
    responses(
        (status = 200, description = "Organization approved"),
        (status = 404, description = "Unknown organization")
    )
)]
pub async fn approve<S: HasOrganizations>(
    State(state): State<S>,
    Path(short_name): Path<String>,
) -> Result<impl IntoResponse> {
    let org = state.organization_service().approve(&short_name).await?;
    Ok(Json(SuccessResponse::new(outbound(org))))
}
