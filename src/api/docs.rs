//! Published API description

use crate::state::HasOrganizations;
use axum::{extract::State, Json};
use utoipa::openapi::OpenApi;

/// GET /v2/api-docs: the filtered OpenAPI document
#[utoipa::path(
    get,
    path = "/v2/api-docs",
    tag = "System",
    responses(
        (status = 200, description = "OpenAPI document of the published operations")
    )
)]
pub async fn api_docs<S: HasOrganizations>(State(state): State<S>) -> Json<OpenApi> {
    Json(state.api_documentation().clone())
}
