//! OpenAPI documentation assembly
//!
//! The organization operations are documented once and mounted under every
//! registry prefix. The published description keeps only the paths that
//! match the configured pattern.

use crate::config::ApiDocsConfig;
use anyhow::{Context, Result};
use regex::Regex;
use utoipa::openapi::{ContactBuilder, OpenApi as OpenApiDoc};
use utoipa::OpenApi;

/// Prefixes the organization API is mounted under
pub const ORGANIZATION_PREFIXES: [&str; 2] = ["oidc", "x509"];

#[derive(OpenApi)]
#[openapi(
    tags(
        (name = "System", description = "Health checks and API description"),
    ),
    paths(
        crate::api::health::health,
        crate::api::health::ready,
        crate::api::docs::api_docs,
    ),
    components(schemas(crate::api::health::HealthResponse))
)]
pub struct SystemApi;

#[derive(OpenApi)]
#[openapi(
    tags(
        (name = "Organizations", description = "Registration, approval and branding of organizations"),
    ),
    paths(
        crate::api::organization::apply,
        crate::api::organization::list,
        crate::api::organization::get,
        crate::api::organization::update,
        crate::api::organization::delete,
        crate::api::organization::approve,
        crate::api::logo::get_logo,
        crate::api::logo::upload_logo,
        crate::api::logo::delete_logo,
    ),
    components(schemas(
        crate::domain::Organization,
        crate::domain::IdentityProviderAttribute,
        crate::domain::Certificate,
        crate::api::PaginationQuery,
        crate::api::PaginationMeta,
        crate::api::MessageResponse,
    ))
)]
pub struct OrganizationApi;

/// Every documented operation, unfiltered, with full paths
pub fn full_api() -> OpenApiDoc {
    let mut doc = SystemApi::openapi();
    for prefix in ORGANIZATION_PREFIXES {
        let mut mounted = OrganizationApi::openapi();
        prefix_operation_ids(&mut mounted, prefix);
        doc = doc.nest(format!("/{}", prefix), mounted);
    }
    doc
}

// Operation ids must stay unique once the same handlers appear under several prefixes
fn prefix_operation_ids(doc: &mut OpenApiDoc, prefix: &str) {
    for item in doc.paths.paths.values_mut() {
        let operations = [
            &mut item.get,
            &mut item.put,
            &mut item.post,
            &mut item.delete,
        ];
        for operation in operations.into_iter().flatten() {
            if let Some(id) = operation.operation_id.as_mut() {
                *id = format!("{}_{}", prefix, id);
            }
        }
    }
}

/// Metadata and path selection of the published API description
#[derive(Debug, Clone)]
pub struct ApiDocumentation {
    config: ApiDocsConfig,
    selector: Regex,
}

impl ApiDocumentation {
    pub fn from_config(config: &ApiDocsConfig) -> Result<Self> {
        // the whole path has to match, not just a substring
        let selector = Regex::new(&format!("^(?:{})$", config.path_pattern))
            .with_context(|| format!("Invalid API_DOCS_PATH_PATTERN '{}'", config.path_pattern))?;

        Ok(Self {
            config: config.clone(),
            selector,
        })
    }

    /// Whether an operation at `path` is published
    pub fn includes(&self, path: &str) -> bool {
        self.selector.is_match(path)
    }

    /// Stamp the configured metadata on `doc` and drop unpublished paths
    pub fn describe(&self, mut doc: OpenApiDoc) -> OpenApiDoc {
        doc.info.title = self.config.title.clone();
        doc.info.description = Some(self.config.description.clone());
        doc.info.version = self.config.version.clone();
        doc.info.contact = Some(
            ContactBuilder::new()
                .name(Some(self.config.contact_name.clone()))
                .url(Some(self.config.contact_url.clone()))
                .email(Some(self.config.contact_email.clone()))
                .build(),
        );

        doc.paths.paths.retain(|path, _| self.includes(path));
        doc
    }

    /// The published description
    pub fn build(&self) -> OpenApiDoc {
        self.describe(full_api())
    }
}
