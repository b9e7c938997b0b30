//! Application state traits for dependency injection
//!
//! Handlers are generic over these traits so the same code runs against the
//! production `AppState` and against in-memory test states.

use crate::config::Config;
use crate::repository::OrganizationRepository;
use crate::service::OrganizationService;
use utoipa::openapi::OpenApi;

/// Trait for application state that provides the organization registry.
pub trait HasOrganizations: Clone + Send + Sync + 'static {
    /// The organization repository type
    type OrganizationRepo: OrganizationRepository;

    /// Get the application configuration
    fn config(&self) -> &Config;

    /// Get the organization service
    fn organization_service(&self) -> &OrganizationService<Self::OrganizationRepo>;

    /// The published API description, built once at startup
    fn api_documentation(&self) -> &OpenApi;

    /// Check if the system is ready (database reachable)
    fn check_ready(&self) -> impl std::future::Future<Output = bool> + Send;
}
