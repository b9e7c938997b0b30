//! Data access layer (Repository pattern)

pub mod organization;

pub use organization::{claim_attribute_rows, OrganizationRepository, OrganizationRepositoryImpl};
