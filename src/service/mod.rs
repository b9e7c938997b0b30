//! Business logic layer

pub mod organization;

pub use organization::OrganizationService;
