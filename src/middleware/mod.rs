//! HTTP middleware for the Identity Registry

pub mod error_response;
pub mod metrics;

pub use error_response::normalize_error_response;
pub use metrics::ObservabilityLayer;
