//! Domain models for the Identity Registry

pub mod certificate;
pub mod common;
pub mod identity_provider;
pub mod logo;
pub mod organization;

pub use certificate::*;
pub use identity_provider::*;
pub use logo::*;
pub use organization::*;
