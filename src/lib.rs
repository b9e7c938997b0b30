//! Identity Registry - organization registry backend for the Maritime Cloud
//!
//! Provides the organization aggregate with its identity-provider wiring,
//! logo and certificate view, MySQL persistence, and the REST API mounted
//! under `/oidc` and `/x509`.

pub mod api;
pub mod config;
pub mod domain;
pub mod error;
pub mod middleware;
pub mod migration;
pub mod openapi;
pub mod repository;
pub mod server;
pub mod service;
pub mod state;
pub mod telemetry;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, Result};
