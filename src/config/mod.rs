//! Configuration management for the Identity Registry

use anyhow::{Context, Result};
use std::env;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server host
    pub http_host: String,
    /// HTTP server port
    pub http_port: u16,
    /// Deployment environment name (development, staging, production)
    pub environment: String,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Logging and metrics configuration
    pub telemetry: TelemetryConfig,
    /// Published API description
    pub api_docs: ApiDocsConfig,
    /// Upload limits for organization logos
    pub logo: LogoConfig,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// `pretty` or `json`
    pub log_format: String,
    pub metrics_enabled: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_format: "pretty".to_string(),
            metrics_enabled: true,
        }
    }
}

/// Metadata and path selection of the published API description
#[derive(Debug, Clone)]
pub struct ApiDocsConfig {
    pub title: String,
    pub description: String,
    pub version: String,
    pub contact_name: String,
    pub contact_url: String,
    pub contact_email: String,
    /// Regular expression a handler's full path must match to be published
    pub path_pattern: String,
}

impl Default for ApiDocsConfig {
    fn default() -> Self {
        Self {
            title: "Maritime Cloud Identity Registry API".to_string(),
            description: "Maritime Cloud Identity Registry API can be used for managing entities in the Maritime Cloud.".to_string(),
            version: "0.0.1".to_string(),
            contact_name: "Maritime Cloud".to_string(),
            contact_url: "http://maritimecloud.net".to_string(),
            contact_email: "info@maritimecloud.net".to_string(),
            path_pattern: "/(oidc|x509)/api/.*".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LogoConfig {
    /// Largest accepted upload body in bytes
    pub max_bytes: usize,
}

impl Default for LogoConfig {
    fn default() -> Self {
        Self {
            max_bytes: 1024 * 1024,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let api_docs_defaults = ApiDocsConfig::default();

        Ok(Self {
            http_host: env::var("HTTP_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            http_port: env::var("HTTP_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("Invalid HTTP_PORT")?,
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").context("DATABASE_URL is required")?,
                max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse()
                    .unwrap_or(10),
                min_connections: env::var("DATABASE_MIN_CONNECTIONS")
                    .unwrap_or_else(|_| "2".to_string())
                    .parse()
                    .unwrap_or(2),
            },
            telemetry: TelemetryConfig {
                log_format: env::var("LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string()),
                metrics_enabled: env::var("METRICS_ENABLED")
                    .map(|s| s.to_lowercase() != "false")
                    .unwrap_or(true),
            },
            api_docs: ApiDocsConfig {
                title: env::var("API_DOCS_TITLE").unwrap_or(api_docs_defaults.title),
                description: env::var("API_DOCS_DESCRIPTION")
                    .unwrap_or(api_docs_defaults.description),
                version: env::var("API_DOCS_VERSION").unwrap_or(api_docs_defaults.version),
                contact_name: env::var("API_DOCS_CONTACT_NAME")
                    .unwrap_or(api_docs_defaults.contact_name),
                contact_url: env::var("API_DOCS_CONTACT_URL")
                    .unwrap_or(api_docs_defaults.contact_url),
                contact_email: env::var("API_DOCS_CONTACT_EMAIL")
                    .unwrap_or(api_docs_defaults.contact_email),
                path_pattern: env::var("API_DOCS_PATH_PATTERN")
                    .unwrap_or(api_docs_defaults.path_pattern),
            },
            logo: LogoConfig {
                max_bytes: env::var("LOGO_MAX_BYTES")
                    .unwrap_or_else(|_| "1048576".to_string())
                    .parse()
                    .context("Invalid LOGO_MAX_BYTES")?,
            },
        })
    }

    /// Get HTTP server address
    pub fn http_addr(&self) -> String {
        format!("{}:{}", self.http_host, self.http_port)
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}
