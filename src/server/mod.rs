//! Server initialization and routing

use crate::api;
use crate::config::Config;
use crate::middleware::{normalize_error_response, ObservabilityLayer};
use crate::openapi::{ApiDocumentation, ORGANIZATION_PREFIXES};
use crate::repository::OrganizationRepositoryImpl;
use crate::service::OrganizationService;
use crate::state::HasOrganizations;
use anyhow::Result;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use sqlx::{mysql::MySqlPoolOptions, MySqlPool};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use utoipa::openapi::OpenApi;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db_pool: MySqlPool,
    pub organization_service: Arc<OrganizationService<OrganizationRepositoryImpl>>,
    pub api_documentation: Arc<OpenApi>,
}

impl HasOrganizations for AppState {
    type OrganizationRepo = OrganizationRepositoryImpl;

    fn config(&self) -> &Config {
        &self.config
    }

    fn organization_service(&self) -> &OrganizationService<Self::OrganizationRepo> {
        &self.organization_service
    }

    fn api_documentation(&self) -> &OpenApi {
        &self.api_documentation
    }

    async fn check_ready(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.db_pool).await.is_ok()
    }
}

/// Run the HTTP server
pub async fn run(config: Config, prometheus_handle: Option<PrometheusHandle>) -> Result<()> {
    // Create database connection pool
    let db_pool = MySqlPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .connect(&config.database.url)
        .await?;

    info!("Connected to database");

    let api_documentation = ApiDocumentation::from_config(&config.api_docs)?.build();
    info!(
        paths = api_documentation.paths.paths.len(),
        pattern = %config.api_docs.path_pattern,
        "API description assembled"
    );

    let organization_repo = Arc::new(OrganizationRepositoryImpl::new(db_pool.clone()));
    let organization_service = Arc::new(OrganizationService::new(organization_repo));

    let http_addr = config.http_addr();
    let state = AppState {
        config: Arc::new(config),
        db_pool,
        organization_service,
        api_documentation: Arc::new(api_documentation),
    };

    let metrics_enabled = prometheus_handle.is_some();
    let mut app = build_router(state).merge(metrics_router(prometheus_handle));
    if metrics_enabled {
        app = app.layer(ObservabilityLayer);
    }

    let listener = TcpListener::bind(&http_addr).await?;
    info!("HTTP server started on {}", http_addr);
    axum::serve(listener, app).await?;

    Ok(())
}

/// Router exposing the Prometheus handle at `/metrics`
pub fn metrics_router(handle: Option<PrometheusHandle>) -> Router {
    Router::new()
        .route("/metrics", get(api::metrics::metrics_handler))
        .with_state(Arc::new(handle))
}

/// Routes of the organization registry, relative to a prefix
fn organization_routes<S: HasOrganizations>(logo_max_bytes: usize) -> Router<S> {
    Router::new()
        .route("/api/org/apply", post(api::organization::apply::<S>))
        .route("/api/orgs", get(api::organization::list::<S>))
        .route(
            "/api/org/{short_name}",
            get(api::organization::get::<S>)
                .put(api::organization::update::<S>)
                .delete(api::organization::delete::<S>),
        )
        .route(
            "/api/org/{short_name}/approve",
            post(api::organization::approve::<S>),
        )
        .route(
            "/api/org/{short_name}/logo",
            get(api::logo::get_logo::<S>)
                .post(api::logo::upload_logo::<S>)
                .delete(api::logo::delete_logo::<S>)
                .layer(DefaultBodyLimit::max(logo_max_bytes)),
        )
}

/// Build the HTTP router with generic state type
///
/// Works with both the production `AppState` and test implementations of
/// `HasOrganizations`.
pub fn build_router<S: HasOrganizations>(state: S) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let logo_max_bytes = state.config().logo.max_bytes;

    let mut router = Router::new()
        // Health endpoints
        .route("/health", get(api::health::health))
        .route("/ready", get(api::health::ready::<S>))
        // API description
        .route("/v2/api-docs", get(api::docs::api_docs::<S>));

    for prefix in ORGANIZATION_PREFIXES {
        router = router.nest(
            &format!("/{}", prefix),
            organization_routes::<S>(logo_max_bytes),
        );
    }

    router
        .layer(axum::middleware::from_fn(normalize_error_response))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
