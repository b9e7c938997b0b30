use anyhow::Result;
use identity_registry::{config::Config, migration, server, telemetry};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    let prometheus_handle = telemetry::init(&config.telemetry)?;

    info!(
        environment = %config.environment,
        "Starting Identity Registry"
    );
    info!("HTTP server listening on {}", config.http_addr());

    migration::run_migrations(&config).await?;

    // Run the server
    server::run(config, prometheus_handle).await
}
