//! Prometheus metrics setup and metric definitions

use anyhow::{Context, Result};
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Install the Prometheus recorder and return a handle for rendering metrics.
pub fn install_prometheus_recorder() -> Result<PrometheusHandle> {
    // Seconds; sub-millisecond buckets for the fast read endpoints
    let buckets = vec![
        0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
    ];

    PrometheusBuilder::new()
        .set_buckets(&buckets)
        .context("failed to set histogram buckets")?
        .install_recorder()
        .context("failed to install Prometheus recorder")
}

/// Register metric descriptions and emit initial zero values so Prometheus output
/// includes HELP/TYPE lines for all metrics from startup.
pub fn describe_metrics() {
    // HTTP metrics
    describe_counter!(
        "identity_registry_http_requests_total",
        "Total number of HTTP requests"
    );
    describe_histogram!(
        "identity_registry_http_request_duration_seconds",
        "HTTP request duration in seconds"
    );
    describe_gauge!(
        "identity_registry_http_requests_in_flight",
        "Number of HTTP requests currently being processed"
    );

    // Business metrics
    describe_counter!(
        "identity_registry_organizations_created_total",
        "Total number of registered organizations"
    );
    describe_counter!(
        "identity_registry_organizations_approved_total",
        "Total number of approved organizations"
    );

    // Counters only move on specific code paths
    counter!("identity_registry_organizations_created_total").absolute(0);
    counter!("identity_registry_organizations_approved_total").absolute(0);
    gauge!("identity_registry_http_requests_in_flight").set(0.0);
}
