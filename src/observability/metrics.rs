//! Metrics collection and exposition.
//!
//! # Metrics
//! - `healthgate_probe_runs_total` (counter): probe runs by probe, status
//! - `healthgate_probe_duration_seconds` (histogram): per-probe latency
//! - `healthgate_probe_status` (gauge): 0=healthy, 1=degraded, 2=unhealthy
//! - `healthgate_health_reports_total` (counter): aggregate runs by status
//! - `healthgate_health_report_duration_seconds` (histogram): wall clock per run
//! - `healthgate_rate_limited_total` (counter): denied requests by rule
//! - `healthgate_rate_store_errors_total` (counter): counter store failures
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed
//! - Prometheus exporter only when `observability.metrics_enabled`

use std::net::SocketAddr;
use std::time::Duration;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::health::state::HealthStatus;

/// Install the Prometheus recorder and its scrape listener.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

fn status_level(status: HealthStatus) -> f64 {
    match status {
        HealthStatus::Healthy => 0.0,
        HealthStatus::Degraded => 1.0,
        HealthStatus::Unhealthy => 2.0,
    }
}

pub fn record_probe_result(probe: &str, status: HealthStatus, duration: Duration) {
    let probe = probe.to_string();
    ::metrics::counter!(
        "healthgate_probe_runs_total",
        "probe" => probe.clone(),
        "status" => status.as_str()
    )
    .increment(1);
    ::metrics::histogram!("healthgate_probe_duration_seconds", "probe" => probe.clone())
        .record(duration.as_secs_f64());
    ::metrics::gauge!("healthgate_probe_status", "probe" => probe).set(status_level(status));
}

pub fn record_health_report(status: HealthStatus, duration: Duration) {
    ::metrics::counter!("healthgate_health_reports_total", "status" => status.as_str()).increment(1);
    ::metrics::histogram!("healthgate_health_report_duration_seconds").record(duration.as_secs_f64());
}

pub fn record_rate_limited(rule: &str) {
    ::metrics::counter!("healthgate_rate_limited_total", "rule" => rule.to_string()).increment(1);
}

pub fn record_rate_store_error() {
    ::metrics::counter!("healthgate_rate_store_errors_total").increment(1);
}
