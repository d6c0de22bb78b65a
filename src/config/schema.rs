//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Deserializer, Serialize};

use crate::health::report::ReportShape;
use crate::health::state::HealthStatus;

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServiceConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Health endpoint settings.
    pub health: HealthConfig,

    /// Registered probes, in report order.
    pub probes: Vec<ProbeConfig>,

    /// Rate limiting configuration.
    pub rate_limit: RateLimitConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Health reporting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthConfig {
    /// Readiness endpoint; omitted keys keep the readiness preset.
    #[serde(deserialize_with = "ready_endpoint")]
    pub ready: HealthEndpointConfig,

    /// Liveness endpoint; omitted keys keep the liveness preset.
    #[serde(deserialize_with = "live_endpoint")]
    pub live: HealthEndpointConfig,

    /// Probe timeout when a probe does not set its own, in milliseconds.
    pub default_timeout_ms: u64,

    /// Tags probes may carry besides those the endpoints select on.
    pub known_tags: Vec<String>,

    /// Background publisher.
    pub publisher: PublisherConfig,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            ready: HealthEndpointConfig::ready(),
            live: HealthEndpointConfig::live(),
            default_timeout_ms: 5_000,
            known_tags: Vec::new(),
            publisher: PublisherConfig::default(),
        }
    }
}

/// One health reporting surface.
#[derive(Debug, Clone, Serialize)]
pub struct HealthEndpointConfig {
    /// Route path (e.g., "/health/ready").
    pub path: String,

    /// Tag the selection is based on.
    pub tag: String,

    /// true: probes carrying `tag`; false: probes not carrying it.
    pub include_tagged: bool,

    /// Body shape.
    pub shape: ReportShape,

    /// Severity to status code mapping.
    pub status_codes: StatusCodeConfig,
}

impl HealthEndpointConfig {
    /// Readiness preset: `ready`-tagged probes, detailed body, 200/500/503.
    pub fn ready() -> Self {
        Self {
            path: "/health/ready".to_string(),
            tag: READY_TAG.to_string(),
            include_tagged: true,
            shape: ReportShape::Ready,
            status_codes: StatusCodeConfig::readiness(),
        }
    }

    /// Liveness preset: probes without the `ready` tag, terse body, always 200.
    pub fn live() -> Self {
        Self {
            path: "/health/live".to_string(),
            tag: READY_TAG.to_string(),
            include_tagged: false,
            shape: ReportShape::Live,
            status_codes: StatusCodeConfig::default(),
        }
    }
}

const READY_TAG: &str = "ready";

/// Keys an operator may set under `[health.ready]` / `[health.live]`.
#[derive(Debug, Default, Deserialize)]
struct EndpointOverrides {
    path: Option<String>,
    tag: Option<String>,
    include_tagged: Option<bool>,
    shape: Option<ReportShape>,
    status_codes: Option<StatusCodeOverrides>,
}

#[derive(Debug, Default, Deserialize)]
struct StatusCodeOverrides {
    healthy: Option<u16>,
    degraded: Option<u16>,
    unhealthy: Option<u16>,
}

impl EndpointOverrides {
    fn apply(self, mut base: HealthEndpointConfig) -> HealthEndpointConfig {
        if let Some(path) = self.path {
            base.path = path;
        }
        if let Some(tag) = self.tag {
            base.tag = tag;
        }
        if let Some(include_tagged) = self.include_tagged {
            base.include_tagged = include_tagged;
        }
        if let Some(shape) = self.shape {
            base.shape = shape;
        }
        if let Some(codes) = self.status_codes {
            let target = &mut base.status_codes;
            target.healthy = codes.healthy.unwrap_or(target.healthy);
            target.degraded = codes.degraded.unwrap_or(target.degraded);
            target.unhealthy = codes.unhealthy.unwrap_or(target.unhealthy);
        }
        base
    }
}

fn ready_endpoint<'de, D>(deserializer: D) -> Result<HealthEndpointConfig, D::Error>
where
    D: Deserializer<'de>,
{
    EndpointOverrides::deserialize(deserializer).map(|o| o.apply(HealthEndpointConfig::ready()))
}

fn live_endpoint<'de, D>(deserializer: D) -> Result<HealthEndpointConfig, D::Error>
where
    D: Deserializer<'de>,
{
    EndpointOverrides::deserialize(deserializer).map(|o| o.apply(HealthEndpointConfig::live()))
}

/// HTTP status code per aggregate severity.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StatusCodeConfig {
    pub healthy: u16,
    pub degraded: u16,
    pub unhealthy: u16,
}

impl StatusCodeConfig {
    /// 200 / 500 / 503.
    pub fn readiness() -> Self {
        Self {
            healthy: 200,
            degraded: 500,
            unhealthy: 503,
        }
    }
}

impl Default for StatusCodeConfig {
    fn default() -> Self {
        Self {
            healthy: 200,
            degraded: 200,
            unhealthy: 200,
        }
    }
}

/// Periodic health publishing.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PublisherConfig {
    /// Enable the background publisher.
    pub enabled: bool,

    /// Seconds between runs.
    pub interval_secs: u64,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_secs: 30,
        }
    }
}

/// A probe registration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProbeConfig {
    /// Unique name, used as the report key.
    pub name: String,

    /// Labels used by endpoint selections.
    #[serde(default)]
    pub tags: Vec<String>,

    /// Severity reported when the dependency fails (default: Unhealthy).
    #[serde(default = "default_failure_status")]
    pub failure_status: HealthStatus,

    /// Per-probe budget in milliseconds (default: health.default_timeout_ms).
    #[serde(default)]
    pub timeout_ms: Option<u64>,

    /// Kind-specific settings.
    #[serde(flatten)]
    pub kind: ProbeKind,
}

fn default_failure_status() -> HealthStatus {
    HealthStatus::Unhealthy
}

/// Probe kind and its target.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ProbeKind {
    /// Write a scratch file into a directory.
    Filesystem { target_path: String },

    /// GET a plain-HTTP URL.
    Http {
        url: String,
        #[serde(default)]
        expected_status: Option<u16>,
    },

    /// TCP connect to a database listener ("host:port").
    Database { address: String },
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Enable rate limiting.
    pub enabled: bool,

    /// Header carrying the client identity; falls back to the peer IP.
    pub client_id_header: Option<String>,

    /// Admit requests when the counter store fails.
    pub fail_open: bool,

    /// Seconds between sweeps of expired counters.
    pub sweep_interval_secs: u64,

    /// Rules, each with its own counters.
    pub rules: Vec<RateRuleConfig>,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            client_id_header: None,
            fail_open: true,
            sweep_interval_secs: 60,
            rules: Vec::new(),
        }
    }
}

/// A single rate rule.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RateRuleConfig {
    /// Endpoint pattern, e.g. "*", "get:/health/*", "/status".
    pub endpoint: String,

    /// Window length in seconds.
    pub window_secs: u64,

    /// Requests admitted per client per window.
    pub max_requests: u64,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config: ServiceConfig = toml::from_str("").unwrap();
        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
        assert_eq!(config.health.ready.path, "/health/ready");
        assert!(config.health.ready.include_tagged);
        assert_eq!(config.health.live.path, "/health/live");
        assert!(!config.health.live.include_tagged);
        assert_eq!(config.health.live.status_codes.unhealthy, 200);
        assert!(config.probes.is_empty());
        assert!(config.rate_limit.fail_open);
    }

    #[test]
    fn test_partial_endpoint_keeps_preset() {
        let config: ServiceConfig = toml::from_str(
            r#"
            [health.ready]
            path = "/ready"

            [health.live]
            status_codes = { unhealthy = 503 }
            "#,
        )
        .unwrap();

        let ready = &config.health.ready;
        assert_eq!(ready.path, "/ready");
        assert_eq!(ready.tag, "ready");
        assert!(ready.include_tagged);
        assert_eq!(ready.shape, ReportShape::Ready);
        assert_eq!(ready.status_codes.degraded, 500);
        assert_eq!(ready.status_codes.unhealthy, 503);

        let live = &config.health.live;
        assert_eq!(live.path, "/health/live");
        assert!(!live.include_tagged);
        assert_eq!(live.shape, ReportShape::Live);
        assert_eq!(live.status_codes.degraded, 200);
        assert_eq!(live.status_codes.unhealthy, 503);
    }

    #[test]
    fn test_full_config_parses() {
        let config: ServiceConfig = toml::from_str(
            r#"
            [listener]
            bind_address = "127.0.0.1:5000"

            [health.live]
            path = "/health/live"
            status_codes = { healthy = 200, degraded = 200, unhealthy = 503 }

            [[probes]]
            name = "sqlserver"
            kind = "database"
            address = "db:1433"
            tags = ["ready"]

            [[probes]]
            name = "Stock index api health check"
            kind = "http"
            url = "http://stocks/api/StockIndexes"
            failure_status = "Degraded"
            timeout_ms = 5000
            tags = ["ready"]

            [[probes]]
            name = "Filepath write"
            kind = "filesystem"
            target_path = "/var/log/security"
            tags = ["ready"]

            [rate_limit]
            enabled = true
            client_id_header = "X-ClientId"

            [[rate_limit.rules]]
            endpoint = "*"
            window_secs = 1
            max_requests = 2

            [observability]
            log_format = "json"
            "#,
        )
        .unwrap();

        assert_eq!(config.probes.len(), 3);
        assert!(matches!(config.probes[0].kind, ProbeKind::Database { ref address } if address == "db:1433"));
        assert_eq!(config.probes[1].failure_status, HealthStatus::Degraded);
        assert_eq!(config.probes[1].timeout_ms, Some(5000));
        assert_eq!(config.probes[2].failure_status, HealthStatus::Unhealthy);
        assert_eq!(config.health.live.shape, ReportShape::Live);
        assert_eq!(config.health.live.status_codes.unhealthy, 503);
        assert_eq!(config.rate_limit.rules[0].max_requests, 2);
        assert_eq!(config.observability.log_format, LogFormat::Json);
    }
}
