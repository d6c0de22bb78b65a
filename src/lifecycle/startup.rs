//! Startup orchestration.
//!
//! # Responsibilities
//! - Validate configuration
//! - Build the probe registry, health endpoints and rate gate
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Listeners bind after components are built (traffic only when ready)

use std::sync::Arc;
use std::time::Duration;

use axum::http::status::InvalidStatusCode;
use thiserror::Error;

use crate::config::validation::validate_config;
use crate::config::{ConfigError, ServiceConfig};
use crate::health::{HealthCheckService, HealthEndpoint, Registry, RegistryError};
use crate::security::rate_limit::{RateGate, RateGateError};

/// Error type for startup.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Probe registry: {0}")]
    Registry(#[from] RegistryError),

    #[error("Health endpoint: {0}")]
    StatusCode(#[from] InvalidStatusCode),

    #[error("Rate limiting: {0}")]
    RateGate(#[from] RateGateError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Metrics exporter: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),
}

/// Everything the HTTP layer serves from.
#[derive(Debug, Clone)]
pub struct Components {
    pub service: HealthCheckService,
    pub ready: Arc<HealthEndpoint>,
    pub live: Arc<HealthEndpoint>,
    pub rate_gate: Option<Arc<RateGate>>,
}

pub fn build_components(config: &ServiceConfig) -> Result<Components, StartupError> {
    validate_config(config).map_err(ConfigError::Validation)?;

    let default_timeout = Duration::from_millis(config.health.default_timeout_ms);
    let registry = Registry::from_config(&config.probes, default_timeout)?;
    let service = HealthCheckService::new(Arc::new(registry));

    let ready = Arc::new(HealthEndpoint::from_config(service.clone(), &config.health.ready)?);
    let live = Arc::new(HealthEndpoint::from_config(service.clone(), &config.health.live)?);

    let rate_gate = if config.rate_limit.enabled {
        Some(Arc::new(RateGate::from_config(&config.rate_limit)?))
    } else {
        None
    };

    tracing::info!(
        probes = service.registry().len(),
        ready_path = %config.health.ready.path,
        live_path = %config.health.live.path,
        rate_rules = rate_gate.as_ref().map_or(0, |g| g.rules().len()),
        "Components initialized"
    );

    Ok(Components {
        service,
        ready,
        live,
        rate_gate,
    })
}
