//! Aggregate status to HTTP status code.

use axum::http::StatusCode;

use crate::config::schema::StatusCodeConfig;
use crate::health::state::HealthStatus;

/// Per-endpoint mapping from severity to response code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusMapper {
    healthy: StatusCode,
    degraded: StatusCode,
    unhealthy: StatusCode,
}

impl StatusMapper {
    pub fn new(healthy: StatusCode, degraded: StatusCode, unhealthy: StatusCode) -> Self {
        Self {
            healthy,
            degraded,
            unhealthy,
        }
    }

    /// 200 / 500 / 503.
    pub fn readiness() -> Self {
        Self::new(
            StatusCode::OK,
            StatusCode::INTERNAL_SERVER_ERROR,
            StatusCode::SERVICE_UNAVAILABLE,
        )
    }

    /// 200 for every severity.
    pub fn always_ok() -> Self {
        Self::new(StatusCode::OK, StatusCode::OK, StatusCode::OK)
    }

    pub fn from_config(config: &StatusCodeConfig) -> Result<Self, axum::http::status::InvalidStatusCode> {
        Ok(Self::new(
            StatusCode::from_u16(config.healthy)?,
            StatusCode::from_u16(config.degraded)?,
            StatusCode::from_u16(config.unhealthy)?,
        ))
    }

    /// Status code for an aggregate severity.
    pub fn map(&self, status: HealthStatus) -> StatusCode {
        match status {
            HealthStatus::Healthy => self.healthy,
            HealthStatus::Degraded => self.degraded,
            HealthStatus::Unhealthy => self.unhealthy,
        }
    }
}

impl Default for StatusMapper {
    fn default() -> Self {
        Self::always_ok()
    }
}
