//! Health severity and per-probe results.
//!
//! # Ordering
//! ```text
//! Healthy < Degraded < Unhealthy
//! ```
//!
//! The aggregate of a report is always the worst severity it contains.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Ordered health level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Deserialize, Serialize)]
pub enum HealthStatus {
    #[default]
    Healthy,
    Degraded,
    Unhealthy,
}

impl HealthStatus {
    /// Label used in reports, logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Healthy => "Healthy",
            HealthStatus::Degraded => "Degraded",
            HealthStatus::Unhealthy => "Unhealthy",
        }
    }

    pub fn is_healthy(&self) -> bool {
        *self == HealthStatus::Healthy
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a single probe invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResult {
    pub status: HealthStatus,
    pub message: String,
    /// Underlying fault, if the probe chose to attach one.
    pub error: Option<String>,
    pub data: BTreeMap<String, String>,
}

impl ProbeResult {
    /// A passing result.
    pub fn healthy(message: impl Into<String>) -> Self {
        Self {
            status: HealthStatus::Healthy,
            message: message.into(),
            error: None,
            data: BTreeMap::new(),
        }
    }

    /// A failing result at the given severity with the fault attached.
    pub fn failure(
        status: HealthStatus,
        message: impl Into<String>,
        error: impl fmt::Display,
    ) -> Self {
        Self {
            status,
            message: message.into(),
            error: Some(error.to_string()),
            data: BTreeMap::new(),
        }
    }

    /// Result synthesized when a probe overran its budget.
    ///
    /// Always `Unhealthy`: a hang is treated as the worst case whatever the
    /// registration's failure policy says.
    pub fn timed_out(budget: std::time::Duration) -> Self {
        Self::failure(
            HealthStatus::Unhealthy,
            "timed out",
            format!("probe did not complete within {} ms", budget.as_millis()),
        )
    }

    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }
}

/// Fold severities into the worst one. An empty input is `Healthy`.
pub fn aggregate_status<I>(statuses: I) -> HealthStatus
where
    I: IntoIterator<Item = HealthStatus>,
{
    statuses.into_iter().max().unwrap_or(HealthStatus::Healthy)
}
