//! Probe contract.

use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;

use crate::health::state::{HealthStatus, ProbeResult};

/// Everything a probe may know about its own registration.
#[derive(Debug, Clone)]
pub struct ProbeContext {
    pub name: String,
    /// Severity to report when the checked dependency is failing.
    pub failure_status: HealthStatus,
    /// Budget the scheduler will enforce on this run.
    pub timeout: Duration,
}

/// A single dependency check.
///
/// Implementations must turn every internal fault into a [`ProbeResult`];
/// `check` has no error channel. Panics are caught by the scheduler and
/// reported at `failure_status`.
#[async_trait]
pub trait Probe: Send + Sync + Debug {
    async fn check(&self, ctx: &ProbeContext) -> ProbeResult;
}
