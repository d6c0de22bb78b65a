//! Concurrent probe execution and aggregation.
//!
//! # Flow
//! ```text
//! Selection
//!     → Registry::select (insertion order)
//!     → spawn one task per probe, each under its own timeout
//!     → join all
//!     → fold worst severity, measure wall-clock duration
//! ```
//!
//! A probe that overruns its budget is aborted and reported `Unhealthy`.
//! Siblings keep running. A panicking probe is reported at its
//! registration's failure severity.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::future::join_all;

use crate::health::registry::{ProbeRegistration, Registry, Selection};
use crate::health::state::{aggregate_status, HealthStatus, ProbeResult};
use crate::observability::metrics;

/// One probe's contribution to a report.
#[derive(Debug, Clone)]
pub struct ReportEntry {
    pub name: String,
    pub result: ProbeResult,
    pub duration: Duration,
}

/// Outcome of one scheduler run.
#[derive(Debug, Clone)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub total_duration: Duration,
    /// Registry insertion order.
    pub entries: Vec<ReportEntry>,
}

impl HealthReport {
    /// Look up an entry by probe name.
    pub fn entry(&self, name: &str) -> Option<&ReportEntry> {
        self.entries.iter().find(|e| e.name == name)
    }
}

/// Runs selections of the registry.
#[derive(Debug, Clone)]
pub struct HealthCheckService {
    registry: Arc<Registry>,
}

impl HealthCheckService {
    /// Create a service over a shared registry.
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    /// Get the registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Run every selected probe concurrently and aggregate the results.
    pub async fn run(&self, selection: &Selection) -> HealthReport {
        let started = Instant::now();

        let runs = self
            .registry
            .select(selection)
            .map(|registration| run_probe(Arc::clone(registration)));
        let entries = join_all(runs).await;

        let report = HealthReport {
            status: aggregate_status(entries.iter().map(|e| e.result.status)),
            total_duration: started.elapsed(),
            entries,
        };

        tracing::debug!(
            selection = ?selection,
            status = %report.status,
            probes = report.entries.len(),
            duration_ms = report.total_duration.as_millis() as u64,
            "Health report complete"
        );
        metrics::record_health_report(report.status, report.total_duration);

        report
    }
}

async fn run_probe(registration: Arc<ProbeRegistration>) -> ReportEntry {
    let started = Instant::now();
    let ctx = registration.context();
    let probe = Arc::clone(&registration.probe);

    let mut task = tokio::spawn(async move { probe.check(&ctx).await });

    let result = match tokio::time::timeout(registration.timeout, &mut task).await {
        Ok(Ok(result)) => result,
        Ok(Err(join_error)) => {
            tracing::error!(probe = %registration.name, error = %join_error, "Probe task failed");
            ProbeResult::failure(registration.failure_status, "probe fault", join_error)
        }
        Err(_) => {
            task.abort();
            tracing::warn!(
                probe = %registration.name,
                timeout_ms = registration.timeout.as_millis() as u64,
                "Probe timed out"
            );
            ProbeResult::timed_out(registration.timeout)
        }
    };
    let duration = started.elapsed();

    if result.status.is_healthy() {
        tracing::debug!(probe = %registration.name, message = %result.message, "Probe healthy");
    } else {
        tracing::warn!(
            probe = %registration.name,
            status = %result.status,
            message = %result.message,
            error = result.error.as_deref().unwrap_or(""),
            "Probe not healthy"
        );
    }
    metrics::record_probe_result(&registration.name, result.status, duration);

    ReportEntry {
        name: registration.name.clone(),
        result,
        duration,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::probe::{Probe, ProbeContext};
    use crate::health::registry::ProbeRegistration;
    use async_trait::async_trait;

    /// Sleeps, then reports a fixed status.
    #[derive(Debug)]
    struct Scripted {
        delay: Duration,
        status: HealthStatus,
    }

    #[async_trait]
    impl Probe for Scripted {
        async fn check(&self, ctx: &ProbeContext) -> ProbeResult {
            tokio::time::sleep(self.delay).await;
            if self.status.is_healthy() {
                ProbeResult::healthy("fine")
            } else {
                ProbeResult::failure(self.status.max(ctx.failure_status), "broken", "scripted failure")
            }
        }
    }

    #[derive(Debug)]
    struct Panics;

    #[async_trait]
    impl Probe for Panics {
        async fn check(&self, _ctx: &ProbeContext) -> ProbeResult {
            panic!("probe exploded");
        }
    }

    fn scripted(name: &str, delay_ms: u64, status: HealthStatus) -> ProbeRegistration {
        ProbeRegistration::new(
            name,
            Arc::new(Scripted {
                delay: Duration::from_millis(delay_ms),
                status,
            }),
        )
        .with_timeout(Duration::from_secs(2))
    }

    fn service(registrations: Vec<ProbeRegistration>) -> HealthCheckService {
        let mut registry = Registry::new();
        for r in registrations {
            registry.register(r).unwrap();
        }
        HealthCheckService::new(Arc::new(registry))
    }

    #[tokio::test]
    async fn test_probes_run_in_parallel() {
        let service = service(vec![
            scripted("a", 200, HealthStatus::Healthy),
            scripted("b", 200, HealthStatus::Healthy),
            scripted("c", 200, HealthStatus::Healthy),
        ]);

        let report = service.run(&Selection::All).await;

        assert_eq!(report.entries.len(), 3);
        assert!(report.total_duration >= Duration::from_millis(200));
        assert!(
            report.total_duration < Duration::from_millis(500),
            "expected ~max, got {:?}",
            report.total_duration
        );
    }

    #[tokio::test]
    async fn test_aggregate_is_worst() {
        let service = service(vec![
            scripted("a", 0, HealthStatus::Healthy),
            scripted("b", 0, HealthStatus::Degraded).with_failure_status(HealthStatus::Degraded),
            scripted("c", 0, HealthStatus::Healthy),
        ]);

        let report = service.run(&Selection::All).await;
        assert_eq!(report.status, HealthStatus::Degraded);
        assert_eq!(
            report.entries.iter().map(|e| e.name.as_str()).collect::<Vec<_>>(),
            vec!["a", "b", "c"]
        );
    }

    #[tokio::test]
    async fn test_empty_selection_is_healthy() {
        let service = service(vec![scripted("a", 0, HealthStatus::Unhealthy)]);

        let report = service.run(&Selection::Tagged("ready".into())).await;
        assert!(report.entries.is_empty());
        assert_eq!(report.status, HealthStatus::Healthy);
    }

    #[tokio::test]
    async fn test_timeout_forces_unhealthy() {
        let service = service(vec![
            scripted("slow", 5_000, HealthStatus::Healthy)
                .with_failure_status(HealthStatus::Degraded)
                .with_timeout(Duration::from_millis(100)),
            scripted("fast", 10, HealthStatus::Healthy),
        ]);

        let started = Instant::now();
        let report = service.run(&Selection::All).await;

        assert!(started.elapsed() < Duration::from_secs(1));
        let slow = report.entry("slow").unwrap();
        assert_eq!(slow.result.status, HealthStatus::Unhealthy);
        assert!(slow.result.error.is_some());
        assert_eq!(report.entry("fast").unwrap().result.status, HealthStatus::Healthy);
        assert_eq!(report.status, HealthStatus::Unhealthy);
    }

    #[tokio::test]
    async fn test_panic_uses_failure_policy() {
        let service = service(vec![
            ProbeRegistration::new("boom", Arc::new(Panics)).with_failure_status(HealthStatus::Degraded),
        ]);

        let report = service.run(&Selection::All).await;
        let entry = report.entry("boom").unwrap();
        assert_eq!(entry.result.status, HealthStatus::Degraded);
        assert!(entry.result.error.is_some());
    }
}
