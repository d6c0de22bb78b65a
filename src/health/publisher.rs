//! Periodic health publishing.
//!
//! # Responsibilities
//! - Run every registered probe on a fixed interval
//! - Log the aggregate and each non-healthy entry
//! - Record the outcome as metrics
//!
//! Nothing is retained between runs.

use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time;

use crate::config::PublisherConfig;
use crate::health::registry::Selection;
use crate::health::scheduler::{HealthCheckService, HealthReport};

pub struct HealthPublisher {
    service: HealthCheckService,
    config: PublisherConfig,
}

impl HealthPublisher {
    /// Create a publisher.
    pub fn new(service: HealthCheckService, config: PublisherConfig) -> Self {
        Self { service, config }
    }

    /// Publish on every tick until shutdown; returns at once when disabled.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        if !self.config.enabled {
            tracing::info!("Health publisher disabled");
            return;
        }

        tracing::info!(
            interval = self.config.interval_secs,
            probes = self.service.registry().len(),
            "Health publisher starting"
        );

        let mut ticker = time::interval(Duration::from_secs(self.config.interval_secs));
        // The first tick completes immediately; skip it so startup is not slowed by probes.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let report = self.service.run(&Selection::All).await;
                    publish(&report);
                }
                _ = shutdown.recv() => {
                    tracing::info!("Health publisher received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }
}

fn publish(report: &HealthReport) {
    let unhealthy: Vec<&str> = report
        .entries
        .iter()
        .filter(|e| !e.result.status.is_healthy())
        .map(|e| e.name.as_str())
        .collect();

    if unhealthy.is_empty() {
        tracing::info!(
            status = %report.status,
            probes = report.entries.len(),
            duration_ms = report.total_duration.as_millis() as u64,
            "Health report published"
        );
    } else {
        tracing::warn!(
            status = %report.status,
            probes = report.entries.len(),
            failing = ?unhealthy,
            duration_ms = report.total_duration.as_millis() as u64,
            "Health report published"
        );
    }
}
