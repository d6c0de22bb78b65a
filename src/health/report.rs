//! JSON report shapes.
//!
//! ```text
//! live:  { OverallStatus, TotalChecksDuration }
//! ready: { OverallStatus, TotalChecksDuration,
//!          DependencyHealthChecks: { <name>: { Status, Duration, Exception, Data } } }
//! ```
//!
//! Keys are emitted in the order above. Probe entries keep registry order.
//! Durations are seconds with two decimals.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde::Deserialize;

use crate::health::scheduler::{HealthReport, ReportEntry};

/// Which body a health endpoint renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportShape {
    /// Overall status and duration only.
    Live,
    /// Overall status plus every probe entry.
    Ready,
}

impl ReportShape {
    /// Render the report as pretty-printed JSON.
    pub fn render(&self, report: &HealthReport) -> serde_json::Result<String> {
        match self {
            ReportShape::Live => serde_json::to_string_pretty(&LiveBody::from(report)),
            ReportShape::Ready => serde_json::to_string_pretty(&ReadyBody::from(report)),
        }
    }
}

/// Seconds with exactly two decimal places.
pub fn format_duration(duration: Duration) -> String {
    format!("{:.2}", duration.as_secs_f64())
}

#[derive(serde::Serialize)]
#[serde(rename_all = "PascalCase")]
struct LiveBody {
    overall_status: &'static str,
    total_checks_duration: String,
}

impl From<&HealthReport> for LiveBody {
    fn from(report: &HealthReport) -> Self {
        Self {
            overall_status: report.status.as_str(),
            total_checks_duration: format_duration(report.total_duration),
        }
    }
}

#[derive(serde::Serialize)]
#[serde(rename_all = "PascalCase")]
struct ReadyBody<'a> {
    overall_status: &'static str,
    total_checks_duration: String,
    dependency_health_checks: Entries<'a>,
}

impl<'a> From<&'a HealthReport> for ReadyBody<'a> {
    fn from(report: &'a HealthReport) -> Self {
        Self {
            overall_status: report.status.as_str(),
            total_checks_duration: format_duration(report.total_duration),
            dependency_health_checks: Entries(&report.entries),
        }
    }
}

/// Serializes entries as a JSON object keyed by probe name, preserving order.
struct Entries<'a>(&'a [ReportEntry]);

impl Serialize for Entries<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for entry in self.0 {
            map.serialize_entry(&entry.name, &EntryBody::from(entry))?;
        }
        map.end()
    }
}

#[derive(serde::Serialize)]
#[serde(rename_all = "PascalCase")]
struct EntryBody<'a> {
    status: &'static str,
    duration: String,
    exception: Option<&'a str>,
    data: &'a BTreeMap<String, String>,
}

impl<'a> From<&'a ReportEntry> for EntryBody<'a> {
    fn from(entry: &'a ReportEntry) -> Self {
        Self {
            status: entry.result.status.as_str(),
            duration: format_duration(entry.duration),
            exception: entry.result.error.as_deref(),
            data: &entry.result.data,
        }
    }
}
