//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     [[probes]] config
//!     → registry.rs (build probes, enforce unique names)
//!     → Arc<Registry>, read-only from here on
//!
//! Per health request (endpoint.rs):
//!     Selection (tagged / untagged)
//!     → scheduler.rs (run probes concurrently, per-probe timeout)
//!     → state.rs (fold worst severity)
//!     → mapper.rs (severity → status code)
//!     → report.rs (live or ready JSON)
//!
//! Background (publisher.rs):
//!     Interval tick → run all probes → log + metrics
//! ```
//!
//! # Design Decisions
//! - Probes never fail: faults become results at the failure severity
//! - Timeouts are always Unhealthy and never cancel sibling probes
//! - Liveness and readiness share one registry, split by tag

pub mod endpoint;
pub mod mapper;
pub mod probe;
pub mod probes;
pub mod publisher;
pub mod registry;
pub mod report;
pub mod scheduler;
pub mod state;

pub use endpoint::{HealthEndpoint, RenderedReport};
pub use mapper::StatusMapper;
pub use probe::{Probe, ProbeContext};
pub use publisher::HealthPublisher;
pub use registry::{ProbeRegistration, Registry, RegistryError, Selection};
pub use report::ReportShape;
pub use scheduler::{HealthCheckService, HealthReport, ReportEntry};
pub use state::{HealthStatus, ProbeResult};
