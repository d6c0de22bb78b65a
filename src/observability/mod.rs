//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Health engine, rate gate, HTTP layer produce:
//!     → logging.rs (structured log events, request_id span field)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → stdout (pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape)
//! ```

pub mod logging;
pub mod metrics;
