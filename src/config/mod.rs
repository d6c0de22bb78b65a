//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ServiceConfig (validated, immutable)
//!     → passed by reference to constructors at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - Any validation error is fatal at startup

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    HealthConfig, HealthEndpointConfig, ListenerConfig, LogFormat, ObservabilityConfig, ProbeConfig,
    ProbeKind, PublisherConfig, RateLimitConfig, RateRuleConfig, ServiceConfig, StatusCodeConfig,
    TimeoutConfig,
};
pub use validation::ValidationError;
