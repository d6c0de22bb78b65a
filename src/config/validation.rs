//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Unique probe names, known tags, sane timeouts
//! - Well-formed rate rules and status codes
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServiceConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::{HealthEndpointConfig, ProbeKind, ServiceConfig};
use crate::security::rate_limit::EndpointPattern;

/// Route served by the status handler; health endpoints may not reuse it.
pub const STATUS_PATH: &str = "/status";

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid bind address '{0}'")]
    BindAddress(String),

    #[error("probe at position {0} has an empty name")]
    EmptyProbeName(usize),

    #[error("duplicate probe name '{0}'")]
    DuplicateProbeName(String),

    #[error("probe '{probe}' references unknown tag '{tag}'")]
    UnknownTag { probe: String, tag: String },

    #[error("probe '{0}' has a zero timeout")]
    ZeroTimeout(String),

    #[error("probe '{probe}' timeout of {timeout_ms} ms does not fit in the {request_ms} ms request timeout")]
    TimeoutExceedsRequest {
        probe: String,
        timeout_ms: u64,
        request_ms: u64,
    },

    #[error("probe '{probe}' is misconfigured: {reason}")]
    ProbeTarget { probe: String, reason: String },

    #[error("health endpoint '{path}' is misconfigured: {reason}")]
    HealthEndpoint { path: String, reason: String },

    #[error("rate rule '{endpoint}' is malformed: {reason}")]
    RateRule { endpoint: String, reason: String },

    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },
}

/// Validate a parsed configuration.
pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::Zero { field: "timeouts.request_secs" });
    }
    if config.health.default_timeout_ms == 0 {
        errors.push(ValidationError::Zero { field: "health.default_timeout_ms" });
    }
    if config.health.publisher.enabled && config.health.publisher.interval_secs == 0 {
        errors.push(ValidationError::Zero { field: "health.publisher.interval_secs" });
    }
    if config.rate_limit.enabled && config.rate_limit.sweep_interval_secs == 0 {
        errors.push(ValidationError::Zero { field: "rate_limit.sweep_interval_secs" });
    }

    validate_endpoint(&config.health.ready, &mut errors);
    validate_endpoint(&config.health.live, &mut errors);
    if config.health.ready.path == config.health.live.path {
        errors.push(ValidationError::HealthEndpoint {
            path: config.health.ready.path.clone(),
            reason: "ready and live share a path".to_string(),
        });
    }

    validate_probes(config, &mut errors);
    validate_rate_rules(config, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_endpoint(endpoint: &HealthEndpointConfig, errors: &mut Vec<ValidationError>) {
    let mut fail = |reason: String| {
        errors.push(ValidationError::HealthEndpoint {
            path: endpoint.path.clone(),
            reason,
        })
    };

    if !endpoint.path.starts_with('/') {
        fail("path must start with '/'".to_string());
    }
    if endpoint.path == STATUS_PATH {
        fail(format!("{} is reserved", STATUS_PATH));
    }
    if endpoint.tag.is_empty() {
        fail("tag must not be empty".to_string());
    }
    let codes = &endpoint.status_codes;
    for code in [codes.healthy, codes.degraded, codes.unhealthy] {
        if !(100..=599).contains(&code) {
            fail(format!("invalid status code {}", code));
        }
    }
}

fn validate_probes(config: &ServiceConfig, errors: &mut Vec<ValidationError>) {
    let known_tags: HashSet<&str> = [config.health.ready.tag.as_str(), config.health.live.tag.as_str()]
        .into_iter()
        .chain(config.health.known_tags.iter().map(String::as_str))
        .collect();
    let request_ms = config.timeouts.request_secs.saturating_mul(1000);
    let mut seen = HashSet::new();

    for (index, probe) in config.probes.iter().enumerate() {
        if probe.name.trim().is_empty() {
            errors.push(ValidationError::EmptyProbeName(index));
        } else if !seen.insert(probe.name.as_str()) {
            errors.push(ValidationError::DuplicateProbeName(probe.name.clone()));
        }

        for tag in &probe.tags {
            if !known_tags.contains(tag.as_str()) {
                errors.push(ValidationError::UnknownTag {
                    probe: probe.name.clone(),
                    tag: tag.clone(),
                });
            }
        }

        let timeout_ms = probe.timeout_ms.unwrap_or(config.health.default_timeout_ms);
        if probe.timeout_ms == Some(0) {
            errors.push(ValidationError::ZeroTimeout(probe.name.clone()));
        } else if timeout_ms >= request_ms {
            // Probe budgets must expire before the request timeout does.
            errors.push(ValidationError::TimeoutExceedsRequest {
                probe: probe.name.clone(),
                timeout_ms,
                request_ms,
            });
        }

        let target_error = match &probe.kind {
            ProbeKind::Filesystem { target_path } if target_path.is_empty() => {
                Some("target_path must not be empty".to_string())
            }
            ProbeKind::Database { address } if address.is_empty() || !address.contains(':') => {
                Some(format!("address '{}' must be host:port", address))
            }
            ProbeKind::Http { url, expected_status } => match Url::parse(url) {
                Err(e) => Some(format!("invalid url '{}': {}", url, e)),
                Ok(parsed) if parsed.scheme() != "http" => {
                    Some(format!("unsupported scheme '{}', only http is probed", parsed.scheme()))
                }
                Ok(_) => (*expected_status)
                    .filter(|code| !(100..=599).contains(code))
                    .map(|code| format!("invalid expected_status {}", code)),
            },
            _ => None,
        };
        if let Some(reason) = target_error {
            errors.push(ValidationError::ProbeTarget {
                probe: probe.name.clone(),
                reason,
            });
        }
    }
}

fn validate_rate_rules(config: &ServiceConfig, errors: &mut Vec<ValidationError>) {
    let mut seen = HashSet::new();
    for rule in &config.rate_limit.rules {
        let mut fail = |reason: String| {
            errors.push(ValidationError::RateRule {
                endpoint: rule.endpoint.clone(),
                reason,
            })
        };

        // Counters are keyed by the normalized pattern, so duplicates are too.
        let key = match rule.endpoint.parse::<EndpointPattern>() {
            Ok(pattern) => pattern.as_str().to_string(),
            Err(e) => {
                fail(e.to_string());
                rule.endpoint.trim().to_string()
            }
        };
        if rule.window_secs == 0 {
            fail("window_secs must be greater than zero".to_string());
        }
        if rule.max_requests == 0 {
            fail("max_requests must be greater than zero".to_string());
        }
        if !seen.insert(key) {
            fail("endpoint declared more than once".to_string());
        }
    }
}
