//! Probe registry.
//!
//! Built once at startup, then shared read-only behind an `Arc`. Registrations
//! are handed to the scheduler by reference count, never copied.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use thiserror::Error;
use url::Url;

use crate::config::schema::{ProbeConfig, ProbeKind};
use crate::health::probe::{Probe, ProbeContext};
use crate::health::probes::{DatabaseProbe, FileWriteProbe, HttpProbe};
use crate::health::state::HealthStatus;

/// Errors raised while building the registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("duplicate probe name '{0}'")]
    DuplicateName(String),

    #[error("probe '{name}' has an invalid target: {reason}")]
    InvalidTarget { name: String, reason: String },
}

/// A named probe plus the policy it runs under.
pub struct ProbeRegistration {
    pub name: String,
    pub probe: Arc<dyn Probe>,
    pub tags: BTreeSet<String>,
    pub failure_status: HealthStatus,
    pub timeout: Duration,
}

impl ProbeRegistration {
    /// Create a registration with default policy: Unhealthy on failure, 5 s budget.
    pub fn new(name: impl Into<String>, probe: Arc<dyn Probe>) -> Self {
        Self {
            name: name.into(),
            probe,
            tags: BTreeSet::new(),
            failure_status: HealthStatus::Unhealthy,
            timeout: Duration::from_secs(5),
        }
    }

    /// Replace the tag set.
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Set the severity reported when the dependency fails.
    pub fn with_failure_status(mut self, status: HealthStatus) -> Self {
        self.failure_status = status;
        self
    }

    /// Set the per-run budget.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Check whether the registration carries `tag`.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    pub(crate) fn context(&self) -> ProbeContext {
        ProbeContext {
            name: self.name.clone(),
            failure_status: self.failure_status,
            timeout: self.timeout,
        }
    }
}

impl fmt::Debug for ProbeRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProbeRegistration")
            .field("name", &self.name)
            .field("tags", &self.tags)
            .field("failure_status", &self.failure_status)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

/// Predicate choosing which registrations a report covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Every registered probe.
    All,
    /// Probes carrying the tag.
    Tagged(String),
    /// Probes not carrying the tag.
    Untagged(String),
}

impl Selection {
    /// Readiness selection: probes tagged `ready`.
    pub fn ready() -> Self {
        Selection::Tagged("ready".to_string())
    }

    /// Liveness selection: probes not tagged `ready`.
    pub fn live() -> Self {
        Selection::Untagged("ready".to_string())
    }

    /// Check whether a registration belongs to this selection.
    pub fn matches(&self, registration: &ProbeRegistration) -> bool {
        match self {
            Selection::All => true,
            Selection::Tagged(tag) => registration.has_tag(tag),
            Selection::Untagged(tag) => !registration.has_tag(tag),
        }
    }
}

/// Ordered, name-unique collection of probe registrations.
#[derive(Debug, Default)]
pub struct Registry {
    entries: Vec<Arc<ProbeRegistration>>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a registration, rejecting duplicate names.
    pub fn register(&mut self, registration: ProbeRegistration) -> Result<(), RegistryError> {
        if self.get(&registration.name).is_some() {
            return Err(RegistryError::DuplicateName(registration.name));
        }
        tracing::debug!(
            probe = %registration.name,
            tags = ?registration.tags,
            failure_status = %registration.failure_status,
            timeout_ms = registration.timeout.as_millis() as u64,
            "Probe registered"
        );
        self.entries.push(Arc::new(registration));
        Ok(())
    }

    /// Build probes from configuration, in declaration order.
    pub fn from_config(probes: &[ProbeConfig], default_timeout: Duration) -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        for config in probes {
            let probe = build_probe(config)?;
            let timeout = config
                .timeout_ms
                .map(Duration::from_millis)
                .unwrap_or(default_timeout);
            registry.register(
                ProbeRegistration::new(config.name.clone(), probe)
                    .with_tags(config.tags.iter().cloned())
                    .with_failure_status(config.failure_status)
                    .with_timeout(timeout),
            )?;
        }
        Ok(registry)
    }

    /// Look up a registration by name.
    pub fn get(&self, name: &str) -> Option<&Arc<ProbeRegistration>> {
        self.entries.iter().find(|r| r.name == name)
    }

    /// Registrations matching the selection, in insertion order.
    pub fn select<'a>(&'a self, selection: &'a Selection) -> impl Iterator<Item = &'a Arc<ProbeRegistration>> + 'a {
        self.entries.iter().filter(move |r| selection.matches(r))
    }

    /// Number of registered probes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn build_probe(config: &ProbeConfig) -> Result<Arc<dyn Probe>, RegistryError> {
    let invalid = |reason: String| RegistryError::InvalidTarget {
        name: config.name.clone(),
        reason,
    };

    let probe: Arc<dyn Probe> = match &config.kind {
        ProbeKind::Filesystem { target_path } => Arc::new(FileWriteProbe::new(target_path)),
        ProbeKind::Database { address } => Arc::new(DatabaseProbe::new(address.clone())),
        ProbeKind::Http { url, expected_status } => {
            let url = Url::parse(url).map_err(|e| invalid(e.to_string()))?;
            let expected = expected_status
                .map(StatusCode::from_u16)
                .transpose()
                .map_err(|e| invalid(e.to_string()))?;
            Arc::new(HttpProbe::new(url, expected).map_err(|e| invalid(e.to_string()))?)
        }
    };
    Ok(probe)
}
