//! Fixed-window rate limiting per client and rule.
//!
//! # Decision
//! ```text
//! request (client, method, path)
//!     → rules whose pattern matches, in declaration order
//!     → counter[(client, pattern)]: reset if window elapsed, then +1
//!     → first counter above max_requests → deny (429), later rules untouched
//! ```
//!
//! Counters live in a `DashMap`; the entry guard serializes the
//! read-check-increment for one key without a global lock.

use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{HeaderName, Method, Request},
    middleware::Next,
    response::Response,
};
use dashmap::DashMap;
use thiserror::Error;

use crate::config::{RateLimitConfig, RateRuleConfig};
use crate::http::response;
use crate::observability::metrics;
use crate::security::clock::{Clock, SystemClock};

/// Error type for endpoint pattern parsing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    #[error("pattern is empty")]
    Empty,

    #[error("path '{0}' must start with '/' or be '*'")]
    MissingSlash(String),

    #[error("unknown method '{0}'")]
    InvalidMethod(String),

    #[error("wildcard is only allowed at the end of '{0}'")]
    MisplacedWildcard(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum PathPattern {
    Any,
    Exact(String),
    Prefix(String),
}

/// Endpoint selector: `[method:]path`, where path is `*`, `/exact` or `/prefix*`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointPattern {
    raw: String,
    method: Option<Method>,
    path: PathPattern,
}

impl EndpointPattern {
    /// Normalized source text; also the counter key.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Check whether a request falls under this pattern.
    pub fn matches(&self, method: &Method, path: &str) -> bool {
        if let Some(expected) = &self.method {
            if expected != method {
                return false;
            }
        }
        match &self.path {
            PathPattern::Any => true,
            PathPattern::Exact(exact) => path == exact,
            PathPattern::Prefix(prefix) => path.starts_with(prefix.as_str()),
        }
    }
}

impl FromStr for EndpointPattern {
    type Err = PatternError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        if raw.is_empty() {
            return Err(PatternError::Empty);
        }

        let (method, path) = if raw.starts_with('/') || raw == "*" {
            (None, raw)
        } else {
            let (method, path) = raw
                .split_once(':')
                .ok_or_else(|| PatternError::MissingSlash(raw.to_string()))?;
            let method = match method.trim() {
                "*" => None,
                m => Some(
                    Method::from_bytes(m.to_ascii_uppercase().as_bytes())
                        .map_err(|_| PatternError::InvalidMethod(m.to_string()))?,
                ),
            };
            (method, path.trim())
        };

        let path = if path == "*" {
            PathPattern::Any
        } else if !path.starts_with('/') {
            return Err(PatternError::MissingSlash(path.to_string()));
        } else if let Some(prefix) = path.strip_suffix('*') {
            if prefix.contains('*') {
                return Err(PatternError::MisplacedWildcard(path.to_string()));
            }
            PathPattern::Prefix(prefix.to_string())
        } else if path.contains('*') {
            return Err(PatternError::MisplacedWildcard(path.to_string()));
        } else {
            PathPattern::Exact(path.to_string())
        };

        Ok(Self {
            raw: raw.to_string(),
            method,
            path,
        })
    }
}

impl fmt::Display for EndpointPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// A request budget for one endpoint pattern.
#[derive(Debug, Clone)]
pub struct RateRule {
    pub pattern: EndpointPattern,
    pub window: Duration,
    pub max_requests: u64,
}

impl RateRule {
    /// Create a rule.
    pub fn new(pattern: EndpointPattern, window: Duration, max_requests: u64) -> Self {
        Self {
            pattern,
            window,
            max_requests,
        }
    }

    /// Parse a configured rule.
    pub fn from_config(config: &RateRuleConfig) -> Result<Self, PatternError> {
        Ok(Self::new(
            config.endpoint.parse()?,
            Duration::from_secs(config.window_secs),
            config.max_requests,
        ))
    }
}

/// Counter identity: one per (client, rule pattern).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CounterKey {
    pub client: String,
    pub rule: String,
}

impl CounterKey {
    /// Create a counter key.
    pub fn new(client: impl Into<String>, rule: impl Into<String>) -> Self {
        Self {
            client: client.into(),
            rule: rule.into(),
        }
    }
}

/// A fixed window and the hits counted in it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateCounter {
    pub window_start: Instant,
    pub window: Duration,
    pub count: u64,
}

impl RateCounter {
    fn new(now: Instant, window: Duration) -> Self {
        Self {
            window_start: now,
            window,
            count: 0,
        }
    }

    /// Check whether the window has elapsed at `now`.
    pub fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.window_start) >= self.window
    }

    /// Time until the window resets.
    pub fn remaining(&self, now: Instant) -> Duration {
        self.window
            .saturating_sub(now.saturating_duration_since(self.window_start))
    }
}

/// Error type for counter storage.
#[derive(Debug, Error)]
pub enum RateStoreError {
    #[error("counter store unavailable: {0}")]
    Unavailable(String),
}

/// Port for counter storage.
pub trait CounterStore: Send + Sync + fmt::Debug {
    /// Count one hit for `key` and return the counter after the increment.
    ///
    /// The reset-then-increment must be atomic per key.
    fn hit(&self, key: &CounterKey, window: Duration, now: Instant) -> Result<RateCounter, RateStoreError>;

    /// Drop counters whose window has elapsed; returns how many were removed.
    fn purge_expired(&self, now: Instant) -> usize;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-process counter store.
#[derive(Debug, Default)]
pub struct MemoryCounterStore {
    counters: DashMap<CounterKey, RateCounter>,
}

impl MemoryCounterStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl CounterStore for MemoryCounterStore {
    fn hit(&self, key: &CounterKey, window: Duration, now: Instant) -> Result<RateCounter, RateStoreError> {
        let mut counter = self
            .counters
            .entry(key.clone())
            .or_insert_with(|| RateCounter::new(now, window));
        if counter.is_expired(now) {
            *counter = RateCounter::new(now, window);
        }
        counter.count += 1;
        Ok(*counter)
    }

    fn purge_expired(&self, now: Instant) -> usize {
        let before = self.counters.len();
        self.counters.retain(|_, counter| !counter.is_expired(now));
        before.saturating_sub(self.counters.len())
    }

    fn len(&self) -> usize {
        self.counters.len()
    }
}

/// Details of a denied request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateViolation {
    pub rule: String,
    pub max_requests: u64,
    pub window: Duration,
    pub retry_after: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RateDecision {
    Allow,
    Deny(RateViolation),
}

impl RateDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateDecision::Allow)
    }
}

/// Error type for building the gate.
#[derive(Debug, Error)]
pub enum RateGateError {
    #[error("rate rule '{endpoint}': {source}")]
    Rule {
        endpoint: String,
        #[source]
        source: PatternError,
    },

    #[error("invalid client id header '{0}'")]
    ClientIdHeader(String),
}

/// Admission decisions for inbound requests.
#[derive(Debug)]
pub struct RateGate {
    rules: Vec<RateRule>,
    store: Arc<dyn CounterStore>,
    clock: Arc<dyn Clock>,
    fail_open: bool,
    client_id_header: Option<HeaderName>,
}

impl RateGate {
    /// Create a fail-open gate with no client id header.
    pub fn new(rules: Vec<RateRule>, store: Arc<dyn CounterStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            rules,
            store,
            clock,
            fail_open: true,
            client_id_header: None,
        }
    }

    /// Admit (true) or deny (false) when the counter store fails.
    pub fn with_fail_open(mut self, fail_open: bool) -> Self {
        self.fail_open = fail_open;
        self
    }

    /// Read the client identity from `header` when present.
    pub fn with_client_id_header(mut self, header: HeaderName) -> Self {
        self.client_id_header = Some(header);
        self
    }

    /// Build the gate from configuration with an in-memory store.
    pub fn from_config(config: &RateLimitConfig) -> Result<Self, RateGateError> {
        let rules = config
            .rules
            .iter()
            .map(|rule| {
                RateRule::from_config(rule).map_err(|source| RateGateError::Rule {
                    endpoint: rule.endpoint.clone(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut gate = Self::new(rules, Arc::new(MemoryCounterStore::new()), Arc::new(SystemClock))
            .with_fail_open(config.fail_open);
        if let Some(name) = &config.client_id_header {
            let header = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| RateGateError::ClientIdHeader(name.clone()))?;
            gate = gate.with_client_id_header(header);
        }
        Ok(gate)
    }

    /// Get the configured rules.
    pub fn rules(&self) -> &[RateRule] {
        &self.rules
    }

    /// Count the request against matching rules in declaration order.
    ///
    /// The first exceeded rule denies the request; later rules are not counted.
    pub fn check(&self, client: &str, method: &Method, path: &str) -> RateDecision {
        let now = self.clock.now();

        for rule in self.rules.iter().filter(|r| r.pattern.matches(method, path)) {
            let key = CounterKey::new(client, rule.pattern.as_str());
            match self.store.hit(&key, rule.window, now) {
                Ok(counter) if counter.count > rule.max_requests => {
                    return RateDecision::Deny(RateViolation {
                        rule: rule.pattern.to_string(),
                        max_requests: rule.max_requests,
                        window: rule.window,
                        retry_after: counter.remaining(now),
                    });
                }
                Ok(_) => {}
                Err(e) => {
                    metrics::record_rate_store_error();
                    if self.fail_open {
                        tracing::warn!(client = %client, rule = %rule.pattern, error = %e, "Counter store failed, admitting request");
                    } else {
                        tracing::error!(client = %client, rule = %rule.pattern, error = %e, "Counter store failed, denying request");
                        return RateDecision::Deny(RateViolation {
                            rule: rule.pattern.to_string(),
                            max_requests: rule.max_requests,
                            window: rule.window,
                            retry_after: rule.window,
                        });
                    }
                }
            }
        }

        RateDecision::Allow
    }

    /// Identify the caller: configured header, then peer IP.
    pub fn client_id<B>(&self, request: &Request<B>) -> String {
        let from_header = self.client_id_header.as_ref().and_then(|name| {
            request
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
        });
        if let Some(id) = from_header {
            return id.to_string();
        }

        request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string())
            .unwrap_or_else(|| "anonymous".to_string())
    }

    /// Drop expired counters; returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        self.store.purge_expired(self.clock.now())
    }

    /// Number of live counters.
    pub fn tracked_counters(&self) -> usize {
        self.store.len()
    }
}

/// Middleware admitting or rejecting requests before any handler runs.
pub async fn rate_limit_middleware(
    State(gate): State<Arc<RateGate>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let client = gate.client_id(&request);

    match gate.check(&client, request.method(), request.uri().path()) {
        RateDecision::Allow => next.run(request).await,
        RateDecision::Deny(violation) => {
            tracing::warn!(
                client = %client,
                rule = %violation.rule,
                path = %request.uri().path(),
                retry_after_secs = violation.retry_after.as_secs(),
                "Rate limit exceeded"
            );
            metrics::record_rate_limited(&violation.rule);
            response::rate_limited(&violation)
        }
    }
}

/// Periodically drop expired counters until shutdown.
pub async fn run_sweeper(
    gate: Arc<RateGate>,
    interval: Duration,
    mut shutdown: tokio::sync::broadcast::Receiver<()>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let removed = gate.purge_expired();
                if removed > 0 {
                    tracing::debug!(removed, remaining = gate.tracked_counters(), "Expired rate counters purged");
                }
            }
            _ = shutdown.recv() => {
                tracing::debug!("Rate counter sweeper stopping");
                break;
            }
        }
    }
}
