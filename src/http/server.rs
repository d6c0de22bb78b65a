//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with the health, status and fallback routes
//! - Wire up middleware (request id, tracing, timeout, rate gate)
//! - Spawn background tasks (health publisher, rate counter sweeper)
//! - Serve until the shutdown future resolves, then drain

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::StatusCode,
    middleware,
    response::Response,
    routing::get,
    Router,
};
use tokio::net::TcpListener;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::validation::STATUS_PATH;
use crate::config::ServiceConfig;
use crate::health::{HealthEndpoint, HealthPublisher};
use crate::http::request::request_id_middleware;
use crate::http::response;
use crate::lifecycle::{build_components, Components, Shutdown, StartupError};
use crate::security::rate_limit::{rate_limit_middleware, run_sweeper};

/// HTTP server for health reporting.
pub struct HttpServer {
    router: Router,
    config: ServiceConfig,
    components: Components,
}

impl HttpServer {
    /// Create a server from a validated configuration and its components.
    pub fn new(config: ServiceConfig, components: Components) -> Self {
        let router = Self::build_router(&config, &components);
        Self {
            router,
            config,
            components,
        }
    }

    /// Validate the configuration and build every component.
    pub fn from_config(config: ServiceConfig) -> Result<Self, StartupError> {
        let components = build_components(&config)?;
        Ok(Self::new(config, components))
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// Outermost first: request id → trace → timeout → rate gate → handlers.
    #[allow(deprecated)]
    pub fn build_router(config: &ServiceConfig, components: &Components) -> Router {
        let ready = Router::new()
            .route(&config.health.ready.path, get(health_handler))
            .with_state(Arc::clone(&components.ready));
        let live = Router::new()
            .route(&config.health.live.path, get(health_handler))
            .with_state(Arc::clone(&components.live));

        let mut router = Router::new()
            .route(STATUS_PATH, get(status_handler))
            .merge(ready)
            .merge(live)
            .fallback(not_found);

        if let Some(gate) = &components.rate_gate {
            router = router.layer(middleware::from_fn_with_state(
                Arc::clone(gate),
                rate_limit_middleware,
            ));
        }

        router
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(TraceLayer::new_for_http())
            .layer(middleware::from_fn(request_id_middleware))
    }

    /// Get a clone of the router, for in-process requests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `signal` resolves.
    pub async fn run<F>(self, listener: TcpListener, signal: F) -> Result<(), std::io::Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let shutdown = Shutdown::new();

        let publisher = HealthPublisher::new(
            self.components.service.clone(),
            self.config.health.publisher.clone(),
        );
        let mut tasks = vec![tokio::spawn(publisher.run(shutdown.subscribe()))];

        if let Some(gate) = &self.components.rate_gate {
            let interval = Duration::from_secs(self.config.rate_limit.sweep_interval_secs);
            tasks.push(tokio::spawn(run_sweeper(
                Arc::clone(gate),
                interval,
                shutdown.subscribe(),
            )));
        }

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        let served = axum::serve(listener, app)
            .with_graceful_shutdown(signal)
            .await;

        shutdown.trigger();
        for task in tasks {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "Background task ended abnormally");
            }
        }

        served?;
        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }
}

async fn health_handler(State(endpoint): State<Arc<HealthEndpoint>>) -> Response {
    match endpoint.evaluate().await {
        Ok(rendered) => {
            tracing::debug!(
                status = %rendered.report.status,
                code = rendered.status_code.as_u16(),
                probes = rendered.report.entries.len(),
                "Health report served"
            );
            response::json(rendered.status_code, rendered.body)
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to render health report");
            response::internal_error("failed to render health report")
        }
    }
}

async fn status_handler() -> Response {
    let body = serde_json::json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    });
    response::json(StatusCode::OK, body.to_string())
}

async fn not_found() -> Response {
    let body = serde_json::json!({ "error": "not found" });
    response::json(StatusCode::NOT_FOUND, body.to_string())
}
