//! healthgate: dependency health reporting behind a request-rate gate.
//!
//! ```text
//!                        ┌──────────────────────────────────────────────┐
//!     Client Request     │  request id → trace → timeout → rate gate    │
//!     ───────────────────┼─▶                                  │         │
//!                        │                 429 ◀──── denied ──┤         │
//!                        │                                    ▼         │
//!                        │   /health/ready   /health/live   /status     │
//!                        │          │              │                    │
//!                        │          ▼              ▼                    │
//!                        │   ┌────────────────────────────┐            │
//!                        │   │ registry → scheduler        │───▶ probes │──▶ filesystem,
//!                        │   │ (parallel, per-probe budget)│            │    http, database
//!                        │   └─────────────┬──────────────┘            │
//!                        │                 ▼                            │
//!     Client Response    │   worst severity → status code → JSON body   │
//!     ◀──────────────────┼──                                            │
//!                        └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use healthgate::config::{load_config, ServiceConfig};
use healthgate::http::HttpServer;
use healthgate::lifecycle::signals::wait_for_signal;
use healthgate::observability::{logging, metrics};

/// Dependency health reporting service
#[derive(Parser, Debug)]
#[command(name = "healthgate", version, about)]
struct Args {
    /// Path to the TOML configuration file (defaults apply when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => ServiceConfig::default(),
    };

    logging::init_logging(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "healthgate starting");
    tracing::info!(
        config = ?args.config,
        bind_address = %config.listener.bind_address,
        probes = config.probes.len(),
        rate_limit = config.rate_limit.enabled,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr)?,
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let local_addr = listener.local_addr()?;
    tracing::info!(address = %local_addr, "Listening for connections");

    let server = HttpServer::from_config(config)?;
    server.run(listener, wait_for_signal()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
