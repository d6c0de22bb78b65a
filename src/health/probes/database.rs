//! Database reachability probe.
//!
//! Only the network path to the database endpoint is verified; no query is
//! issued.

use async_trait::async_trait;
use tokio::net::TcpStream;

use crate::health::probe::{Probe, ProbeContext};
use crate::health::state::ProbeResult;

#[derive(Debug, Clone)]
pub struct DatabaseProbe {
    /// `host:port` of the database listener.
    address: String,
}

impl DatabaseProbe {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
        }
    }
}

#[async_trait]
impl Probe for DatabaseProbe {
    async fn check(&self, ctx: &ProbeContext) -> ProbeResult {
        match TcpStream::connect(&self.address).await {
            Ok(stream) => {
                drop(stream);
                ProbeResult::healthy(format!("database at {} accepts connections", self.address))
                    .with_data("address", self.address.as_str())
            }
            Err(e) => {
                tracing::warn!(probe = %ctx.name, address = %self.address, error = %e, "Database unreachable");
                ProbeResult::failure(ctx.failure_status, "connection failed", e)
                    .with_data("address", self.address.as_str())
            }
        }
    }
}
