//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware order)
//!     → request.rs (request id, request span)
//!     → security::rate_limit (admit or 429)
//!     → health endpoint / status handler
//!     → response.rs (JSON, no-cache headers)
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{RequestId, RequestIdExt, X_REQUEST_ID};
pub use server::HttpServer;
