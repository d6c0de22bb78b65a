//! Built-in probe kinds.

pub mod database;
pub mod filesystem;
pub mod http;

pub use database::DatabaseProbe;
pub use filesystem::FileWriteProbe;
pub use http::HttpProbe;
