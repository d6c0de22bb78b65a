//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → rate_limit.rs (client id, matching rules, fixed-window counters)
//!     → admit, or 429 before any health work runs
//!
//! Background:
//!     → rate_limit.rs sweeper (drop expired counters)
//! ```
//!
//! # Design Decisions
//! - Counter store and clock are ports; tests swap in MockClock and failing stores
//! - Store failures follow an explicit fail-open/fail-closed policy

pub mod clock;
pub mod rate_limit;

pub use clock::{Clock, MockClock, SystemClock};
pub use rate_limit::{
    CounterStore, EndpointPattern, MemoryCounterStore, RateDecision, RateGate, RateRule, RateViolation,
};
