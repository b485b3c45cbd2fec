//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! hub / listener / connection produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters)
//! ```
//!
//! # Design Decisions
//! - Channel and queue internals never log; failures are returned to the caller
//! - Connection ID flows through every event about a pair

pub mod logging;
pub mod metrics;
