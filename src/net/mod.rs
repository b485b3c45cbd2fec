//! In-memory network layer.
//!
//! # Data Flow
//! ```text
//! Hub::dial
//!     → connection.rs (cross-wired endpoint pair)
//!     → listener.rs (server end queued, backlog enforced)
//!     → accept hands server end to the HTTP server
//!
//! Each direction of a pair:
//!     channel.rs (deadlines, EOF) on top of queue.rs (bounded FIFO)
//! ```
//!
//! # Design Decisions
//! - One generic bounded queue backs both messages and the accept backlog
//! - Backpressure instead of unbounded growth or silent drops
//! - Only close and deadlines cancel a pending operation

pub mod channel;
pub mod connection;
pub mod error;
pub mod listener;
pub mod queue;

pub use channel::Channel;
pub use connection::{Connection, ConnectionHandle, ConnectionId, DEFAULT_ADDR};
pub use error::ConnError;
pub use listener::Listener;
