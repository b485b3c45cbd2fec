//! In-process HTTP plumbing.
//!
//! Splices an HTTP client and server together inside one process through
//! in-memory connections that behave like sockets: reads honor absolute
//! deadlines, writes block on a bounded buffer, and close propagates EOF.
//!
//! ```text
//!  client ──dial──▶ Hub ──pair──▶ Listener ──accept──▶ server
//!    ▲                                                   │
//!    └──────────── Connection ◀══════▶ Connection ◀──────┘
//! ```

pub mod config;
pub mod hub;
pub mod net;
pub mod observability;

pub use config::HubConfig;
pub use hub::{Dialer, Hub, HubError};
pub use net::{Connection, ConnError, Listener};
