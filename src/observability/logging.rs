//! Structured logging.
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - Events only at hub, listener and connection boundaries; channels and
//!   queues stay silent
//! - Log level configurable via `RUST_LOG`, default `fakehttp=debug`

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install a fmt subscriber that writes through the test harness.
///
/// Safe to call from every test: only the first call installs anything.
pub fn init() {
    let _ = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "fakehttp=debug".into()))
        .with(tracing_subscriber::fmt::layer().with_test_writer())
        .try_init();
}
