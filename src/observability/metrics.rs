//! Metrics collection.
//!
//! # Metrics
//! - `fakehttp_dials_total` (counter): dials by result (`ok`, `closed`, `queue_full`)
//! - `fakehttp_accepts_total` (counter): connections handed to `accept`
//! - `fakehttp_round_trips_total` (counter): round trips by result (`ok`, `error`)
//!
//! # Design Decisions
//! - Recorded through the `metrics` facade; without an installed
//!   recorder every call is a no-op
//! - No exporter here, the embedding test harness picks one if it wants

use crate::net::ConnError;

/// Record the outcome of a dial.
pub fn record_dial(result: Result<(), &ConnError>) {
    let result = match result {
        Ok(()) => "ok",
        Err(ConnError::QueueFull) => "queue_full",
        Err(_) => "closed",
    };
    ::metrics::counter!("fakehttp_dials_total", "result" => result).increment(1);
}

/// Record a connection leaving the accept queue.
pub fn record_accept() {
    ::metrics::counter!("fakehttp_accepts_total").increment(1);
}

/// Record the outcome of a round trip.
pub fn record_round_trip(ok: bool) {
    let result = if ok { "ok" } else { "error" };
    ::metrics::counter!("fakehttp_round_trips_total", "result" => result).increment(1);
}
