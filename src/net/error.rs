//! Error type shared by channels, connections and the listener.

use std::io;
use thiserror::Error;

/// Failure of a single channel, connection or listener operation.
///
/// End of stream is not an error: a read that observes a closed and
/// drained channel completes with zero bytes, as `std::io` readers do.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnError {
    /// The deadline elapsed before the operation could complete.
    #[error("deadline exceeded")]
    Timeout,

    /// The channel, connection or listener is closed.
    #[error("use of closed connection")]
    Closed,

    /// The listener backlog is full and the hub does not wait for space.
    #[error("listener backlog is full")]
    QueueFull,

    /// A message did not fit the read buffer and was discarded.
    #[error("message of {len} bytes does not fit a {capacity} byte buffer")]
    MessageTooLarge { len: usize, capacity: usize },
}

impl ConnError {
    /// True for [`ConnError::Timeout`].
    pub fn is_timeout(&self) -> bool {
        matches!(self, ConnError::Timeout)
    }
}

impl From<ConnError> for io::Error {
    fn from(err: ConnError) -> Self {
        let kind = match err {
            ConnError::Timeout => io::ErrorKind::TimedOut,
            ConnError::Closed => io::ErrorKind::BrokenPipe,
            ConnError::QueueFull => io::ErrorKind::WouldBlock,
            ConnError::MessageTooLarge { .. } => io::ErrorKind::InvalidData,
        };
        io::Error::new(kind, err)
    }
}
