//! Full-duplex in-memory connection endpoints.
//!
//! # Responsibilities
//! - Pair two channels into one read/write endpoint
//! - Build cross-wired endpoint pairs
//! - Expose socket-style deadlines, close and addresses
//! - Generate connection IDs for tracing
//!
//! # Wiring
//! ```text
//!  a.write ──▶ channel X ──▶ b.read
//!  a.read  ◀── channel Y ◀── b.write
//! ```

use std::io;
use std::net::{Ipv4Addr, SocketAddr};
use std::ops::Deref;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};

use hyper_util::client::legacy::connect::{Connected, Connection as HyperConnection};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::time::Instant;

use crate::config::ConnectionConfig;
use crate::net::channel::{Channel, DeadlineTimer};

/// Global atomic counter for connection IDs.
/// Using relaxed ordering is sufficient since we only need uniqueness, not synchronization.
static CONNECTION_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Address every endpoint reports unless told otherwise.
pub const DEFAULT_ADDR: SocketAddr = SocketAddr::new(std::net::IpAddr::V4(Ipv4Addr::LOCALHOST), 8080);

/// Identifier shared by the two endpoints of a pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Generate a new unique connection ID.
    pub(crate) fn new() -> Self {
        Self(CONNECTION_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Shared control surface of a [`Connection`].
///
/// Cloneable, so another task can close the connection or move its
/// deadlines while a read or write is pending on it.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    id: ConnectionId,
    read: Arc<Channel>,
    write: Arc<Channel>,
}

impl ConnectionHandle {
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Set or clear (`None`) the read deadline.
    pub fn set_read_deadline(&self, deadline: Option<Instant>) {
        match deadline {
            Some(at) => {
                let remaining = at.saturating_duration_since(Instant::now());
                tracing::trace!(connection_id = %self.id, remaining = ?remaining, "Set read deadline");
            }
            None => tracing::trace!(connection_id = %self.id, "Clear read deadline"),
        }
        self.read.set_read_deadline(deadline);
    }

    /// Set or clear (`None`) the write deadline.
    pub fn set_write_deadline(&self, deadline: Option<Instant>) {
        self.write.set_write_deadline(deadline);
    }

    /// Set both deadlines.
    pub fn set_deadline(&self, deadline: Option<Instant>) {
        self.set_read_deadline(deadline);
        self.set_write_deadline(deadline);
    }

    /// Close both directions. Safe to call any number of times.
    pub fn close(&self) {
        let read_closed = self.read.close();
        let write_closed = self.write.close();
        if read_closed || write_closed {
            tracing::trace!(connection_id = %self.id, "Connection closed");
        }
    }

    /// True once both directions are closed, by either endpoint.
    pub fn is_closed(&self) -> bool {
        self.read.is_closed() && self.write.is_closed()
    }
}

/// One endpoint of an in-memory connection.
///
/// Reads drain the peer's writes in order; writes block while the peer
/// holds `capacity` unread messages. Shutting down the write half lets the
/// peer read to EOF; dropping the endpoint closes both directions.
#[derive(Debug)]
pub struct Connection {
    handle: ConnectionHandle,
    addr: SocketAddr,
    read_timer: DeadlineTimer,
    write_timer: DeadlineTimer,
}

impl Connection {
    /// Build two endpoints whose channels are cross-wired.
    pub fn pair(config: &ConnectionConfig) -> (Connection, Connection) {
        let id = ConnectionId::new();
        let x = Arc::new(Channel::from_config(config));
        let y = Arc::new(Channel::from_config(config));

        let a = Connection::new(id, Arc::clone(&y), Arc::clone(&x));
        let b = Connection::new(id, x, y);
        (a, b)
    }

    fn new(id: ConnectionId, read: Arc<Channel>, write: Arc<Channel>) -> Self {
        Self {
            handle: ConnectionHandle { id, read, write },
            addr: DEFAULT_ADDR,
            read_timer: None,
            write_timer: None,
        }
    }

    /// Report `addr` as both local and remote address.
    pub fn with_addr(mut self, addr: SocketAddr) -> Self {
        self.addr = addr;
        self
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn remote_addr(&self) -> SocketAddr {
        self.addr
    }

    /// A cloneable handle for closing or re-timing this endpoint.
    pub fn handle(&self) -> ConnectionHandle {
        self.handle.clone()
    }
}

impl Deref for Connection {
    type Target = ConnectionHandle;
    fn deref(&self) -> &Self::Target {
        &self.handle
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.handle.close();
    }
}

impl AsyncRead for Connection {
    fn poll_read(self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &mut ReadBuf<'_>) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        this.handle
            .read
            .poll_read(cx, &mut this.read_timer, buf)
            .map_err(io::Error::from)
    }
}

impl AsyncWrite for Connection {
    fn poll_write(self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &[u8]) -> Poll<io::Result<usize>> {
        let this = self.get_mut();
        this.handle
            .write
            .poll_write(cx, &mut this.write_timer, buf)
            .map_err(io::Error::from)
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        self.handle.write.close();
        Poll::Ready(Ok(()))
    }
}

impl HyperConnection for Connection {
    fn connected(&self) -> Connected {
        Connected::new()
    }
}
