//! In-memory listener with a bounded accept queue.
//!
//! # Responsibilities
//! - Queue server-side endpoints produced by dials
//! - Hand them to `accept` in dial order
//! - Enforce the backlog via blocking or fail-fast enqueue
//! - Terminal close visible to every pending and future `accept`
//!
//! # Design Decisions
//! - Close does not drain: endpoints still queued are closed on the spot,
//!   so their dialers see EOF and `accept` reports `Closed` at once

use std::future::poll_fn;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use crate::config::{EnqueuePolicy, ListenerConfig};
use crate::net::connection::{Connection, DEFAULT_ADDR};
use crate::net::error::ConnError;
use crate::net::queue::{BoundedQueue, TryPushError};
use crate::observability::metrics;

/// Accept side of the hub.
///
/// Clones share one queue; closing any clone closes them all.
#[derive(Debug, Clone)]
pub struct Listener {
    queue: Arc<BoundedQueue<Connection>>,
    addr: SocketAddr,
}

impl Listener {
    /// Create a listener holding at most `backlog` unaccepted connections.
    pub fn new(backlog: usize) -> Self {
        Self {
            queue: Arc::new(BoundedQueue::new(backlog)),
            addr: DEFAULT_ADDR,
        }
    }

    /// Create a listener from configuration, falling back to the default
    /// address if the configured one does not parse.
    pub fn from_config(config: &ListenerConfig) -> Self {
        let addr = config.address.parse().unwrap_or(DEFAULT_ADDR);
        Self::new(config.backlog).with_addr(addr)
    }

    pub fn with_addr(mut self, addr: SocketAddr) -> Self {
        self.addr = addr;
        self
    }

    /// Wait for the next dialed connection.
    ///
    /// Returns [`ConnError::Closed`] once the listener is closed.
    pub async fn accept(&self) -> Result<Connection, ConnError> {
        let conn = poll_fn(|cx| self.queue.poll_pop(cx))
            .await
            .ok_or(ConnError::Closed)?;

        metrics::record_accept();
        tracing::debug!(connection_id = %conn.id(), pending = self.queue.len(), "Connection accepted");
        Ok(conn)
    }

    /// Stop accepting and close every connection still queued.
    /// Safe to call any number of times.
    pub fn close(&self) {
        if let Some(orphans) = self.queue.close_and_take() {
            tracing::debug!(address = %self.addr, dropped = orphans.len(), "Listener closed");
            for conn in orphans {
                conn.close();
            }
        }
    }

    pub fn is_closed(&self) -> bool {
        self.queue.is_closed()
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Connections dialed but not yet accepted.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn backlog(&self) -> usize {
        self.queue.capacity()
    }

    /// Queue a server-side endpoint for `accept`.
    pub(crate) async fn enqueue(&self, conn: Connection, policy: EnqueuePolicy) -> Result<(), ConnError> {
        match policy {
            EnqueuePolicy::Block => {
                let mut slot = Some(conn);
                poll_fn(|cx| self.queue.poll_push(cx, &mut slot)).await
            }
            EnqueuePolicy::FailFast => self.queue.try_push(conn).map_err(|err| match err {
                TryPushError::Full(_) => ConnError::QueueFull,
                TryPushError::Closed(_) => ConnError::Closed,
            }),
        }
    }
}

impl axum::serve::Listener for Listener {
    type Io = Connection;
    type Addr = SocketAddr;

    /// Never resolves once the listener is closed; axum has no way to
    /// stop a serve loop from its listener.
    async fn accept(&mut self) -> (Self::Io, Self::Addr) {
        let this: &Listener = self;
        match this.accept().await {
            Ok(conn) => {
                let addr = conn.remote_addr();
                (conn, addr)
            }
            Err(err) => {
                tracing::debug!(error = %err, "Listener closed, serve loop idles");
                std::future::pending().await
            }
        }
    }

    fn local_addr(&self) -> io::Result<Self::Addr> {
        Ok(self.addr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConnectionConfig;
    use std::time::Duration;

    fn server_end() -> Connection {
        let (_client, server) = Connection::pair(&ConnectionConfig::default());
        server
    }

    #[tokio::test]
    async fn accept_returns_enqueued_connection() {
        let listener = Listener::new(2);
        let conn = server_end();
        let id = conn.id();

        listener.enqueue(conn, EnqueuePolicy::Block).await.unwrap();
        assert_eq!(listener.pending(), 1);

        let accepted = listener.accept().await.unwrap();
        assert_eq!(accepted.id(), id);
        assert_eq!(listener.pending(), 0);
    }

    #[tokio::test]
    async fn accept_on_closed_listener_fails() {
        let listener = Listener::new(1);
        listener.close();
        listener.close();
        assert!(listener.is_closed());
        assert_eq!(listener.accept().await.unwrap_err(), ConnError::Closed);
    }

    #[tokio::test]
    async fn close_tears_down_queued_connections() {
        let listener = Listener::new(2);
        let (client, server) = Connection::pair(&ConnectionConfig::default());
        listener.enqueue(server, EnqueuePolicy::Block).await.unwrap();
        listener.close();

        assert_eq!(listener.pending(), 0);
        assert!(client.is_closed());
        assert_eq!(listener.accept().await.unwrap_err(), ConnError::Closed);
    }

    #[tokio::test]
    async fn close_wakes_pending_accept() {
        let listener = Listener::new(1);
        let pending = {
            let listener = listener.clone();
            tokio::spawn(async move { listener.accept().await.map(|c| c.id()) })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!pending.is_finished());

        listener.close();
        assert_eq!(pending.await.unwrap(), Err(ConnError::Closed));
    }

    #[tokio::test]
    async fn enqueue_after_close_fails_under_both_policies() {
        let listener = Listener::new(1);
        listener.close();

        for policy in [EnqueuePolicy::Block, EnqueuePolicy::FailFast] {
            assert_eq!(listener.enqueue(server_end(), policy).await, Err(ConnError::Closed));
        }
    }

    #[tokio::test]
    async fn fail_fast_reports_full_backlog() {
        let listener = Listener::new(1);
        listener.enqueue(server_end(), EnqueuePolicy::FailFast).await.unwrap();
        assert_eq!(
            listener.enqueue(server_end(), EnqueuePolicy::FailFast).await,
            Err(ConnError::QueueFull)
        );
    }

    #[tokio::test]
    async fn unaccepted_connection_closed_on_drop() {
        let listener = Listener::new(1);
        let (client, server) = Connection::pair(&ConnectionConfig::default());
        listener.enqueue(server, EnqueuePolicy::Block).await.unwrap();

        drop(listener);
        assert!(client.is_closed());
    }

    #[test]
    fn config_address_is_used() {
        let mut config = ListenerConfig::default();
        config.address = "192.168.1.10:9000".into();
        config.backlog = 3;

        let listener = Listener::from_config(&config);
        assert_eq!(listener.addr(), "192.168.1.10:9000".parse().unwrap());
        assert_eq!(listener.backlog(), 3);
    }
}
