//! Client side of the hub: turns a dial into a connected endpoint pair.

use std::net::SocketAddr;
use std::task::{Context, Poll};

use futures_util::future::BoxFuture;
use hyper::Uri;
use hyper_util::rt::TokioIo;
use tower::Service;

use crate::config::{ConnectionConfig, EnqueuePolicy};
use crate::net::{Connection, ConnError, Listener};
use crate::observability::metrics;

/// Dials the hub's single implicit peer.
///
/// Also usable as a `hyper_util` legacy client connector; the requested
/// URI is ignored.
#[derive(Debug, Clone)]
pub struct Dialer {
    listener: Listener,
    connection: ConnectionConfig,
    enqueue: EnqueuePolicy,
    addr: SocketAddr,
}

impl Dialer {
    pub(crate) fn new(listener: Listener, connection: ConnectionConfig, enqueue: EnqueuePolicy) -> Self {
        let addr = listener.addr();
        Self {
            listener,
            connection,
            enqueue,
            addr,
        }
    }

    /// Open a new connection and queue its server end on the listener.
    ///
    /// Under [`EnqueuePolicy::Block`] this waits while the backlog is full.
    pub async fn dial(&self) -> Result<Connection, ConnError> {
        let (client, server) = Connection::pair(&self.connection);
        let client = client.with_addr(self.addr);
        let server = server.with_addr(self.addr);
        let id = client.id();

        let queued = self.listener.enqueue(server, self.enqueue).await;
        metrics::record_dial(queued.as_ref().copied());

        match queued {
            Ok(()) => {
                tracing::debug!(connection_id = %id, "Dialed");
                Ok(client)
            }
            Err(err) => {
                tracing::debug!(connection_id = %id, error = %err, "Dial failed");
                Err(err)
            }
        }
    }
}

impl Service<Uri> for Dialer {
    type Response = TokioIo<Connection>;
    type Error = ConnError;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, uri: Uri) -> Self::Future {
        let dialer = self.clone();
        Box::pin(async move {
            tracing::trace!(uri = %uri, "Connector dialing");
            dialer.dial().await.map(TokioIo::new)
        })
    }
}
