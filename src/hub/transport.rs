//! HTTP plumbing over dialed connections.
//!
//! # Responsibilities
//! - One request/response exchange on a fresh connection
//! - A pooled `hyper_util` client whose connector is the hub dialer
//!
//! # Design Decisions
//! - All framing is hyper's; this module only moves connections around
//! - The per-exchange connection task is detached and ends with the connection

use hyper::body::{Body, Incoming};
use hyper::{Request, Response};
use hyper_util::client::legacy::Client;
use hyper_util::rt::{TokioExecutor, TokioIo};

use crate::hub::dialer::Dialer;
use crate::hub::HubError;
use crate::observability::metrics;

/// Send `request` over a newly dialed connection and wait for the response head.
pub async fn round_trip<B>(dialer: &Dialer, request: Request<B>) -> Result<Response<Incoming>, HubError>
where
    B: Body + Send + 'static,
    B::Data: Send,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let result = exchange(dialer, request).await;
    metrics::record_round_trip(result.is_ok());
    result
}

async fn exchange<B>(dialer: &Dialer, request: Request<B>) -> Result<Response<Incoming>, HubError>
where
    B: Body + Send + 'static,
    B::Data: Send,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let conn = dialer.dial().await?;
    let id = conn.id();

    let (mut sender, connection) = hyper::client::conn::http1::handshake(TokioIo::new(conn)).await?;
    tokio::spawn(async move {
        if let Err(err) = connection.await {
            tracing::debug!(connection_id = %id, error = %err, "Round-trip connection failed");
        }
    });

    tracing::debug!(
        connection_id = %id,
        method = %request.method(),
        uri = %request.uri(),
        "Round trip"
    );
    let response = sender.send_request(request).await?;
    Ok(response)
}

/// A pooled HTTP client that reaches the hub's listener for every URI.
pub fn client<B>(dialer: Dialer) -> Client<Dialer, B>
where
    B: Body + Send,
    B::Data: Send,
{
    Client::builder(TokioExecutor::new()).build(dialer)
}
