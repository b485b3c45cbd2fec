//! Dial/accept bridge between an HTTP client and server in one process.
//!
//! # Data Flow
//! ```text
//! client ─▶ Dialer::dial ─▶ Connection::pair
//!                              │ server end
//!                              ▼
//!                        Listener queue ─▶ accept ─▶ HTTP server
//!              client end ◀────┘
//! ```
//!
//! # Design Decisions
//! - One listener per hub; every dial targets it, whatever the URI
//! - Backpressure by default: a dial waits while the backlog is full
//! - Closing the hub closes the listener; open connections stay usable

pub mod dialer;
pub mod transport;

use hyper::body::{Body, Incoming};
use hyper::{Request, Response};
use hyper_util::client::legacy::Client;
use thiserror::Error;

use crate::config::validation::validate_config;
use crate::config::{ConfigError, HubConfig};
use crate::net::{Connection, ConnError, Listener};

pub use dialer::Dialer;

/// Error returned by [`Hub::round_trip`].
#[derive(Debug, Error)]
pub enum HubError {
    /// Dialing the listener failed.
    #[error(transparent)]
    Conn(#[from] ConnError),

    /// The HTTP exchange itself failed.
    #[error("HTTP exchange failed: {0}")]
    Http(#[from] hyper::Error),
}

/// Bridges an HTTP client and an HTTP server without a network.
///
/// Hand [`Hub::listener`] to the server and use [`Hub::client`],
/// [`Hub::round_trip`] or [`Hub::dial`] on the client side.
#[derive(Debug, Clone)]
pub struct Hub {
    listener: Listener,
    dialer: Dialer,
}

impl Hub {
    /// Create a hub with the default configuration.
    pub fn new() -> Self {
        Self::build(&HubConfig::default())
    }

    /// Create a hub from a configuration, validating it first.
    pub fn with_config(config: HubConfig) -> Result<Self, ConfigError> {
        validate_config(&config).map_err(ConfigError::Validation)?;
        Ok(Self::build(&config))
    }

    fn build(config: &HubConfig) -> Self {
        let listener = Listener::from_config(&config.listener);
        let dialer = Dialer::new(listener.clone(), config.connection, config.listener.enqueue);

        tracing::debug!(
            address = %listener.addr(),
            backlog = config.listener.backlog,
            enqueue = ?config.listener.enqueue,
            capacity = config.connection.capacity,
            "Hub created"
        );

        Self { listener, dialer }
    }

    /// The listener the server side should accept from.
    pub fn listener(&self) -> Listener {
        self.listener.clone()
    }

    /// A dialer for client-side transports.
    pub fn dialer(&self) -> Dialer {
        self.dialer.clone()
    }

    /// Open a connection to the listener.
    pub async fn dial(&self) -> Result<Connection, ConnError> {
        self.dialer.dial().await
    }

    /// One HTTP/1.1 request/response exchange on a fresh connection.
    pub async fn round_trip<B>(&self, request: Request<B>) -> Result<Response<Incoming>, HubError>
    where
        B: Body + Send + 'static,
        B::Data: Send,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        transport::round_trip(&self.dialer, request).await
    }

    /// A pooled HTTP client whose every connection goes through this hub.
    pub fn client<B>(&self) -> Client<Dialer, B>
    where
        B: Body + Send,
        B::Data: Send,
    {
        transport::client(self.dialer())
    }

    /// Close the listener. Pending dials fail; open connections are untouched.
    pub fn close(&self) {
        self.listener.close();
    }

    pub fn is_closed(&self) -> bool {
        self.listener.is_closed()
    }
}

impl Default for Hub {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EnqueuePolicy;
    use std::time::Duration;

    #[test]
    fn invalid_config_is_rejected() {
        let mut config = HubConfig::default();
        config.listener.backlog = 0;
        assert!(matches!(Hub::with_config(config), Err(ConfigError::Validation(_))));
    }

    #[tokio::test]
    async fn backlog_blocks_second_dial_until_accept() {
        let mut config = HubConfig::default();
        config.listener.backlog = 1;
        let hub = Hub::with_config(config).unwrap();

        let first = hub.dial().await.unwrap();
        let second = {
            let hub = hub.clone();
            tokio::spawn(async move { hub.dial().await.map(|c| c.id()) })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!second.is_finished());

        let accepted = hub.listener().accept().await.unwrap();
        assert_eq!(accepted.id(), first.id());

        let second_id = second.await.unwrap().unwrap();
        assert_eq!(hub.listener().accept().await.unwrap().id(), second_id);
    }

    #[tokio::test]
    async fn fail_fast_backlog_rejects_second_dial() {
        let mut config = HubConfig::default();
        config.listener.backlog = 1;
        config.listener.enqueue = EnqueuePolicy::FailFast;
        let hub = Hub::with_config(config).unwrap();

        let _first = hub.dial().await.unwrap();
        assert_eq!(hub.dial().await.unwrap_err(), ConnError::QueueFull);
    }

    #[tokio::test]
    async fn close_releases_blocked_dial() {
        let mut config = HubConfig::default();
        config.listener.backlog = 1;
        let hub = Hub::with_config(config).unwrap();

        let _first = hub.dial().await.unwrap();
        let blocked = {
            let hub = hub.clone();
            tokio::spawn(async move { hub.dial().await.map(|c| c.id()) })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        hub.close();
        assert!(hub.is_closed());
        assert_eq!(blocked.await.unwrap(), Err(ConnError::Closed));
    }
}
