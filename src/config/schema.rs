//! Configuration schema definitions.
//!
//! All types derive Serde traits so a hub can be described in TOML.

use serde::{Deserialize, Serialize};

/// Address reported by every endpoint unless configured otherwise.
pub const DEFAULT_ADDRESS: &str = "127.0.0.1:8080";

/// Root configuration for a [`Hub`](crate::hub::Hub).
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct HubConfig {
    /// Accept queue settings.
    pub listener: ListenerConfig,

    /// Settings applied to every dialed connection pair.
    pub connection: ConnectionConfig,
}

/// Listener (accept queue) configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct ListenerConfig {
    /// Dialed connections that may wait for `accept` at once.
    pub backlog: usize,

    /// What a dial does when the backlog is full.
    pub enqueue: EnqueuePolicy,

    /// Synthetic address reported by the listener and its connections.
    pub address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            backlog: 4,
            enqueue: EnqueuePolicy::Block,
            address: DEFAULT_ADDRESS.to_string(),
        }
    }
}

/// Behavior of a dial against a full backlog.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EnqueuePolicy {
    /// Wait until `accept` frees a slot or the listener closes.
    #[default]
    Block,
    /// Fail the dial with `QueueFull` right away.
    FailFast,
}

/// Per-connection channel configuration.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Undelivered messages each direction may hold before writes block.
    pub capacity: usize,

    /// What a read does with a message longer than its buffer.
    pub oversize: OversizePolicy,
}

impl ConnectionConfig {
    /// Default settings with the given per-direction capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            ..Self::default()
        }
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            capacity: 4,
            oversize: OversizePolicy::Split,
        }
    }
}

/// Handling of a message that does not fit the reader's buffer.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OversizePolicy {
    /// Deliver what fits and keep the rest for the next read.
    #[default]
    Split,
    /// Discard the message and fail the read with `MessageTooLarge`.
    Reject,
}
