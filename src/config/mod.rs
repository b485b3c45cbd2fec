//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! TOML text or file
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → HubConfig (validated, immutable)
//!     → Hub, Listener and every connection pair it dials
//! ```
//!
//! # Design Decisions
//! - Config is immutable once a hub is built
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::ConnectionConfig;
pub use schema::EnqueuePolicy;
pub use schema::HubConfig;
pub use schema::ListenerConfig;
pub use schema::OversizePolicy;
