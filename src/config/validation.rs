//! Configuration validation.
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: HubConfig → Result<(), Vec<ValidationError>>
//! - Runs before a config is accepted by a hub

use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::HubConfig;

/// A single semantic problem in a [`HubConfig`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.backlog must be at least 1")]
    ZeroBacklog,

    #[error("connection.capacity must be at least 1")]
    ZeroCapacity,

    #[error("listener.address {0:?} is not a socket address")]
    InvalidAddress(String),
}

/// Check a configuration, collecting every problem found.
pub fn validate_config(config: &HubConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.backlog == 0 {
        errors.push(ValidationError::ZeroBacklog);
    }
    if config.connection.capacity == 0 {
        errors.push(ValidationError::ZeroCapacity);
    }
    if config.listener.address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress(config.listener.address.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert_eq!(validate_config(&HubConfig::default()), Ok(()));
    }

    #[test]
    fn reports_every_problem() {
        let mut config = HubConfig::default();
        config.listener.backlog = 0;
        config.connection.capacity = 0;
        config.listener.address = "localhost".into();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::ZeroBacklog,
                ValidationError::ZeroCapacity,
                ValidationError::InvalidAddress("localhost".into()),
            ]
        );
    }
}
