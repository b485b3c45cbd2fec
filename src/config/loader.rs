//! Configuration loading from TOML.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::HubConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[source] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[source] toml::de::Error),
    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<HubConfig, ConfigError> {
    let config: HubConfig = toml::from_str(content).map_err(ConfigError::Parse)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<HubConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    parse_config(&content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{EnqueuePolicy, OversizePolicy};

    #[test]
    fn empty_document_yields_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config, HubConfig::default());
    }

    #[test]
    fn parses_policies() {
        let config = parse_config(
            r#"
            [listener]
            backlog = 1
            enqueue = "fail_fast"

            [connection]
            capacity = 16
            oversize = "reject"
            "#,
        )
        .unwrap();

        assert_eq!(config.listener.backlog, 1);
        assert_eq!(config.listener.enqueue, EnqueuePolicy::FailFast);
        assert_eq!(config.listener.address, "127.0.0.1:8080");
        assert_eq!(config.connection.capacity, 16);
        assert_eq!(config.connection.oversize, OversizePolicy::Reject);
    }

    #[test]
    fn rejects_invalid_values() {
        let err = parse_config("[connection]\ncapacity = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(ref errors) if errors.len() == 1));
        assert_eq!(err.to_string(), "Validation failed: connection.capacity must be at least 1");
    }

    #[test]
    fn rejects_malformed_toml() {
        assert!(matches!(parse_config("[listener"), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_config(Path::new("/nonexistent/fakehttp.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
