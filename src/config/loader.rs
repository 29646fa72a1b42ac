//! Configuration loading from disk.

use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::config::schema::ProxyConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse configuration from TOML text without validating it.
pub fn parse_config(content: &str) -> Result<ProxyConfig, ConfigError> {
    Ok(toml::from_str(content)?)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<ProxyConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config = parse_config(&content)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{HistoryBackend, LogFormat};

    #[test]
    fn test_partial_file_falls_back_to_defaults() {
        let config = parse_config(
            r#"
            [upstream]
            base_url = "http://localhost:11434"
            forward_pull_body = false

            [history]
            backend = "memory"
            capacity = 10

            [observability]
            log_format = "json"
            "#,
        )
        .unwrap();

        assert_eq!(config.upstream.base_url, "http://localhost:11434");
        assert_eq!(config.upstream.generate_path, "/api/generate");
        assert!(!config.upstream.forward_pull_body);
        assert_eq!(config.history.backend, HistoryBackend::Memory);
        assert_eq!(config.history.capacity, 10);
        assert_eq!(config.history.key, "requests");
        assert_eq!(config.observability.log_format, LogFormat::Json);
        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
    }

    #[test]
    fn test_unknown_backend_is_parse_error() {
        let err = parse_config("[history]\nbackend = \"etcd\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = load_config(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_validation_message_lists_fields() {
        let err = ConfigError::Validation(vec![
            ValidationError {
                field: "history.capacity",
                message: "must be > 0".into(),
            },
            ValidationError {
                field: "upstream.pull_path",
                message: "must start with '/'".into(),
            },
        ]);
        assert_eq!(
            err.to_string(),
            "Validation failed: history.capacity: must be > 0, upstream.pull_path: must start with '/'"
        );
    }
}
