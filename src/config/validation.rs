//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses and URLs parse
//! - Validate value ranges (timeouts > 0, capacity > 0, sample rates)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use thiserror::Error;
use url::Url;

use crate::config::schema::{HistoryBackend, ProxyConfig};

/// A single semantic problem found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Check a parsed configuration, collecting every error found.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    let upstream = &config.upstream;
    match Url::parse(&upstream.base_url) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => {}
        Ok(_) => errors.push(ValidationError::new(
            "upstream.base_url",
            "must be an absolute http(s) URL",
        )),
        Err(e) => errors.push(ValidationError::new("upstream.base_url", e.to_string())),
    }
    for (field, path) in [
        ("upstream.generate_path", &upstream.generate_path),
        ("upstream.pull_path", &upstream.pull_path),
    ] {
        if !path.starts_with('/') {
            errors.push(ValidationError::new(field, "must start with '/'"));
        }
    }
    if upstream.connect_timeout_secs == 0 {
        errors.push(ValidationError::new("upstream.connect_timeout_secs", "must be > 0"));
    }
    if upstream.response_timeout_secs == 0 {
        errors.push(ValidationError::new("upstream.response_timeout_secs", "must be > 0"));
    }

    let history = &config.history;
    if history.capacity == 0 {
        errors.push(ValidationError::new("history.capacity", "must be > 0"));
    }
    if history.backend == HistoryBackend::Redis {
        if history.key.is_empty() {
            errors.push(ValidationError::new("history.key", "must not be empty"));
        }
        if redis::parse_redis_url(&history.redis_url).is_none() {
            errors.push(ValidationError::new(
                "history.redis_url",
                format!("'{}' is not a redis URL", history.redis_url),
            ));
        }
    }

    let obs = &config.observability;
    if let Some(endpoint) = &obs.otlp_endpoint {
        if let Err(e) = Url::parse(endpoint) {
            errors.push(ValidationError::new("observability.otlp_endpoint", e.to_string()));
        }
    }
    if obs.metrics_enabled && obs.metrics_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", obs.metrics_address),
        ));
    }
    if !(0.0..=1.0).contains(&obs.body_log_sample_rate) {
        errors.push(ValidationError::new(
            "observability.body_log_sample_rate",
            "must be within [0.0, 1.0]",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
