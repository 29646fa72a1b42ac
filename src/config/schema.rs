//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration for the inference proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Model-serving upstream the proxy fronts.
    pub upstream: UpstreamConfig,

    /// Bounded request history settings.
    pub history: HistoryConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Upstream model server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Base address of the model server (e.g., "http://ollama:11434").
    pub base_url: String,

    /// Upstream path for generation requests.
    pub generate_path: String,

    /// Upstream path for model pulls.
    pub pull_path: String,

    /// Connection establishment timeout in seconds.
    pub connect_timeout_secs: u64,

    /// Time allowed for the upstream to produce response headers, in seconds.
    /// The body stream itself is not bounded.
    pub response_timeout_secs: u64,

    /// Stream the upstream pull body back to the caller.
    /// When false only status and headers are mirrored.
    pub forward_pull_body: bool,
}

impl UpstreamConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn response_timeout(&self) -> Duration {
        Duration::from_secs(self.response_timeout_secs)
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: "http://ollama:11434".to_string(),
            generate_path: "/api/generate".to_string(),
            pull_path: "/api/pull".to_string(),
            connect_timeout_secs: 5,
            response_timeout_secs: 300,
            forward_pull_body: true,
        }
    }
}

/// Which store backs the history log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryBackend {
    Memory,
    Redis,
}

/// Bounded history configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Store backing the log.
    pub backend: HistoryBackend,

    /// Redis connection URL (used when backend = "redis").
    pub redis_url: String,

    /// Name of the Redis list holding entries.
    pub key: String,

    /// Maximum number of entries retained.
    pub capacity: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            backend: HistoryBackend::Redis,
            redis_url: "redis://redis:6379".to_string(),
            key: "requests".to_string(),
            capacity: 100,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins when set.
    pub log_level: String,

    /// Log line format.
    pub log_format: LogFormat,

    /// OTLP gRPC collector endpoint. Span export is disabled when unset.
    pub otlp_endpoint: Option<String>,

    /// `service.name` reported on exported spans.
    pub service_name: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,

    /// Fraction of generate responses whose body chunks are logged at debug
    /// level as they stream through (0.0 disables).
    pub body_log_sample_rate: f64,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            otlp_endpoint: Some("http://otel-collector:4317".to_string()),
            service_name: "inference-proxy".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
            body_log_sample_rate: 0.0,
        }
    }
}
