//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → CLI overrides (main.rs)
//!     → validation.rs (semantic checks)
//!     → ProxyConfig (validated, immutable)
//!     → handed to subsystems at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    HistoryBackend, HistoryConfig, ListenerConfig, LogFormat, ObservabilityConfig, ProxyConfig,
    UpstreamConfig,
};
pub use validation::{validate_config, ValidationError};
