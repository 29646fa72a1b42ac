//! Inference proxy library.
//!
//! A front door for a local model server: forwards generate and pull calls,
//! traces each forwarded call, and keeps a bounded history of recent
//! generate queries.

pub mod config;
pub mod history;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod upstream;

pub use config::schema::ProxyConfig;
pub use history::HistoryLog;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
