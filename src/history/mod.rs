//! Bounded request history.
//!
//! # Data Flow
//! ```text
//! generate handler (after upstream answered)
//!     → HistoryLog::append (awaited before the response is sent)
//!     → HistoryStore::push_trim (atomic push-front + trim)
//!
//! GET /history
//!     → HistoryLog::recent
//!     → HistoryStore::range(0, capacity - 1)
//! ```
//!
//! # Design Decisions
//! - History is diagnostic: store failures are logged and counted, never
//!   surfaced to the HTTP caller
//! - The write completes before the generate response goes out, so a
//!   following `GET /history` sees it and sequential requests keep their order
//! - Push and trim happen as one atomic step in the store so concurrent
//!   appends never leave the list longer than its capacity

pub mod memory;
pub mod redis_store;

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use crate::config::{HistoryBackend, HistoryConfig};
use crate::observability::metrics;

pub use self::memory::MemoryHistoryStore;
pub use self::redis_store::RedisHistoryStore;

/// Errors raised by a history store backend.
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("history store unavailable: {0}")]
    Unavailable(String),
}

/// Minimal ordered-list contract the history log needs from a store.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Insert `entry` at the front, then keep only the first `capacity`
    /// entries. Both steps must be observed atomically by other callers.
    async fn push_trim(&self, entry: String, capacity: usize) -> Result<(), HistoryError>;

    /// Entries `start..=stop`, newest first.
    async fn range(&self, start: usize, stop: usize) -> Result<Vec<String>, HistoryError>;
}

/// Newest-first, size-capped log of raw generate query strings.
#[derive(Clone)]
pub struct HistoryLog {
    store: Arc<dyn HistoryStore>,
    capacity: usize,
}

impl HistoryLog {
    pub fn new(store: Arc<dyn HistoryStore>, capacity: usize) -> Self {
        Self { store, capacity }
    }

    /// Build the log over the backend selected in configuration.
    pub fn from_config(config: &HistoryConfig) -> Result<Self, HistoryError> {
        let store: Arc<dyn HistoryStore> = match config.backend {
            HistoryBackend::Memory => Arc::new(MemoryHistoryStore::new()),
            HistoryBackend::Redis => Arc::new(RedisHistoryStore::open(
                &config.redis_url,
                config.key.clone(),
            )?),
        };
        tracing::info!(
            backend = ?config.backend,
            capacity = config.capacity,
            "History log initialized"
        );
        Ok(Self::new(store, config.capacity))
    }

    /// Record an entry. Failures are swallowed.
    pub async fn append(&self, entry: String) {
        if let Err(e) = self.store.push_trim(entry, self.capacity).await {
            tracing::warn!(error = %e, "Failed to record request history");
            metrics::record_history_error("append");
        }
    }

    /// The most recent entries, newest first. A failing store reads as empty.
    pub async fn recent(&self) -> Vec<String> {
        match self.store.range(0, self.capacity.saturating_sub(1)).await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read request history");
                metrics::record_history_error("range");
                Vec::new()
            }
        }
    }
}
