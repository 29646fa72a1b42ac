//! In-process history store.

use async_trait::async_trait;
use std::collections::VecDeque;
use tokio::sync::Mutex;

use super::{HistoryError, HistoryStore};

/// A mutex-guarded deque. Push and trim run under one lock acquisition.
#[derive(Debug, Default)]
pub struct MemoryHistoryStore {
    entries: Mutex<VecDeque<String>>,
}

impl MemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HistoryStore for MemoryHistoryStore {
    async fn push_trim(&self, entry: String, capacity: usize) -> Result<(), HistoryError> {
        let mut entries = self.entries.lock().await;
        entries.push_front(entry);
        entries.truncate(capacity);
        Ok(())
    }

    async fn range(&self, start: usize, stop: usize) -> Result<Vec<String>, HistoryError> {
        let entries = self.entries.lock().await;
        if start > stop {
            return Ok(Vec::new());
        }
        Ok(entries
            .iter()
            .skip(start)
            .take(stop - start + 1)
            .cloned()
            .collect())
    }
}
