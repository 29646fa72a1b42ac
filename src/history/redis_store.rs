//! Redis-backed history store.
//!
//! Entries live in a Redis list; `LPUSH` + `LTRIM` run inside one
//! `MULTI`/`EXEC` pipeline so concurrent proxies sharing the list never
//! observe it past capacity.

use async_trait::async_trait;
use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use redis::{AsyncCommands, Client};
use std::time::Duration;
use tokio::sync::OnceCell;

use super::{HistoryError, HistoryStore};

const STORE_TIMEOUT: Duration = Duration::from_secs(2);

pub struct RedisHistoryStore {
    client: Client,
    key: String,
    conn: OnceCell<ConnectionManager>,
}

impl RedisHistoryStore {
    /// Prepare a store for `url`. No connection is made until first use, so
    /// an unreachable Redis never blocks startup.
    pub fn open(url: &str, key: String) -> Result<Self, HistoryError> {
        Ok(Self {
            client: Client::open(url)?,
            key,
            conn: OnceCell::new(),
        })
    }

    async fn connection(&self) -> Result<ConnectionManager, HistoryError> {
        let conn = self
            .conn
            .get_or_try_init(|| async {
                let config = ConnectionManagerConfig::new()
                    .set_number_of_retries(1)
                    .set_connection_timeout(STORE_TIMEOUT)
                    .set_response_timeout(STORE_TIMEOUT);
                let manager = self.client.get_connection_manager_with_config(config).await?;
                tracing::info!(key = %self.key, "Connected to redis history store");
                Ok::<_, HistoryError>(manager)
            })
            .await?;
        Ok(conn.clone())
    }
}

#[async_trait]
impl HistoryStore for RedisHistoryStore {
    async fn push_trim(&self, entry: String, capacity: usize) -> Result<(), HistoryError> {
        let mut conn = self.connection().await?;
        let stop = capacity.saturating_sub(1) as isize;
        let _: () = redis::pipe()
            .atomic()
            .lpush(&self.key, entry)
            .ignore()
            .ltrim(&self.key, 0, stop)
            .ignore()
            .query_async(&mut conn)
            .await?;
        Ok(())
    }

    async fn range(&self, start: usize, stop: usize) -> Result<Vec<String>, HistoryError> {
        let mut conn = self.connection().await?;
        let entries: Vec<String> = conn.lrange(&self.key, start as isize, stop as isize).await?;
        Ok(entries)
    }
}
