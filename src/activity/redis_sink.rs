use async_trait::async_trait;

use crate::activity::{ActivityEvent, ActivitySink};
use crate::config::ActivityConfig;
use crate::error::{AppError, AppResult};

/// Pushes events as JSON onto a capped Redis list, newest first.
#[derive(Clone)]
pub struct RedisActivitySink {
    client: redis::Client,
    key: String,
    max_len: isize,
}

impl RedisActivitySink {
    pub fn new(client: redis::Client, config: &ActivityConfig) -> Self {
        Self {
            client,
            key: config.feed_key.clone(),
            max_len: config.max_len.max(1),
        }
    }
}

#[async_trait]
impl ActivitySink for RedisActivitySink {
    async fn record(&self, event: &ActivityEvent) -> AppResult<()> {
        let payload = serde_json::to_string(event)
            .map_err(|e| AppError::Internal(format!("Failed to serialize activity: {}", e)))?;

        let mut conn = self.client.get_multiplexed_async_connection().await?;
        redis::pipe()
            .atomic()
            .lpush(&self.key, payload)
            .ignore()
            .ltrim(&self.key, 0, self.max_len - 1)
            .ignore()
            .query_async::<_, ()>(&mut conn)
            .await?;
        Ok(())
    }
}
