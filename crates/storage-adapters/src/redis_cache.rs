//! Redis-backed feed message cache.
//!
//! Each feed is a capped list of JSON-encoded messages under
//! `feed:<feed_id>:messages`, newest at the tail.

use async_trait::async_trait;
use deadpool_redis::redis;
use deadpool_redis::{Config, Pool, Runtime};
use domains::{DomainError, FeedId, FeedMessage, FeedMessageCache, Result};

pub struct RedisFeedMessageCache {
    pool: Pool,
    max_per_feed: usize,
}

fn cache_error(e: impl std::fmt::Display) -> DomainError {
    DomainError::Cache(e.to_string())
}

fn feed_key(feed_id: FeedId) -> String {
    format!("feed:{feed_id}:messages")
}

impl RedisFeedMessageCache {
    /// Builds the connection pool. No connection is opened until first use.
    pub fn new(url: &str, max_per_feed: usize) -> Result<Self> {
        let pool = Config::from_url(url)
            .create_pool(Some(Runtime::Tokio1))
            .map_err(cache_error)?;
        Ok(Self {
            pool,
            max_per_feed: max_per_feed.max(1),
        })
    }
}

#[async_trait]
impl FeedMessageCache for RedisFeedMessageCache {
    async fn add_message(&self, feed_id: FeedId, message: &FeedMessage) -> Result<()> {
        let payload = serde_json::to_string(message)?;
        let key = feed_key(feed_id);
        let keep_from = -(self.max_per_feed as isize);
        let mut conn = self.pool.get().await.map_err(cache_error)?;

        redis::pipe()
            .atomic()
            .rpush(&key, payload)
            .ignore()
            .ltrim(&key, keep_from, -1)
            .ignore()
            .query_async::<()>(&mut conn)
            .await
            .map_err(cache_error)
    }

    async fn messages(&self, feed_id: FeedId) -> Result<Vec<FeedMessage>> {
        let mut conn = self.pool.get().await.map_err(cache_error)?;
        let raw: Vec<String> = redis::cmd("LRANGE")
            .arg(feed_key(feed_id))
            .arg(0)
            .arg(-1)
            .query_async(&mut conn)
            .await
            .map_err(cache_error)?;

        raw.iter()
            .map(|entry| serde_json::from_str(entry).map_err(DomainError::from))
            .collect()
    }
}
