//! In-process feed message cache keeping the most recent messages per feed.

use async_trait::async_trait;
use dashmap::DashMap;
use domains::{FeedId, FeedMessage, FeedMessageCache, Result};
use std::collections::VecDeque;

pub const DEFAULT_MAX_MESSAGES_PER_FEED: usize = 100;

pub struct InMemoryFeedMessageCache {
    feeds: DashMap<FeedId, VecDeque<FeedMessage>>,
    max_per_feed: usize,
}

impl InMemoryFeedMessageCache {
    pub fn new(max_per_feed: usize) -> Self {
        Self {
            feeds: DashMap::new(),
            max_per_feed: max_per_feed.max(1),
        }
    }

    pub fn max_per_feed(&self) -> usize {
        self.max_per_feed
    }
}

impl Default for InMemoryFeedMessageCache {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_MESSAGES_PER_FEED)
    }
}

#[async_trait]
impl FeedMessageCache for InMemoryFeedMessageCache {
    /// Appends to the feed's window, evicting the oldest entries beyond capacity.
    async fn add_message(&self, feed_id: FeedId, message: &FeedMessage) -> Result<()> {
        let mut window = self.feeds.entry(feed_id).or_default();
        window.push_back(message.clone());
        while window.len() > self.max_per_feed {
            window.pop_front();
        }
        Ok(())
    }

    async fn messages(&self, feed_id: FeedId) -> Result<Vec<FeedMessage>> {
        Ok(self
            .feeds
            .get(&feed_id)
            .map(|window| window.iter().cloned().collect())
            .unwrap_or_default())
    }
}
