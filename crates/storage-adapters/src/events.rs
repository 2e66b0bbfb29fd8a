//! # Event Bus
//!
//! In-memory publisher for feed events. Uses `tokio::sync::broadcast` for
//! multi-producer, multi-consumer delivery; suitable for single-node
//! operation.

use async_trait::async_trait;
use domains::{FeedEventPublisher, NewFeedMessageCreatedEvent, Result};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::broadcast;
use tracing::debug;

/// Maximum events to buffer per subscriber before it starts lagging.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;

pub struct BroadcastEventBus {
    sender: broadcast::Sender<NewFeedMessageCreatedEvent>,
    events_published: AtomicU64,
    capacity: usize,
}

impl BroadcastEventBus {
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            events_published: AtomicU64::new(0),
            capacity,
        }
    }

    /// Receives every event published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<NewFeedMessageCreatedEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    pub fn events_published(&self) -> u64 {
        self.events_published.load(Ordering::Relaxed)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for BroadcastEventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FeedEventPublisher for BroadcastEventBus {
    /// Publishing with no subscribers succeeds; the event is simply dropped.
    async fn publish(&self, event: NewFeedMessageCreatedEvent) -> Result<()> {
        let message_id = event.message.id();
        self.events_published.fetch_add(1, Ordering::Relaxed);

        match self.sender.send(event) {
            Ok(receivers) => {
                debug!(message_id = %message_id, receivers, "Event published");
            }
            Err(_) => {
                debug!(message_id = %message_id, "Event dropped (no receivers)");
            }
        }
        Ok(())
    }
}
