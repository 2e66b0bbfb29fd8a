//! # Domain Events
//!
//! Signals emitted after the system of record has been written.

use crate::models::FeedMessage;
use serde::{Deserialize, Serialize};

/// Emitted once per message, after its primary-store write succeeded.
/// Carries the message exactly as persisted, block index included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewFeedMessageCreatedEvent {
    pub message: FeedMessage,
}

impl NewFeedMessageCreatedEvent {
    pub fn new(message: FeedMessage) -> Self {
        Self { message }
    }
}
