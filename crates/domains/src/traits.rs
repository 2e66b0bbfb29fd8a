//! # Core Traits (Ports)
//!
//! Collaborators the transaction handlers depend on. Any adapter must
//! implement these to be wired into the ingestion pipeline.

use crate::error::Result;
use crate::events::NewFeedMessageCreatedEvent;
use crate::models::{
    AttachmentEntity, AttachmentId, BlockIndex, FeedId, FeedMessage, FeedMessageId,
    TemporaryAttachment,
};
use async_trait::async_trait;

/// Read-only view of the chain tip.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait ChainState: Send + Sync {
    /// Index of the most recent block. Never decreases between calls.
    fn current_block_index(&self) -> BlockIndex;
}

/// System of record for feed messages.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait FeedMessageStore: Send + Sync {
    async fn create(&self, message: &FeedMessage) -> Result<()>;
    async fn find_by_id(&self, id: FeedMessageId) -> Result<Option<FeedMessage>>;
}

/// Per-feed cache of recent messages. Best-effort; never authoritative.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait FeedMessageCache: Send + Sync {
    async fn add_message(&self, feed_id: FeedId, message: &FeedMessage) -> Result<()>;
    /// Cached messages for a feed, oldest first.
    async fn messages(&self, feed_id: FeedId) -> Result<Vec<FeedMessage>>;
}

/// Staging area for attachment blobs uploaded ahead of their transaction.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait TemporaryAttachmentStore: Send + Sync {
    /// Returns `None` when nothing is staged under `id` (never uploaded, or
    /// already migrated).
    async fn retrieve(&self, id: &AttachmentId) -> Result<Option<TemporaryAttachment>>;
    async fn delete(&self, id: &AttachmentId) -> Result<()>;
}

/// Durable attachment storage.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait PermanentAttachmentStore: Send + Sync {
    async fn create(&self, attachment: AttachmentEntity) -> Result<()>;
    async fn find_by_id(&self, id: &AttachmentId) -> Result<Option<AttachmentEntity>>;
}

/// Outbound channel for domain events.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait FeedEventPublisher: Send + Sync {
    async fn publish(&self, event: NewFeedMessageCreatedEvent) -> Result<()>;
}
