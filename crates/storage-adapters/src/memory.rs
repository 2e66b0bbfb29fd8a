//! # In-memory stores
//!
//! DashMap-backed implementations of the storage ports. Used by tests and
//! by single-process deployments that do not need durability across restarts.

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use domains::{
    AttachmentEntity, AttachmentId, DomainError, FeedId, FeedMessage, FeedMessageId,
    FeedMessageStore, PermanentAttachmentStore, Result, TemporaryAttachment,
    TemporaryAttachmentStore,
};

#[derive(Default)]
pub struct InMemoryFeedMessageStore {
    messages: DashMap<FeedMessageId, FeedMessage>,
}

impl InMemoryFeedMessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// All stored messages of a feed, ordered by block index.
    pub fn messages_for_feed(&self, feed_id: FeedId) -> Vec<FeedMessage> {
        let mut messages: Vec<FeedMessage> = self
            .messages
            .iter()
            .filter(|entry| entry.feed_id() == feed_id)
            .map(|entry| entry.value().clone())
            .collect();
        messages.sort_by_key(|m| m.block_index());
        messages
    }
}

#[async_trait]
impl FeedMessageStore for InMemoryFeedMessageStore {
    /// A message id can be recorded only once.
    async fn create(&self, message: &FeedMessage) -> Result<()> {
        match self.messages.entry(message.id()) {
            Entry::Occupied(_) => Err(DomainError::Conflict(format!(
                "feed message {} already exists",
                message.id()
            ))),
            Entry::Vacant(slot) => {
                slot.insert(message.clone());
                Ok(())
            }
        }
    }

    async fn find_by_id(&self, id: FeedMessageId) -> Result<Option<FeedMessage>> {
        Ok(self.messages.get(&id).map(|m| m.value().clone()))
    }
}

#[derive(Default)]
pub struct InMemoryTemporaryAttachmentStore {
    blobs: DashMap<AttachmentId, TemporaryAttachment>,
}

impl InMemoryTemporaryAttachmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stages a blob the way the upload endpoint would.
    pub fn stage(&self, id: AttachmentId, blob: TemporaryAttachment) {
        self.blobs.insert(id, blob);
    }

    pub fn contains(&self, id: &AttachmentId) -> bool {
        self.blobs.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }
}

#[async_trait]
impl TemporaryAttachmentStore for InMemoryTemporaryAttachmentStore {
    async fn retrieve(&self, id: &AttachmentId) -> Result<Option<TemporaryAttachment>> {
        Ok(self.blobs.get(id).map(|b| b.value().clone()))
    }

    /// Deleting an id that is not staged is not an error.
    async fn delete(&self, id: &AttachmentId) -> Result<()> {
        self.blobs.remove(id);
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryPermanentAttachmentStore {
    attachments: DashMap<AttachmentId, AttachmentEntity>,
}

impl InMemoryPermanentAttachmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.attachments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attachments.is_empty()
    }
}

#[async_trait]
impl PermanentAttachmentStore for InMemoryPermanentAttachmentStore {
    /// Re-creating an existing id replaces it, so a replayed migration converges.
    async fn create(&self, attachment: AttachmentEntity) -> Result<()> {
        self.attachments.insert(attachment.id().clone(), attachment);
        Ok(())
    }

    async fn find_by_id(&self, id: &AttachmentId) -> Result<Option<AttachmentEntity>> {
        Ok(self.attachments.get(id).map(|a| a.value().clone()))
    }
}
