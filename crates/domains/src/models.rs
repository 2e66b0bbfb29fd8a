//! # Domain Models
//!
//! These structs represent the core entities of the feed ledger.
//! Identifiers are minted by transaction producers, never by this system.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identifier of a feed (personal, chat or group).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeedId(Uuid);

impl FeedId {
    pub fn new(id: Uuid) -> Self {
        Self(id)
    }

    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for FeedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Identifier of a single feed message, supplied by the sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeedMessageId(Uuid);

impl FeedMessageId {
    pub fn new(id: Uuid) -> Self {
        Self(id)
    }

    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for FeedMessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Position in the chain. Used as a monotonic ordering stamp on messages.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct BlockIndex(u64);

impl BlockIndex {
    pub const GENESIS: BlockIndex = BlockIndex(0);

    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for BlockIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Public signing address of a chain participant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PublicAddress(String);

impl PublicAddress {
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PublicAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Token naming an attachment blob. Minted by the client that uploaded it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttachmentId(String);

impl AttachmentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AttachmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The durable record of a message posted to a feed.
///
/// Fields are private: once the assembler has stamped a message with its
/// block index, nothing downstream may change it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedMessage {
    id: FeedMessageId,
    feed_id: FeedId,
    content: String,
    issuer: PublicAddress,
    block_index: BlockIndex,
    timestamp: DateTime<Utc>,
    reply_to: Option<FeedMessageId>,
    attachment_ids: Option<Vec<AttachmentId>>,
}

impl FeedMessage {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: FeedMessageId,
        feed_id: FeedId,
        content: String,
        issuer: PublicAddress,
        block_index: BlockIndex,
        timestamp: DateTime<Utc>,
        reply_to: Option<FeedMessageId>,
        attachment_ids: Option<Vec<AttachmentId>>,
    ) -> Self {
        Self {
            id,
            feed_id,
            content,
            issuer,
            block_index,
            timestamp,
            reply_to,
            attachment_ids,
        }
    }

    pub fn id(&self) -> FeedMessageId {
        self.id
    }

    pub fn feed_id(&self) -> FeedId {
        self.feed_id
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn issuer(&self) -> &PublicAddress {
        &self.issuer
    }

    pub fn block_index(&self) -> BlockIndex {
        self.block_index
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn reply_to(&self) -> Option<FeedMessageId> {
        self.reply_to
    }

    /// Attachment ids in the order the sender listed them.
    pub fn attachment_ids(&self) -> Option<&[AttachmentId]> {
        self.attachment_ids.as_deref()
    }
}

/// Describes a blob the sender staged in temporary storage before submitting
/// the transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentReference {
    pub id: AttachmentId,
    /// Hash of the plaintext, as declared by the sender
    pub hash: String,
    pub mime_type: String,
    pub size: u64,
    pub file_name: String,
}

/// Encrypted bytes sitting in temporary storage, waiting for their message
/// to be confirmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemporaryAttachment {
    pub content: Bytes,
    pub thumbnail: Option<Bytes>,
}

/// An attachment in permanent storage. Built in one piece from a reference
/// and its temporary blob; never partially populated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentEntity {
    id: AttachmentId,
    feed_message_id: FeedMessageId,
    content: Bytes,
    thumbnail: Option<Bytes>,
    hash: String,
    mime_type: String,
    size: u64,
    file_name: String,
}

impl AttachmentEntity {
    pub fn from_reference(
        reference: &AttachmentReference,
        feed_message_id: FeedMessageId,
        blob: TemporaryAttachment,
    ) -> Self {
        Self {
            id: reference.id.clone(),
            feed_message_id,
            content: blob.content,
            thumbnail: blob.thumbnail,
            hash: reference.hash.clone(),
            mime_type: reference.mime_type.clone(),
            size: reference.size,
            file_name: reference.file_name.clone(),
        }
    }

    pub fn id(&self) -> &AttachmentId {
        &self.id
    }

    pub fn feed_message_id(&self) -> FeedMessageId {
        self.feed_message_id
    }

    pub fn content(&self) -> &Bytes {
        &self.content
    }

    pub fn thumbnail(&self) -> Option<&Bytes> {
        self.thumbnail.as_ref()
    }

    pub fn hash(&self) -> &str {
        &self.hash
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }
}
