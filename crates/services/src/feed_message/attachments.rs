//! Moves attachment blobs from temporary to permanent storage once their
//! message is confirmed.
//!
//! Each reference is migrated on its own: a missing blob or a failed write
//! is logged and recorded, and the next reference is still processed. The
//! temporary copy is deleted only after the permanent create returned, so an
//! interruption leaves a stale temp entry rather than a lost attachment.

use domains::{
    AttachmentEntity, AttachmentId, AttachmentReference, FeedMessageId, PermanentAttachmentStore,
    TemporaryAttachmentStore,
};
use std::sync::Arc;
use tracing::{debug, warn};

/// What happened to one attachment reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttachmentOutcome {
    /// Stored permanently. `temp_cleanup_failed` is set when the staged copy
    /// could not be removed afterwards.
    Migrated {
        id: AttachmentId,
        temp_cleanup_failed: bool,
    },
    /// Nothing staged under this id; never uploaded or already consumed.
    MissingInTemporaryStorage { id: AttachmentId },
    TemporaryReadFailed { id: AttachmentId },
    PermanentWriteFailed { id: AttachmentId },
}

impl AttachmentOutcome {
    pub fn id(&self) -> &AttachmentId {
        match self {
            Self::Migrated { id, .. }
            | Self::MissingInTemporaryStorage { id }
            | Self::TemporaryReadFailed { id }
            | Self::PermanentWriteFailed { id } => id,
        }
    }

    pub fn is_migrated(&self) -> bool {
        matches!(self, Self::Migrated { .. })
    }
}

pub struct AttachmentMigrator {
    temporary: Arc<dyn TemporaryAttachmentStore>,
    permanent: Arc<dyn PermanentAttachmentStore>,
}

impl AttachmentMigrator {
    pub fn new(
        temporary: Arc<dyn TemporaryAttachmentStore>,
        permanent: Arc<dyn PermanentAttachmentStore>,
    ) -> Self {
        Self {
            temporary,
            permanent,
        }
    }

    /// Migrates every reference in payload order, one at a time.
    pub async fn migrate_all(
        &self,
        feed_message_id: FeedMessageId,
        references: &[AttachmentReference],
    ) -> Vec<AttachmentOutcome> {
        let mut outcomes = Vec::with_capacity(references.len());
        for reference in references {
            outcomes.push(self.migrate(feed_message_id, reference).await);
        }
        outcomes
    }

    pub async fn migrate(
        &self,
        feed_message_id: FeedMessageId,
        reference: &AttachmentReference,
    ) -> AttachmentOutcome {
        let id = reference.id.clone();

        let blob = match self.temporary.retrieve(&id).await {
            Ok(Some(blob)) => blob,
            Ok(None) => {
                warn!(
                    attachment_id = %id,
                    message_id = %feed_message_id,
                    "Attachment not found in temporary storage, skipping"
                );
                return AttachmentOutcome::MissingInTemporaryStorage { id };
            }
            Err(err) => {
                warn!(
                    attachment_id = %id,
                    message_id = %feed_message_id,
                    error = %err,
                    "Failed to read attachment from temporary storage, skipping"
                );
                return AttachmentOutcome::TemporaryReadFailed { id };
            }
        };

        let entity = AttachmentEntity::from_reference(reference, feed_message_id, blob);
        if let Err(err) = self.permanent.create(entity).await {
            warn!(
                attachment_id = %id,
                message_id = %feed_message_id,
                error = %err,
                "Failed to write attachment to permanent storage, skipping"
            );
            return AttachmentOutcome::PermanentWriteFailed { id };
        }

        let temp_cleanup_failed = match self.temporary.delete(&id).await {
            Ok(()) => false,
            Err(err) => {
                warn!(
                    attachment_id = %id,
                    error = %err,
                    "Attachment migrated but temporary copy was not removed"
                );
                true
            }
        };

        debug!(attachment_id = %id, message_id = %feed_message_id, "Attachment migrated");
        AttachmentOutcome::Migrated {
            id,
            temp_cleanup_failed,
        }
    }
}
