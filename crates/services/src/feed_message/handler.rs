//! Entry point for "new feed message" transactions.

use super::assembler::FeedMessageAssembler;
use super::attachments::{AttachmentMigrator, AttachmentOutcome};
use super::persistence::WriteThroughCoordinator;
use crate::error::{HandlerError, Result};
use crate::metrics::HandlerMetrics;
use domains::{
    ChainState, FeedEventPublisher, FeedMessage, FeedMessageCache, FeedMessageStore,
    NewFeedMessagePayload, PayloadKind, PermanentAttachmentStore, TemporaryAttachmentStore,
    TransactionPayload, ValidatedTransaction,
};
use std::sync::Arc;
use tracing::info;

/// Collaborators required by [`NewFeedMessageHandler`].
pub struct FeedMessageDependencies {
    pub chain_state: Arc<dyn ChainState>,
    pub message_store: Arc<dyn FeedMessageStore>,
    pub message_cache: Arc<dyn FeedMessageCache>,
    pub temporary_attachments: Arc<dyn TemporaryAttachmentStore>,
    pub permanent_attachments: Arc<dyn PermanentAttachmentStore>,
    pub event_publisher: Arc<dyn FeedEventPublisher>,
}

/// What a successful call did. The message is always durable at this point;
/// the other fields report the best-effort parts.
#[derive(Debug)]
pub struct HandleOutcome {
    pub message: FeedMessage,
    pub cache_updated: bool,
    pub attachments: Vec<AttachmentOutcome>,
}

impl HandleOutcome {
    pub fn migrated_count(&self) -> usize {
        self.attachments.iter().filter(|a| a.is_migrated()).count()
    }
}

pub struct NewFeedMessageHandler {
    assembler: FeedMessageAssembler,
    migrator: AttachmentMigrator,
    coordinator: WriteThroughCoordinator,
    metrics: HandlerMetrics,
}

impl NewFeedMessageHandler {
    pub fn new(deps: FeedMessageDependencies) -> Self {
        Self {
            assembler: FeedMessageAssembler::new(deps.chain_state),
            migrator: AttachmentMigrator::new(
                deps.temporary_attachments,
                deps.permanent_attachments,
            ),
            coordinator: WriteThroughCoordinator::new(
                deps.message_store,
                deps.message_cache,
                deps.event_publisher,
            ),
            metrics: HandlerMetrics::default(),
        }
    }

    pub fn with_metrics(mut self, metrics: HandlerMetrics) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn handles(kind: PayloadKind) -> bool {
        kind == PayloadKind::NewFeedMessage
    }

    /// Dispatch-side entry point. Any payload other than a new feed message
    /// is rejected before a single collaborator is touched.
    pub async fn handle(
        &self,
        transaction: &ValidatedTransaction<TransactionPayload>,
    ) -> Result<HandleOutcome> {
        let TransactionPayload::NewFeedMessage(payload) = transaction.payload() else {
            return Err(HandlerError::UnsupportedPayload {
                kind: transaction.payload().kind(),
            });
        };
        self.handle_new_feed_message(&transaction.with_payload(payload.clone()))
            .await
    }

    /// Persists the message, migrates its attachments, refreshes the cache
    /// and publishes the creation event, in that order.
    pub async fn handle_new_feed_message(
        &self,
        transaction: &ValidatedTransaction<NewFeedMessagePayload>,
    ) -> Result<HandleOutcome> {
        let message = self.assembler.assemble(transaction);
        let persisted = self.coordinator.persist(message).await?;
        self.metrics.messages_persisted.inc();

        let references = transaction.payload().attachments.as_deref().unwrap_or(&[]);
        let attachments = self
            .migrator
            .migrate_all(persisted.message().id(), references)
            .await;
        self.record_attachments(&attachments);

        let propagation = self.coordinator.propagate(persisted).await?;
        if !propagation.cache_updated {
            self.metrics.cache_write_failures.inc();
        }

        let outcome = HandleOutcome {
            message: propagation.message,
            cache_updated: propagation.cache_updated,
            attachments,
        };
        info!(
            feed_id = %outcome.message.feed_id(),
            message_id = %outcome.message.id(),
            block_index = %outcome.message.block_index(),
            attachments = outcome.attachments.len(),
            migrated = outcome.migrated_count(),
            "New feed message handled"
        );
        Ok(outcome)
    }

    fn record_attachments(&self, outcomes: &[AttachmentOutcome]) {
        for outcome in outcomes {
            match outcome {
                AttachmentOutcome::Migrated { .. } => self.metrics.attachments_migrated.inc(),
                AttachmentOutcome::MissingInTemporaryStorage { .. } => {
                    self.metrics.attachments_missing.inc()
                }
                AttachmentOutcome::TemporaryReadFailed { .. }
                | AttachmentOutcome::PermanentWriteFailed { .. } => {
                    self.metrics.attachment_write_failures.inc()
                }
            };
        }
    }
}
