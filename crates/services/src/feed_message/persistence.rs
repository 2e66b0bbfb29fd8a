//! Write-through persistence for feed messages.
//!
//! The primary store is the system of record. The cache and the event bus
//! only ever see a message after [`WriteThroughCoordinator::persist`] handed
//! back a [`PersistedMessage`], and a cache failure never undoes or blocks
//! the primary write.

use crate::error::{HandlerError, Result};
use domains::{
    FeedEventPublisher, FeedMessage, FeedMessageCache, FeedMessageStore,
    NewFeedMessageCreatedEvent,
};
use std::sync::Arc;
use tracing::{debug, warn};

/// Proof that a message reached the primary store. Only the coordinator can
/// create one.
#[derive(Debug)]
pub struct PersistedMessage(FeedMessage);

impl PersistedMessage {
    pub fn message(&self) -> &FeedMessage {
        &self.0
    }

    pub fn into_inner(self) -> FeedMessage {
        self.0
    }
}

/// Result of propagating a persisted message to its derived signals.
#[derive(Debug)]
pub struct Propagation {
    pub message: FeedMessage,
    pub cache_updated: bool,
}

pub struct WriteThroughCoordinator {
    store: Arc<dyn FeedMessageStore>,
    cache: Arc<dyn FeedMessageCache>,
    publisher: Arc<dyn FeedEventPublisher>,
}

impl WriteThroughCoordinator {
    pub fn new(
        store: Arc<dyn FeedMessageStore>,
        cache: Arc<dyn FeedMessageCache>,
        publisher: Arc<dyn FeedEventPublisher>,
    ) -> Self {
        Self {
            store,
            cache,
            publisher,
        }
    }

    /// Writes the message to the primary store. Failure is fatal for the
    /// transaction and is returned as-is, without retry.
    pub async fn persist(&self, message: FeedMessage) -> Result<PersistedMessage> {
        self.store
            .create(&message)
            .await
            .map_err(|source| HandlerError::Persistence {
                message_id: message.id(),
                source,
            })?;

        debug!(
            feed_id = %message.feed_id(),
            message_id = %message.id(),
            block_index = %message.block_index(),
            "Feed message persisted"
        );
        Ok(PersistedMessage(message))
    }

    /// Mirrors the message into the cache (best-effort), then publishes the
    /// creation event. Publication errors are returned to the caller.
    pub async fn propagate(&self, persisted: PersistedMessage) -> Result<Propagation> {
        let message = persisted.into_inner();
        let cache_updated = self.write_cache(&message).await;

        self.publisher
            .publish(NewFeedMessageCreatedEvent::new(message.clone()))
            .await
            .map_err(|source| HandlerError::Publication {
                message_id: message.id(),
                source,
            })?;

        Ok(Propagation {
            message,
            cache_updated,
        })
    }

    async fn write_cache(&self, message: &FeedMessage) -> bool {
        match self.cache.add_message(message.feed_id(), message).await {
            Ok(()) => true,
            Err(err) => {
                warn!(
                    feed_id = %message.feed_id(),
                    message_id = %message.id(),
                    error = %err,
                    "Failed to add feed message to cache, continuing without it"
                );
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{capture_warnings, message_at};
    use domains::{DomainError, MockFeedEventPublisher, MockFeedMessageCache, MockFeedMessageStore};
    use mockall::Sequence;

    fn coordinator(
        store: MockFeedMessageStore,
        cache: MockFeedMessageCache,
        publisher: MockFeedEventPublisher,
    ) -> WriteThroughCoordinator {
        WriteThroughCoordinator::new(Arc::new(store), Arc::new(cache), Arc::new(publisher))
    }

    #[tokio::test]
    async fn test_primary_then_cache_then_publish() {
        let mut seq = Sequence::new();
        let mut store = MockFeedMessageStore::new();
        let mut cache = MockFeedMessageCache::new();
        let mut publisher = MockFeedEventPublisher::new();
        let message = message_at(100);
        let feed_id = message.feed_id();
        let expected = message.clone();

        store
            .expect_create()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        cache
            .expect_add_message()
            .withf(move |id, _| *id == feed_id)
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));
        publisher
            .expect_publish()
            .withf(move |event| event.message == expected)
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));

        let coordinator = coordinator(store, cache, publisher);
        let persisted = coordinator.persist(message).await.unwrap();
        let propagation = coordinator.propagate(persisted).await.unwrap();

        assert!(propagation.cache_updated);
    }

    #[tokio::test]
    async fn test_primary_failure_is_returned() {
        let mut store = MockFeedMessageStore::new();
        store
            .expect_create()
            .times(1)
            .returning(|_| Err(DomainError::Storage("connection reset".into())));

        let message = message_at(5);
        let id = message.id();
        let result = coordinator(
            store,
            MockFeedMessageCache::new(),
            MockFeedEventPublisher::new(),
        )
        .persist(message)
        .await;

        match result {
            Err(HandlerError::Persistence { message_id, source }) => {
                assert_eq!(message_id, id);
                assert!(matches!(source, DomainError::Storage(_)));
            }
            other => panic!("expected persistence error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_cache_failure_is_swallowed_and_logged() {
        let (warnings, _guard) = capture_warnings();
        let mut store = MockFeedMessageStore::new();
        let mut cache = MockFeedMessageCache::new();
        let mut publisher = MockFeedEventPublisher::new();

        store.expect_create().returning(|_| Ok(()));
        cache
            .expect_add_message()
            .times(1)
            .returning(|_, _| Err(DomainError::Cache("redis timeout".into())));
        publisher.expect_publish().times(1).returning(|_| Ok(()));

        let coordinator = coordinator(store, cache, publisher);
        let persisted = coordinator.persist(message_at(1)).await.unwrap();
        let propagation = coordinator.propagate(persisted).await.unwrap();

        assert!(!propagation.cache_updated);
        assert!(warnings.any(|w| w.contains("redis timeout")));
    }

    #[tokio::test]
    async fn test_publish_failure_is_returned() {
        let mut cache = MockFeedMessageCache::new();
        let mut publisher = MockFeedEventPublisher::new();
        let mut store = MockFeedMessageStore::new();

        store.expect_create().returning(|_| Ok(()));
        cache.expect_add_message().returning(|_, _| Ok(()));
        publisher
            .expect_publish()
            .times(1)
            .returning(|_| Err(DomainError::Publish("bus closed".into())));

        let coordinator = coordinator(store, cache, publisher);
        let persisted = coordinator.persist(message_at(1)).await.unwrap();
        let result = coordinator.propagate(persisted).await;

        assert!(matches!(result, Err(HandlerError::Publication { .. })));
    }
}
