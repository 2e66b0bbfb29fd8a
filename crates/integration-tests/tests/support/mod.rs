//! Shared fixtures: a handler wired to real in-process adapters.

#![allow(dead_code)]

use bytes::Bytes;
use domains::{
    AttachmentId, AttachmentReference, BlockIndex, FeedId, FeedMessageCache, FeedMessageId,
    NewFeedMessagePayload, PublicAddress, Signature, SignedTransaction, TemporaryAttachment,
    TransactionPayload, ValidatedTransaction,
};
use services::{FeedMessageDependencies, HandlerMetrics, NewFeedMessageHandler};
use std::fmt::{self, Write as _};
use std::sync::{Arc, Mutex};
use storage_adapters::{
    BroadcastEventBus, ChainTipTracker, InMemoryFeedMessageCache, InMemoryFeedMessageStore,
    InMemoryPermanentAttachmentStore, InMemoryTemporaryAttachmentStore,
};
use tracing::field::{Field, Visit};
use tracing::subscriber::DefaultGuard;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

pub const SENDER: &str = "04a1b2c3";

pub struct Ledger {
    pub chain: Arc<ChainTipTracker>,
    pub store: Arc<InMemoryFeedMessageStore>,
    pub cache: Arc<InMemoryFeedMessageCache>,
    pub temporary: Arc<InMemoryTemporaryAttachmentStore>,
    pub permanent: Arc<InMemoryPermanentAttachmentStore>,
    pub events: Arc<BroadcastEventBus>,
    pub metrics: HandlerMetrics,
}

impl Ledger {
    pub fn at_block(tip: u64) -> Self {
        Self {
            chain: Arc::new(ChainTipTracker::new(BlockIndex::new(tip))),
            store: Arc::new(InMemoryFeedMessageStore::new()),
            cache: Arc::new(InMemoryFeedMessageCache::default()),
            temporary: Arc::new(InMemoryTemporaryAttachmentStore::new()),
            permanent: Arc::new(InMemoryPermanentAttachmentStore::new()),
            events: Arc::new(BroadcastEventBus::new()),
            metrics: HandlerMetrics::new(),
        }
    }

    pub fn handler(&self) -> NewFeedMessageHandler {
        self.handler_with_cache(self.cache.clone())
    }

    pub fn handler_with_cache(&self, cache: Arc<dyn FeedMessageCache>) -> NewFeedMessageHandler {
        NewFeedMessageHandler::new(FeedMessageDependencies {
            chain_state: self.chain.clone(),
            message_store: self.store.clone(),
            message_cache: cache,
            temporary_attachments: self.temporary.clone(),
            permanent_attachments: self.permanent.clone(),
            event_publisher: self.events.clone(),
        })
        .with_metrics(self.metrics.clone())
    }

    pub fn stage(&self, id: &str, content: &'static [u8]) {
        self.temporary.stage(
            AttachmentId::new(id),
            TemporaryAttachment {
                content: Bytes::from_static(content),
                thumbnail: None,
            },
        );
    }
}

pub fn reference(id: &str, size: u64) -> AttachmentReference {
    AttachmentReference {
        id: AttachmentId::new(id),
        hash: format!("hash-{id}"),
        mime_type: "image/png".into(),
        size,
        file_name: format!("{id}.png"),
    }
}

pub fn new_feed_message(
    feed_id: FeedId,
    content: &str,
    attachments: Option<Vec<AttachmentReference>>,
) -> ValidatedTransaction<TransactionPayload> {
    ValidatedTransaction {
        transaction: SignedTransaction {
            payload: TransactionPayload::NewFeedMessage(NewFeedMessagePayload {
                feed_message_id: FeedMessageId::random(),
                feed_id,
                message_content: content.into(),
                reply_to: None,
                attachments,
            }),
            timestamp: chrono::Utc::now(),
            user_signature: Signature {
                signatory: PublicAddress::new(SENDER),
                signature: "user-sig".into(),
            },
        },
        validator_signature: Signature {
            signatory: PublicAddress::new("validator-1"),
            signature: "validator-sig".into(),
        },
    }
}

pub fn message_id(transaction: &ValidatedTransaction<TransactionPayload>) -> FeedMessageId {
    match transaction.payload() {
        TransactionPayload::NewFeedMessage(payload) => payload.feed_message_id,
        other => panic!("not a feed message payload: {:?}", other.kind()),
    }
}

/// Warn-level log lines recorded while the paired guard is alive.
#[derive(Clone, Default)]
pub struct Warnings(Arc<Mutex<Vec<String>>>);

impl Warnings {
    pub fn contains(&self, needle: &str) -> bool {
        self.0.lock().unwrap().iter().any(|w| w.contains(needle))
    }
}

struct WarnRecorder(Warnings);

impl<S: Subscriber> Layer<S> for WarnRecorder {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if *event.metadata().level() == Level::WARN {
            let mut line = Line::default();
            event.record(&mut line);
            (self.0).0.lock().unwrap().push(line.0);
        }
    }
}

#[derive(Default)]
struct Line(String);

impl Visit for Line {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        let _ = write!(self.0, "{}={:?} ", field.name(), value);
    }
}

pub fn record_warnings() -> (Warnings, DefaultGuard) {
    let warnings = Warnings::default();
    let subscriber = tracing_subscriber::registry().with(WarnRecorder(warnings.clone()));
    (warnings.clone(), tracing::subscriber::set_default(subscriber))
}
