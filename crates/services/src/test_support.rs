//! Fixtures shared by the unit tests in this crate.

use bytes::Bytes;
use chrono::Utc;
use domains::{
    AttachmentId, AttachmentReference, BlockIndex, FeedId, FeedMessage, FeedMessageId,
    NewFeedMessagePayload, PublicAddress, Signature, SignedTransaction, TemporaryAttachment,
    ValidatedTransaction,
};
use std::fmt::{self, Write as _};
use std::sync::{Arc, Mutex};
use tracing::field::{Field, Visit};
use tracing::subscriber::DefaultGuard;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::Layer;

pub fn new_message_transaction(
    content: &str,
    attachments: Vec<AttachmentReference>,
) -> ValidatedTransaction<NewFeedMessagePayload> {
    ValidatedTransaction {
        transaction: SignedTransaction {
            payload: NewFeedMessagePayload {
                feed_message_id: FeedMessageId::random(),
                feed_id: FeedId::random(),
                message_content: content.to_string(),
                reply_to: None,
                attachments: Some(attachments),
            },
            timestamp: Utc::now(),
            user_signature: Signature {
                signatory: PublicAddress::new("04a1b2c3d4"),
                signature: "user-signature".to_string(),
            },
        },
        validator_signature: Signature {
            signatory: PublicAddress::new("validator-01"),
            signature: "validator-signature".to_string(),
        },
    }
}

pub fn reference(id: &str) -> AttachmentReference {
    AttachmentReference {
        id: AttachmentId::new(id),
        hash: format!("hash-{id}"),
        mime_type: "application/octet-stream".to_string(),
        size: 16,
        file_name: format!("{id}.bin"),
    }
}

pub fn blob(content: &[u8]) -> TemporaryAttachment {
    TemporaryAttachment {
        content: Bytes::copy_from_slice(content),
        thumbnail: None,
    }
}

pub fn message_at(block_index: u64) -> FeedMessage {
    FeedMessage::new(
        FeedMessageId::random(),
        FeedId::random(),
        "fixture".to_string(),
        PublicAddress::new("04a1b2c3d4"),
        BlockIndex::new(block_index),
        Utc::now(),
        None,
        None,
    )
}

/// Warn-level events recorded while the guard returned by
/// [`capture_warnings`] is alive.
#[derive(Clone, Default)]
pub struct CapturedWarnings(Arc<Mutex<Vec<String>>>);

impl CapturedWarnings {
    pub fn any(&self, predicate: impl Fn(&str) -> bool) -> bool {
        self.0.lock().unwrap().iter().any(|w| predicate(w))
    }
}

struct WarningLayer(CapturedWarnings);

impl<S: Subscriber> Layer<S> for WarningLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if *event.metadata().level() != Level::WARN {
            return;
        }
        let mut fields = FieldText::default();
        event.record(&mut fields);
        (self.0).0.lock().unwrap().push(fields.0);
    }
}

#[derive(Default)]
struct FieldText(String);

impl Visit for FieldText {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        let _ = write!(self.0, "{}={:?} ", field.name(), value);
    }
}

pub fn capture_warnings() -> (CapturedWarnings, DefaultGuard) {
    let warnings = CapturedWarnings::default();
    let subscriber = tracing_subscriber::registry().with(WarningLayer(warnings.clone()));
    let guard = tracing::subscriber::set_default(subscriber);
    (warnings, guard)
}
