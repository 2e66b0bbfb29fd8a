//! # Transactions
//!
//! The shapes a transaction has once the validation pipeline is done with it.
//! Everything here is read-only input to the handlers.

use crate::models::{AttachmentReference, FeedId, FeedMessageId, PublicAddress};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A signature over a transaction, together with who produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    pub signatory: PublicAddress,
    pub signature: String,
}

/// A transaction as signed by its sender.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTransaction<P> {
    pub payload: P,
    pub timestamp: DateTime<Utc>,
    pub user_signature: Signature,
}

/// A signed transaction co-signed by the validator that admitted it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatedTransaction<P> {
    pub transaction: SignedTransaction<P>,
    pub validator_signature: Signature,
}

impl<P> ValidatedTransaction<P> {
    pub fn payload(&self) -> &P {
        &self.transaction.payload
    }

    /// Address of the user who signed the transaction.
    pub fn sender(&self) -> &PublicAddress {
        &self.transaction.user_signature.signatory
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.transaction.timestamp
    }

    /// Copy of this transaction's envelope around another payload.
    pub fn with_payload<Q>(&self, payload: Q) -> ValidatedTransaction<Q> {
        ValidatedTransaction {
            transaction: SignedTransaction {
                payload,
                timestamp: self.transaction.timestamp,
                user_signature: self.transaction.user_signature.clone(),
            },
            validator_signature: self.validator_signature.clone(),
        }
    }

    /// Re-wraps the transaction around a different payload, keeping both signatures.
    pub fn map_payload<Q>(self, f: impl FnOnce(P) -> Q) -> ValidatedTransaction<Q> {
        ValidatedTransaction {
            transaction: SignedTransaction {
                payload: f(self.transaction.payload),
                timestamp: self.transaction.timestamp,
                user_signature: self.transaction.user_signature,
            },
            validator_signature: self.validator_signature,
        }
    }
}

/// Payload of a "new feed message" transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewFeedMessagePayload {
    pub feed_message_id: FeedMessageId,
    pub feed_id: FeedId,
    pub message_content: String,
    #[serde(default)]
    pub reply_to: Option<FeedMessageId>,
    #[serde(default)]
    pub attachments: Option<Vec<AttachmentReference>>,
}

/// Payload of a "new personal feed" transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPersonalFeedPayload {
    pub feed_id: FeedId,
    pub title: String,
}

/// Every payload the chain accepts, tagged by kind on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum TransactionPayload {
    NewFeedMessage(NewFeedMessagePayload),
    NewPersonalFeed(NewPersonalFeedPayload),
}

impl TransactionPayload {
    pub fn kind(&self) -> PayloadKind {
        match self {
            Self::NewFeedMessage(_) => PayloadKind::NewFeedMessage,
            Self::NewPersonalFeed(_) => PayloadKind::NewPersonalFeed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadKind {
    NewFeedMessage,
    NewPersonalFeed,
}

impl fmt::Display for PayloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NewFeedMessage => "new_feed_message",
            Self::NewPersonalFeed => "new_personal_feed",
        };
        f.write_str(name)
    }
}
