//! # HandlerError
//!
//! Failures a transaction handler surfaces to the ingestion pipeline.
//! Only failures of the system of record (and of event publication) escape;
//! cache and attachment problems are absorbed inside the handler.

use domains::{DomainError, FeedMessageId, PayloadKind};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HandlerError {
    /// The transaction was routed to a handler that is not registered for its kind.
    #[error("handler does not accept {kind} payloads")]
    UnsupportedPayload { kind: PayloadKind },

    /// The primary store rejected the message; the transaction is not processed.
    #[error("failed to persist feed message {message_id}")]
    Persistence {
        message_id: FeedMessageId,
        #[source]
        source: DomainError,
    },

    /// The message is durable but its creation event could not be published.
    #[error("failed to publish creation event for feed message {message_id}")]
    Publication {
        message_id: FeedMessageId,
        #[source]
        source: DomainError,
    },
}

pub type Result<T> = std::result::Result<T, HandlerError>;
