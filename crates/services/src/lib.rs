//! feed-ledger/crates/services/src/lib.rs
//!
//! Application services: the transaction handlers that turn validated chain
//! transactions into application state.

pub mod error;
pub mod feed_message;
pub mod metrics;

#[cfg(test)]
mod test_support;

pub use error::{HandlerError, Result};
pub use feed_message::{
    AttachmentOutcome, FeedMessageDependencies, HandleOutcome, NewFeedMessageHandler,
};
pub use metrics::HandlerMetrics;
