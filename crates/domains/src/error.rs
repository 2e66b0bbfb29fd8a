//! # DomainError
//!
//! Failures reported by collaborators across the port boundary.
//! Adapters map their engine-specific errors (SQL, Redis, filesystem) into these.

use thiserror::Error;

/// The error type returned by every port in [`crate::traits`].
#[derive(Error, Debug)]
pub enum DomainError {
    /// Resource already exists (e.g. duplicate FeedMessageId)
    #[error("conflict: {0}")]
    Conflict(String),

    /// System-of-record failure (e.g. database down, disk full)
    #[error("storage error: {0}")]
    Storage(String),

    /// Cache backend failure
    #[error("cache error: {0}")]
    Cache(String),

    /// The event bus refused or failed to deliver an event
    #[error("event publication failed: {0}")]
    Publish(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// A specialized Result type for port operations.
pub type Result<T> = std::result::Result<T, DomainError>;
