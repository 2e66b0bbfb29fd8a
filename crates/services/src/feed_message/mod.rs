//! # Feed Message Ingestion
//!
//! Turns a validated "new feed message" transaction into durable state:
//!
//! ```text
//! assemble ─► primary store ─► attachments (temp ─► permanent) ─► cache ─► event
//!                  │                                                 (best-effort)
//!                  └── failure is returned to the pipeline
//! ```

pub mod assembler;
pub mod attachments;
pub mod handler;
pub mod persistence;

pub use assembler::FeedMessageAssembler;
pub use attachments::{AttachmentMigrator, AttachmentOutcome};
pub use handler::{FeedMessageDependencies, HandleOutcome, NewFeedMessageHandler};
pub use persistence::{PersistedMessage, Propagation, WriteThroughCoordinator};
