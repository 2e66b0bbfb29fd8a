//! # storage-adapters
//!
//! Concrete implementations of the ports defined in `domains`.
//! Engines behind optional features are compiled only when enabled.

pub mod cache;
pub mod chain;
pub mod events;
pub mod local;
pub mod memory;

#[cfg(feature = "db-sqlite")]
pub mod sqlite;

#[cfg(feature = "redis")]
pub mod redis_cache;

#[cfg(test)]
mod test_support;

pub use cache::InMemoryFeedMessageCache;
pub use chain::ChainTipTracker;
pub use events::BroadcastEventBus;
pub use local::{LocalPermanentAttachmentStore, LocalTemporaryAttachmentStore};
pub use memory::{
    InMemoryFeedMessageStore, InMemoryPermanentAttachmentStore, InMemoryTemporaryAttachmentStore,
};

#[cfg(feature = "db-sqlite")]
pub use sqlite::SqliteFeedMessageStore;

#[cfg(feature = "redis")]
pub use redis_cache::RedisFeedMessageCache;
