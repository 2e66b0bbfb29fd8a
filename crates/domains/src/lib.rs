//! feed-ledger/crates/domains/src/lib.rs
//!
//! The domain model and port definitions for the feed ledger.

pub mod error;
pub mod events;
pub mod models;
pub mod traits;
pub mod transactions;

// Re-exporting for easier access in other crates
pub use error::*;
pub use events::*;
pub use models::*;
pub use traits::*;
pub use transactions::*;
