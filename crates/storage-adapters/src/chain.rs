//! Chain tip tracking.

use domains::{BlockIndex, ChainState};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::warn;

/// Holds the current chain tip. Fed by the block-index tracking service,
/// read by the transaction handlers.
#[derive(Debug, Default)]
pub struct ChainTipTracker {
    tip: AtomicU64,
}

impl ChainTipTracker {
    pub fn new(initial: BlockIndex) -> Self {
        Self {
            tip: AtomicU64::new(initial.value()),
        }
    }

    /// Moves the tip forward. An older index is ignored; the tip never goes back.
    /// Returns the tip after the call.
    pub fn advance_to(&self, index: BlockIndex) -> BlockIndex {
        let previous = self.tip.fetch_max(index.value(), Ordering::SeqCst);
        if index.value() < previous {
            warn!(current = previous, requested = %index, "Ignoring stale block index");
        }
        BlockIndex::new(previous.max(index.value()))
    }
}

impl ChainState for ChainTipTracker {
    fn current_block_index(&self) -> BlockIndex {
        BlockIndex::new(self.tip.load(Ordering::SeqCst))
    }
}
