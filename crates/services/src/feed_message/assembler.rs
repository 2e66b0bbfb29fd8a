//! Builds the durable [`FeedMessage`] record from a validated transaction.

use domains::{ChainState, FeedMessage, NewFeedMessagePayload, ValidatedTransaction};
use std::sync::Arc;

pub struct FeedMessageAssembler {
    chain_state: Arc<dyn ChainState>,
}

impl FeedMessageAssembler {
    pub fn new(chain_state: Arc<dyn ChainState>) -> Self {
        Self { chain_state }
    }

    /// Stamps the message with the chain tip observed now, not with any block
    /// number the transaction might carry.
    pub fn assemble(
        &self,
        transaction: &ValidatedTransaction<NewFeedMessagePayload>,
    ) -> FeedMessage {
        let payload = transaction.payload();
        let attachment_ids = payload
            .attachments
            .as_ref()
            .map(|refs| refs.iter().map(|r| r.id.clone()).collect());

        FeedMessage::new(
            payload.feed_message_id,
            payload.feed_id,
            payload.message_content.clone(),
            transaction.sender().clone(),
            self.chain_state.current_block_index(),
            transaction.timestamp(),
            payload.reply_to,
            attachment_ids,
        )
    }
}
