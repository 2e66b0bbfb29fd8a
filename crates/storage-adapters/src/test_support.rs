use domains::{BlockIndex, FeedId, FeedMessage, FeedMessageId, PublicAddress};

pub fn message(feed_id: FeedId, block_index: u64) -> FeedMessage {
    FeedMessage::new(
        FeedMessageId::random(),
        feed_id,
        format!("message at {block_index}"),
        PublicAddress::new("04a1b2c3d4"),
        BlockIndex::new(block_index),
        chrono::Utc::now(),
        None,
        None,
    )
}
