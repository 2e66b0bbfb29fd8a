//! Line-oriented ingestion: one confirmed block per line, as JSON.
//!
//! ```json
//! {"block_index": 101, "transactions": [ { "transaction": {...}, "validator_signature": {...} } ]}
//! ```

use domains::{BlockIndex, TransactionPayload, ValidatedTransaction};
use serde::Deserialize;
use services::{HandlerError, NewFeedMessageHandler};
use storage_adapters::ChainTipTracker;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
pub struct BlockBatch {
    pub block_index: BlockIndex,
    pub transactions: Vec<ValidatedTransaction<TransactionPayload>>,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct IngestSummary {
    pub blocks: usize,
    pub messages: usize,
    pub skipped_transactions: usize,
    pub malformed_lines: usize,
}

/// Processes batches until end of input. Stops at the first transaction the
/// handler fails on; everything before it stays committed.
pub async fn ingest<R>(
    mut reader: R,
    chain: &ChainTipTracker,
    handler: &NewFeedMessageHandler,
) -> anyhow::Result<IngestSummary>
where
    R: AsyncBufRead + Unpin,
{
    let mut summary = IngestSummary::default();
    let mut buf = Vec::new();
    let mut line_no = 0usize;

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }
        line_no += 1;
        if buf.iter().all(u8::is_ascii_whitespace) {
            continue;
        }
        // Raw bytes so that a line of invalid UTF-8 is just another bad line.
        let batch: BlockBatch = match serde_json::from_slice(&buf) {
            Ok(batch) => batch,
            Err(err) => {
                warn!(line = line_no, error = %err, "Skipping malformed block line");
                summary.malformed_lines += 1;
                continue;
            }
        };

        chain.advance_to(batch.block_index);
        summary.blocks += 1;

        for transaction in &batch.transactions {
            let kind = transaction.payload().kind();
            if !NewFeedMessageHandler::handles(kind) {
                debug!(line = line_no, kind = %kind, "No handler registered for payload kind");
                summary.skipped_transactions += 1;
                continue;
            }
            handler.handle(transaction).await.map_err(|err: HandlerError| {
                anyhow::Error::new(err).context(format!("block on line {line_no}"))
            })?;
            summary.messages += 1;
        }
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use domains::{
        ChainState, FeedId, FeedMessageId, FeedMessageStore, NewFeedMessagePayload,
        NewPersonalFeedPayload, PublicAddress, Signature, SignedTransaction,
    };
    use services::FeedMessageDependencies;
    use std::sync::Arc;
    use storage_adapters::{
        BroadcastEventBus, InMemoryFeedMessageCache, InMemoryFeedMessageStore,
        InMemoryPermanentAttachmentStore, InMemoryTemporaryAttachmentStore,
    };

    fn validated(payload: TransactionPayload) -> ValidatedTransaction<TransactionPayload> {
        ValidatedTransaction {
            transaction: SignedTransaction {
                payload,
                timestamp: chrono::Utc::now(),
                user_signature: Signature {
                    signatory: PublicAddress::new("04beef"),
                    signature: "sig".into(),
                },
            },
            validator_signature: Signature {
                signatory: PublicAddress::new("validator"),
                signature: "vsig".into(),
            },
        }
    }

    fn new_message(content: &str) -> (FeedMessageId, ValidatedTransaction<TransactionPayload>) {
        let id = FeedMessageId::random();
        let tx = validated(TransactionPayload::NewFeedMessage(NewFeedMessagePayload {
            feed_message_id: id,
            feed_id: FeedId::random(),
            message_content: content.into(),
            reply_to: None,
            attachments: None,
        }));
        (id, tx)
    }

    fn block_line(block_index: u64, txs: &[ValidatedTransaction<TransactionPayload>]) -> String {
        serde_json::json!({ "block_index": block_index, "transactions": txs }).to_string()
    }

    struct Fixture {
        chain: Arc<ChainTipTracker>,
        store: Arc<InMemoryFeedMessageStore>,
        handler: NewFeedMessageHandler,
    }

    fn fixture() -> Fixture {
        let chain = Arc::new(ChainTipTracker::default());
        let store = Arc::new(InMemoryFeedMessageStore::new());
        let handler = NewFeedMessageHandler::new(FeedMessageDependencies {
            chain_state: chain.clone(),
            message_store: store.clone(),
            message_cache: Arc::new(InMemoryFeedMessageCache::default()),
            temporary_attachments: Arc::new(InMemoryTemporaryAttachmentStore::new()),
            permanent_attachments: Arc::new(InMemoryPermanentAttachmentStore::new()),
            event_publisher: Arc::new(BroadcastEventBus::new()),
        });
        Fixture {
            chain,
            store,
            handler,
        }
    }

    #[tokio::test]
    async fn test_ingest_stamps_messages_with_block_tip() {
        let fx = fixture();
        let (first, tx1) = new_message("hello");
        let (second, tx2) = new_message("again");
        let input = format!(
            "{}\n\n{}\n",
            block_line(100, &[tx1]),
            block_line(101, &[tx2])
        );

        let summary = ingest(input.as_bytes(), &fx.chain, &fx.handler)
            .await
            .unwrap();

        assert_eq!(
            summary,
            IngestSummary {
                blocks: 2,
                messages: 2,
                skipped_transactions: 0,
                malformed_lines: 0,
            }
        );
        let stored = fx.store.find_by_id(first).await.unwrap().unwrap();
        assert_eq!(stored.block_index(), BlockIndex::new(100));
        let stored = fx.store.find_by_id(second).await.unwrap().unwrap();
        assert_eq!(stored.block_index(), BlockIndex::new(101));
        assert_eq!(fx.chain.current_block_index(), BlockIndex::new(101));
    }

    #[tokio::test]
    async fn test_malformed_line_is_skipped() {
        let fx = fixture();
        let (id, tx) = new_message("after the noise");
        let input = format!("not json at all\n{}\n", block_line(7, &[tx]));

        let summary = ingest(input.as_bytes(), &fx.chain, &fx.handler)
            .await
            .unwrap();

        assert_eq!(summary.malformed_lines, 1);
        assert_eq!(summary.messages, 1);
        assert!(fx.store.find_by_id(id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_invalid_utf8_line_is_skipped() {
        let fx = fixture();
        let (id, tx) = new_message("after binary junk");
        let mut input = vec![0xff, 0xfe, b'\n'];
        input.extend_from_slice(block_line(9, &[tx]).as_bytes());
        input.push(b'\n');

        let summary = ingest(input.as_slice(), &fx.chain, &fx.handler)
            .await
            .unwrap();

        assert_eq!(summary.malformed_lines, 1);
        assert_eq!(summary.messages, 1);
        assert!(fx.store.find_by_id(id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_unhandled_payload_kind_is_skipped() {
        let fx = fixture();
        let feed = validated(TransactionPayload::NewPersonalFeed(NewPersonalFeedPayload {
            feed_id: FeedId::random(),
            title: "mine".into(),
        }));
        let input = block_line(3, &[feed]);

        let summary = ingest(input.as_bytes(), &fx.chain, &fx.handler)
            .await
            .unwrap();

        assert_eq!(summary.skipped_transactions, 1);
        assert_eq!(summary.messages, 0);
        assert!(fx.store.is_empty());
        assert_eq!(fx.chain.current_block_index(), BlockIndex::new(3));
    }

    #[tokio::test]
    async fn test_primary_store_failure_stops_ingestion() {
        let fx = fixture();
        let (_, tx) = new_message("twice");
        // Replaying the same message id is a primary-store conflict.
        let input = format!("{}\n{}\n", block_line(1, &[tx.clone()]), block_line(2, &[tx]));

        let err = ingest(input.as_bytes(), &fx.chain, &fx.handler)
            .await
            .unwrap_err();

        assert!(err.to_string().contains("line 2"));
        assert!(err.downcast_ref::<HandlerError>().is_some());
        assert_eq!(fx.store.len(), 1);
    }
}
