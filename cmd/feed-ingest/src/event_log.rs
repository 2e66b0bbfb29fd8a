//! Logs feed events as they are published.

use domains::NewFeedMessageCreatedEvent;
use tokio::sync::broadcast::{error::RecvError, Receiver};
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Logs every event until the bus is dropped. Resolves to the number of
/// events logged; await it after releasing the bus so the backlog drains.
pub fn spawn(mut events: Receiver<NewFeedMessageCreatedEvent>) -> JoinHandle<u64> {
    tokio::spawn(async move {
        let mut logged = 0;
        loop {
            match events.recv().await {
                Ok(event) => {
                    info!(
                        feed_id = %event.message.feed_id(),
                        message_id = %event.message.id(),
                        block_index = %event.message.block_index(),
                        "Feed message created"
                    );
                    logged += 1;
                }
                Err(RecvError::Lagged(missed)) => {
                    warn!(missed, "Event logger fell behind");
                }
                Err(RecvError::Closed) => break,
            }
        }
        logged
    })
}
