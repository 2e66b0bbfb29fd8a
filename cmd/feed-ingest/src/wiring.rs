//! Assembles the handler from settings. Engines whose feature is not compiled
//! in fall back to their in-process counterpart with a warning.

use configs::{Settings, StorageBackend};
use domains::{
    FeedMessageCache, FeedMessageStore, PermanentAttachmentStore, TemporaryAttachmentStore,
};
use services::{FeedMessageDependencies, HandlerMetrics, NewFeedMessageHandler};
use std::sync::Arc;
use storage_adapters::{
    BroadcastEventBus, ChainTipTracker, InMemoryFeedMessageCache, InMemoryFeedMessageStore,
    InMemoryPermanentAttachmentStore, InMemoryTemporaryAttachmentStore,
    LocalPermanentAttachmentStore, LocalTemporaryAttachmentStore,
};
use tracing::{info, warn};

#[cfg(any(feature = "db-sqlite", feature = "redis"))]
use secrecy::ExposeSecret;

pub struct App {
    pub handler: NewFeedMessageHandler,
    pub chain: Arc<ChainTipTracker>,
    pub events: Arc<BroadcastEventBus>,
}

pub async fn build(settings: &Settings, metrics: HandlerMetrics) -> anyhow::Result<App> {
    let chain = Arc::new(ChainTipTracker::new(domains::BlockIndex::new(
        settings.chain.initial_block_index,
    )));
    let events = Arc::new(BroadcastEventBus::with_capacity(
        settings.events.channel_capacity,
    ));
    let (temporary_attachments, permanent_attachments) = attachment_stores(settings).await?;

    let handler = NewFeedMessageHandler::new(FeedMessageDependencies {
        chain_state: chain.clone(),
        message_store: message_store(settings).await?,
        message_cache: message_cache(settings)?,
        temporary_attachments,
        permanent_attachments,
        event_publisher: events.clone(),
    })
    .with_metrics(metrics);

    Ok(App {
        handler,
        chain,
        events,
    })
}

async fn message_store(settings: &Settings) -> anyhow::Result<Arc<dyn FeedMessageStore>> {
    match &settings.storage.database_url {
        #[cfg(feature = "db-sqlite")]
        Some(url) => {
            let store =
                storage_adapters::SqliteFeedMessageStore::connect(url.expose_secret(), 5).await?;
            info!("Using SQLite feed message store");
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "db-sqlite"))]
        Some(_) => {
            warn!("storage.database_url is set but db-sqlite is not compiled in; using memory");
            Ok(Arc::new(InMemoryFeedMessageStore::new()))
        }
        None => Ok(Arc::new(InMemoryFeedMessageStore::new())),
    }
}

fn message_cache(settings: &Settings) -> anyhow::Result<Arc<dyn FeedMessageCache>> {
    let max = settings.cache.max_messages_per_feed;
    match &settings.cache.redis_url {
        #[cfg(feature = "redis")]
        Some(url) => {
            info!("Using Redis feed message cache");
            Ok(Arc::new(storage_adapters::RedisFeedMessageCache::new(
                url.expose_secret(),
                max,
            )?))
        }
        #[cfg(not(feature = "redis"))]
        Some(_) => {
            warn!("cache.redis_url is set but redis is not compiled in; using memory");
            Ok(Arc::new(InMemoryFeedMessageCache::new(max)))
        }
        None => Ok(Arc::new(InMemoryFeedMessageCache::new(max))),
    }
}

async fn attachment_stores(
    settings: &Settings,
) -> anyhow::Result<(
    Arc<dyn TemporaryAttachmentStore>,
    Arc<dyn PermanentAttachmentStore>,
)> {
    match settings.storage.backend {
        StorageBackend::Memory => Ok((
            Arc::new(InMemoryTemporaryAttachmentStore::new()),
            Arc::new(InMemoryPermanentAttachmentStore::new()),
        )),
        StorageBackend::Filesystem => {
            let temp_root = settings.temporary_attachment_root();
            let permanent_root = settings.permanent_attachment_root();
            tokio::fs::create_dir_all(&temp_root).await?;
            tokio::fs::create_dir_all(&permanent_root).await?;
            info!(
                temp = %temp_root.display(),
                permanent = %permanent_root.display(),
                "Using filesystem attachment storage"
            );
            Ok((
                Arc::new(LocalTemporaryAttachmentStore::new(temp_root)),
                Arc::new(LocalPermanentAttachmentStore::new(permanent_root)),
            ))
        }
    }
}
