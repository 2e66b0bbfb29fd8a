//! Prometheus counters for the transaction handlers.

use prometheus_client::metrics::counter::Counter;
use prometheus_client::registry::Registry;

/// Counters are cheap to clone; clones share the same underlying value.
#[derive(Clone, Debug, Default)]
pub struct HandlerMetrics {
    pub messages_persisted: Counter,
    pub cache_write_failures: Counter,
    pub attachments_migrated: Counter,
    pub attachments_missing: Counter,
    pub attachment_write_failures: Counter,
}

impl HandlerMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers all counters under the `feed_ledger` prefix.
    pub fn register(&self, registry: &mut Registry) {
        let registry = registry.sub_registry_with_prefix("feed_ledger");
        registry.register(
            "messages_persisted",
            "Feed messages written to the primary store",
            self.messages_persisted.clone(),
        );
        registry.register(
            "cache_write_failures",
            "Feed messages persisted without a cache update",
            self.cache_write_failures.clone(),
        );
        registry.register(
            "attachments_migrated",
            "Attachments moved from temporary to permanent storage",
            self.attachments_migrated.clone(),
        );
        registry.register(
            "attachments_missing",
            "Attachment references with nothing staged in temporary storage",
            self.attachments_missing.clone(),
        );
        registry.register(
            "attachment_write_failures",
            "Attachments that could not be read from temporary or written to permanent storage",
            self.attachment_write_failures.clone(),
        );
    }
}
