//! Search index updates.
//!
//! Models that are visible in search push snapshots of themselves to a
//! [`SearchIndex`] after every successful write. Index updates are
//! fire-and-forget: delivery failures are logged and never reported back
//! to the caller, since a stale index entry is always preferable to a failed
//! write.

use std::sync::Arc;

use async_trait::async_trait;
use common::config;
use serde_json::Value;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::warn;

/// Search index update sink.
#[async_trait]
pub trait SearchIndex: Send + Sync {
    /// Insert or replace a document in the named index.
    async fn index(&self, name: &'static str, id: i64, document: Value);

    /// Remove a document from the named index.
    async fn remove(&self, name: &'static str, id: i64);
}

/// Index implementation that discards all updates.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullIndex;

#[async_trait]
impl SearchIndex for NullIndex {
    async fn index(&self, _: &'static str, _: i64, _: Value) {}

    async fn remove(&self, _: &'static str, _: i64) {}
}

/// Queued index update.
#[derive(Clone, Debug, PartialEq)]
pub enum IndexUpdate {
    Upsert {
        index: &'static str,
        id: i64,
        document: Value,
    },
    Remove {
        index: &'static str,
        id: i64,
    },
}

/// Index implementation that passes updates to a background consumer.
///
/// The consumer side is returned from [`QueuedIndex::new`] and is expected to
/// be drained by a task which talks to the actual search backend.
#[derive(Clone)]
pub struct QueuedIndex {
    sender: UnboundedSender<IndexUpdate>,
}

impl QueuedIndex {
    /// Create new queued index with its update receiver.
    pub fn new() -> (Self, UnboundedReceiver<IndexUpdate>) {
        let (sender, receiver) = mpsc::unbounded_channel();

        (Self { sender }, receiver)
    }

    fn push(&self, update: IndexUpdate) {
        if let Err(err) = self.sender.send(update) {
            warn!(update = ?err.0, "search index queue is closed, dropping update");
        }
    }
}

#[async_trait]
impl SearchIndex for QueuedIndex {
    async fn index(&self, name: &'static str, id: i64, document: Value) {
        self.push(IndexUpdate::Upsert {
            index: name,
            id,
            document,
        });
    }

    async fn remove(&self, name: &'static str, id: i64) {
        self.push(IndexUpdate::Remove { index: name, id });
    }
}

/// Create a search index from the provided [`Search`] configuration.
///
/// When indexing is enabled, the receiving side of the update queue is returned as well.
///
/// [`Search`]: config::Search
pub fn from_config(
    config: &config::Search,
) -> (Arc<dyn SearchIndex>, Option<UnboundedReceiver<IndexUpdate>>) {
    if config.enabled {
        let (index, receiver) = QueuedIndex::new();

        (Arc::new(index), Some(receiver))
    } else {
        (Arc::new(NullIndex), None)
    }
}

#[cfg(test)]
mod tests {
    use common::config;
    use serde_json::json;

    use super::{from_config, IndexUpdate, QueuedIndex, SearchIndex};

    #[tokio::test]
    async fn queued_updates() {
        let (index, mut receiver) = QueuedIndex::new();

        index.index("things#thing", 1, json!({ "id": 1 })).await;
        index.remove("things#thing", 1).await;

        assert_eq!(
            receiver.recv().await,
            Some(IndexUpdate::Upsert {
                index: "things#thing",
                id: 1,
                document: json!({ "id": 1 }),
            })
        );

        assert_eq!(
            receiver.recv().await,
            Some(IndexUpdate::Remove {
                index: "things#thing",
                id: 1,
            })
        );
    }

    #[tokio::test]
    async fn closed_queue() {
        let (index, receiver) = QueuedIndex::new();

        drop(receiver);

        // Updates are silently dropped once the consumer is gone.
        index.index("things#thing", 1, json!({})).await;
    }

    #[tokio::test]
    async fn configured_index() {
        let (index, receiver) = from_config(&config::Search { enabled: false });

        assert!(receiver.is_none());
        index.index("things#thing", 1, json!({})).await;

        let (index, receiver) = from_config(&config::Search { enabled: true });
        let mut receiver = receiver.expect("update queue is missing");

        index.remove("things#thing", 2).await;

        assert_eq!(
            receiver.recv().await,
            Some(IndexUpdate::Remove {
                index: "things#thing",
                id: 2,
            })
        );
    }
}
