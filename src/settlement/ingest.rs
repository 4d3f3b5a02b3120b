use std::sync::Arc;

use tracing::info;

use crate::chain::PollChain;
use crate::error::AppResult;
use crate::settlement::models::Poll;
use crate::settlement::pending::PendingSetManager;
use crate::store::{keys, Store, StoreExt};

/// Incrementally folds newly created polls into local state.
pub struct IngestionTracker {
    chain: Arc<dyn PollChain>,
    store: Arc<dyn Store>,
    pending: PendingSetManager,
}

impl IngestionTracker {
    pub fn new(chain: Arc<dyn PollChain>, store: Arc<dyn Store>) -> Self {
        let pending = PendingSetManager::new(store.clone());
        Self {
            chain,
            store,
            pending,
        }
    }

    /// Scans `(cursor, head]` for `PollCreated` events, records each poll and
    /// extends the pending set. On the very first run the scan starts at the
    /// contract's recorded deployment block instead.
    ///
    /// The cursor advances only after every write in the batch succeeded, so
    /// a failed batch is re-scanned next cycle. Poll records are
    /// event-derived, which makes the duplicate delivery safe.
    pub async fn ingest(&self, from_block: Option<u64>) -> AppResult<Vec<u64>> {
        let cursor = match from_block {
            Some(block) => Some(block),
            None => self.store.get::<u64>(keys::LAST_BLOCK).await?,
        };
        let from = match cursor {
            Some(block) => block + 1,
            None => self.chain.deployed_block().await?,
        };
        let head = self.chain.block_number().await?;

        let mut pending = self.pending.load().await?;
        if from > head {
            return Ok(pending);
        }

        let events = self.chain.poll_created_events(from, head).await?;
        for event in &events {
            let poll = Poll::from_event(event);
            self.store.put(&keys::poll(poll.poll_id), &poll).await?;
            if !pending.contains(&poll.poll_id) {
                pending.push(poll.poll_id);
            }
        }

        self.pending.save(&pending).await?;
        self.store.put(keys::LAST_BLOCK, &head).await?;

        if !events.is_empty() {
            info!(
                from_block = from,
                to_block = head,
                discovered = events.len(),
                "ingested new polls"
            );
        }
        Ok(pending)
    }

    /// Operator reset: rewinds the cursor to block 1 and clears the pending
    /// set, forcing a full re-scan on the next cycle.
    pub async fn reset(&self) -> AppResult<()> {
        self.store.put(keys::LAST_BLOCK, &1u64).await?;
        self.pending.save(&[]).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settlement::testing::{poll_event, MockChain};
    use crate::store::memory::MemoryStore;
    use crate::store::StoreError;
    use async_trait::async_trait;
    use parking_lot::Mutex;

    /// Store double whose writes fail while a key prefix is armed.
    struct FailingStore {
        inner: MemoryStore,
        fail_prefix: Mutex<Option<String>>,
    }

    impl FailingStore {
        fn failing_on(prefix: &str) -> Self {
            Self {
                inner: MemoryStore::new(),
                fail_prefix: Mutex::new(Some(prefix.to_string())),
            }
        }

        fn heal(&self) {
            *self.fail_prefix.lock() = None;
        }
    }

    #[async_trait]
    impl Store for FailingStore {
        async fn get_raw(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
            self.inner.get_raw(key).await
        }

        async fn put_raw(&self, key: &str, value: Vec<u8>) -> Result<(), StoreError> {
            if let Some(prefix) = self.fail_prefix.lock().as_deref() {
                if key.starts_with(prefix) {
                    return Err(StoreError::Backend("injected write failure".to_string()));
                }
            }
            self.inner.put_raw(key, value).await
        }
    }

    #[tokio::test]
    async fn discovers_polls_and_advances_cursor() {
        let chain = Arc::new(MockChain::new(3, 10));
        chain.push_event(poll_event(1, 1000, 500, 5));
        chain.push_event(poll_event(2, 1100, 300, 7));
        let store = Arc::new(MemoryStore::new());
        let tracker = IngestionTracker::new(chain, store.clone());

        let pending = tracker.ingest(None).await.unwrap();
        assert_eq!(pending, vec![1, 2]);
        assert_eq!(store.get::<u64>(keys::LAST_BLOCK).await.unwrap(), Some(10));

        let poll: Poll = store.get(&keys::poll(1)).await.unwrap().unwrap();
        assert_eq!(poll.end_time, 1500);
    }

    #[tokio::test]
    async fn reingestion_with_unchanged_head_is_idempotent() {
        let chain = Arc::new(MockChain::new(3, 10));
        chain.push_event(poll_event(1, 1000, 500, 5));
        let store = Arc::new(MemoryStore::new());
        let tracker = IngestionTracker::new(chain, store.clone());

        let first = tracker.ingest(None).await.unwrap();
        let second = tracker.ingest(None).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(store.get::<u64>(keys::LAST_BLOCK).await.unwrap(), Some(10));
    }

    #[tokio::test]
    async fn first_run_scans_from_deployment_block_inclusive() {
        let chain = Arc::new(MockChain::new(3, 10));
        // Created in the deployment block itself; must not be skipped.
        chain.push_event(poll_event(1, 1000, 500, 3));
        let tracker = IngestionTracker::new(chain, Arc::new(MemoryStore::new()));

        assert_eq!(tracker.ingest(None).await.unwrap(), vec![1]);
    }

    #[tokio::test]
    async fn explicit_from_block_is_exclusive() {
        let chain = Arc::new(MockChain::new(3, 10));
        chain.push_event(poll_event(1, 1000, 500, 4));
        let tracker = IngestionTracker::new(chain, Arc::new(MemoryStore::new()));

        // Scan (4, 10]; the block-4 event is before the window.
        assert!(tracker.ingest(Some(4)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn cursor_stalls_when_a_batch_write_fails() {
        let chain = Arc::new(MockChain::new(3, 10));
        chain.push_event(poll_event(1, 1000, 500, 5));
        let store = Arc::new(FailingStore::failing_on("poll-"));
        let tracker = IngestionTracker::new(chain, store.clone());

        assert!(tracker.ingest(None).await.is_err());
        // Cursor untouched: the same range is retried next cycle.
        assert_eq!(store.get::<u64>(keys::LAST_BLOCK).await.unwrap(), None);

        store.heal();
        let pending = tracker.ingest(None).await.unwrap();
        assert_eq!(pending, vec![1]);
        assert_eq!(store.get::<u64>(keys::LAST_BLOCK).await.unwrap(), Some(10));
    }

    #[tokio::test]
    async fn reset_rewinds_cursor_and_clears_pending() {
        let chain = Arc::new(MockChain::new(3, 10));
        chain.push_event(poll_event(1, 1000, 500, 5));
        let store = Arc::new(MemoryStore::new());
        let tracker = IngestionTracker::new(chain, store.clone());

        tracker.ingest(None).await.unwrap();
        tracker.reset().await.unwrap();
        assert_eq!(store.get::<u64>(keys::LAST_BLOCK).await.unwrap(), Some(1));
        assert_eq!(
            store.get::<Vec<u64>>(keys::POLLS_PENDING).await.unwrap(),
            Some(vec![])
        );
    }
}
