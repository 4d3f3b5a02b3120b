use std::collections::HashSet;
use std::sync::Arc;

use crate::store::{keys, Store, StoreError, StoreExt};

/// Accessor for the durable pending and error sets.
///
/// Both are stored as ordered sequences with duplicates collapsed; this type
/// owns that representation so no other component has to re-implement it.
#[derive(Clone)]
pub struct PendingSetManager {
    store: Arc<dyn Store>,
}

impl PendingSetManager {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn load(&self) -> Result<Vec<u64>, StoreError> {
        let ids: Vec<u64> = self
            .store
            .get(keys::POLLS_PENDING)
            .await?
            .unwrap_or_default();
        Ok(dedup(ids))
    }

    pub async fn save(&self, ids: &[u64]) -> Result<(), StoreError> {
        self.store
            .put(keys::POLLS_PENDING, &dedup(ids.to_vec()))
            .await
    }

    pub async fn load_errors(&self) -> Result<Vec<u64>, StoreError> {
        let ids: Vec<u64> = self.store.get(keys::POLLS_ERROR).await?.unwrap_or_default();
        Ok(dedup(ids))
    }

    /// Folds failed poll ids into the durable error set. Members are never
    /// retried by the normal cycle; clearing the set is an operator action.
    pub async fn record_errors(&self, ids: &[u64]) -> Result<(), StoreError> {
        let mut errors = self.load_errors().await?;
        errors.extend_from_slice(ids);
        self.store.put(keys::POLLS_ERROR, &dedup(errors)).await
    }
}

/// First occurrence wins, order preserved.
fn dedup(ids: Vec<u64>) -> Vec<u64> {
    let mut seen = HashSet::new();
    ids.into_iter().filter(|id| seen.insert(*id)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;

    #[tokio::test]
    async fn save_collapses_duplicates_preserving_order() {
        let manager = PendingSetManager::new(Arc::new(MemoryStore::new()));
        manager.save(&[3, 1, 3, 2, 1]).await.unwrap();
        assert_eq!(manager.load().await.unwrap(), vec![3, 1, 2]);
    }

    #[tokio::test]
    async fn empty_set_loads_as_empty() {
        let manager = PendingSetManager::new(Arc::new(MemoryStore::new()));
        assert!(manager.load().await.unwrap().is_empty());
        assert!(manager.load_errors().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn record_errors_merges_into_existing_set() {
        let manager = PendingSetManager::new(Arc::new(MemoryStore::new()));
        manager.record_errors(&[2]).await.unwrap();
        manager.record_errors(&[3, 2]).await.unwrap();
        assert_eq!(manager.load_errors().await.unwrap(), vec![2, 3]);
    }
}
