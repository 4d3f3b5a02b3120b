use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use super::{Store, StoreError};

/// In-memory store for development and tests. Same contract as the durable
/// backend, minus persistence across restarts.
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn get_raw(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.entries.read().get(key).cloned())
    }

    async fn put_raw(&self, key: &str, value: Vec<u8>) -> Result<(), StoreError> {
        self.entries.write().insert(key.to_string(), value);
        Ok(())
    }
}

/// Wrapper that counts writes, used to assert "no store write happened".
#[cfg(test)]
pub struct CountingStore {
    pub inner: MemoryStore,
    pub puts: std::sync::atomic::AtomicUsize,
}

#[cfg(test)]
impl CountingStore {
    pub fn new() -> Self {
        Self {
            inner: MemoryStore::new(),
            puts: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    pub fn put_count(&self) -> usize {
        self.puts.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(test)]
#[async_trait]
impl Store for CountingStore {
    async fn get_raw(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        self.inner.get_raw(key).await
    }

    async fn put_raw(&self, key: &str, value: Vec<u8>) -> Result<(), StoreError> {
        self.puts.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        self.inner.put_raw(key, value).await
    }
}
