use std::path::Path;

use async_trait::async_trait;
use rocksdb::{Options, DB};

use super::{Store, StoreError};

/// RocksDB-backed store.
///
/// The handle is opened once at bootstrap and released when the process shuts
/// down; rocksdb serializes concurrent access internally.
pub struct RocksStore {
    db: DB,
}

impl RocksStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        let db = DB::open(&opts, path).map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(Self { db })
    }
}

#[async_trait]
impl Store for RocksStore {
    async fn get_raw(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        self.db
            .get(key.as_bytes())
            .map_err(|e| StoreError::Backend(e.to_string()))
    }

    async fn put_raw(&self, key: &str, value: Vec<u8>) -> Result<(), StoreError> {
        self.db
            .put(key.as_bytes(), value)
            .map_err(|e| StoreError::Backend(e.to_string()))
    }
}
