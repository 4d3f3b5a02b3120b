pub mod keys;
pub mod memory;
pub mod rocks;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("storage backend error: {0}")]
    Backend(String),

    #[error("stored value could not be encoded: {0}")]
    Codec(#[from] serde_json::Error),
}

/// Durable get/put of JSON values under string keys.
///
/// A miss is `Ok(None)`, never an error; backends report only genuine I/O
/// failures. The scheduler and hash service are the sole writers of their
/// respective keys, so no compare-and-swap surface is needed here.
#[async_trait]
pub trait Store: Send + Sync {
    async fn get_raw(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;
    async fn put_raw(&self, key: &str, value: Vec<u8>) -> Result<(), StoreError>;
}

/// Typed accessors layered over the raw byte contract.
#[async_trait]
pub trait StoreExt: Store {
    async fn get<T: DeserializeOwned + Send>(&self, key: &str) -> Result<Option<T>, StoreError> {
        match self.get_raw(key).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn put<T: Serialize + Sync>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec(value)?;
        self.put_raw(key, bytes).await
    }
}

impl<S: Store + ?Sized> StoreExt for S {}
