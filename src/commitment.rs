//! Commitment hashes and salts for the blind-poll commit-reveal cycle.

use std::sync::Arc;

use alloy::primitives::{b256, keccak256, Address, B256};
use tracing::debug;

use crate::store::{keys, Store, StoreError, StoreExt};

/// Sentinel salt used when settling polls whose salt was never recorded.
/// Settling with it weakens the commit-reveal guarantee, so every use is
/// logged as a degraded-mode event by the caller.
pub const ZERO_SALT: B256 =
    b256!("3078300000000000000000000000000000000000000000000000000000000000");

pub struct CommitmentHashService {
    store: Arc<dyn Store>,
}

impl CommitmentHashService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Returns the salt recorded for `(contract, poll_id)`, generating and
    /// persisting a fresh 32-byte value on first use.
    ///
    /// A salt is never regenerated while present: that would invalidate
    /// every hash already issued against it.
    pub async fn get_or_create_salt(
        &self,
        contract: Address,
        poll_id: u64,
    ) -> Result<B256, StoreError> {
        let key = keys::salt(&contract, poll_id);
        if let Some(stored) = self.store.get::<String>(&key).await? {
            return parse_salt(&key, &stored);
        }

        let salt = B256::from(rand::random::<[u8; 32]>());
        self.store.put(&key, &salt.to_string()).await?;
        debug!(poll_id, "generated commitment salt");
        Ok(salt)
    }

    /// Read-only lookup used by settlement. A missing salt is `None`; the
    /// caller decides whether to degrade to [`ZERO_SALT`].
    pub async fn stored_salt(
        &self,
        contract: Address,
        poll_id: u64,
    ) -> Result<Option<B256>, StoreError> {
        let key = keys::salt(&contract, poll_id);
        match self.store.get::<String>(&key).await? {
            Some(stored) => parse_salt(&key, &stored).map(Some),
            None => Ok(None),
        }
    }

    /// keccak256 over the packed fixed-width encoding
    /// `choice (1 byte) + address (20 bytes) + salt (32 bytes)`,
    /// bit-exact with the contract's `getHash` pure function.
    pub fn compute_hash(choice: u8, bettor: Address, salt: B256) -> B256 {
        let mut packed = [0u8; 53];
        packed[0] = choice;
        packed[1..21].copy_from_slice(bettor.as_slice());
        packed[21..53].copy_from_slice(salt.as_slice());
        keccak256(packed)
    }
}

fn parse_salt(key: &str, stored: &str) -> Result<B256, StoreError> {
    stored
        .parse()
        .map_err(|_| StoreError::Backend(format!("corrupt salt under {key}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::{CountingStore, MemoryStore};

    fn addr(s: &str) -> Address {
        s.parse().unwrap()
    }

    #[test]
    fn hash_matches_packed_keccak_reference() {
        // Reference digests computed with an independent keccak256
        // implementation over the same packed encoding.
        let hash = CommitmentHashService::compute_hash(
            3,
            addr("0x8ba1f109551bd432803012645ac136ddd64dba72"),
            ZERO_SALT,
        );
        assert_eq!(
            hash,
            b256!("9fba1e8508b17893b1849c7e24fc06df58d1e1a3917f620a36b5b9ed403ba853")
        );

        let salt = b256!("0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef");
        let hash = CommitmentHashService::compute_hash(
            7,
            addr("0xd6e60e0fbbe52a3c4317cd118dc0ca8cefcea5bc"),
            salt,
        );
        assert_eq!(
            hash,
            b256!("a8ab67d558e6f80fa13519420ca22fcc8d41d6a839f425269f2b5fa6f3b54f01")
        );
    }

    #[test]
    fn hash_is_sensitive_to_every_field() {
        let bettor = addr("0x8ba1f109551bd432803012645ac136ddd64dba72");
        let other = addr("0xd6e60e0fbbe52a3c4317cd118dc0ca8cefcea5bc");
        let salt = b256!("0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef");

        let base = CommitmentHashService::compute_hash(3, bettor, salt);
        assert_ne!(base, CommitmentHashService::compute_hash(4, bettor, salt));
        assert_ne!(base, CommitmentHashService::compute_hash(3, other, salt));
        assert_ne!(base, CommitmentHashService::compute_hash(3, bettor, ZERO_SALT));
        // Pure function: repeated evaluation is stable.
        assert_eq!(base, CommitmentHashService::compute_hash(3, bettor, salt));
    }

    #[tokio::test]
    async fn salt_is_stable_and_written_once() {
        let store = Arc::new(CountingStore::new());
        let service = CommitmentHashService::new(store.clone());
        let contract = addr("0xd6e60e0fbbe52a3c4317cd118dc0ca8cefcea5bc");

        let first = service.get_or_create_salt(contract, 7).await.unwrap();
        assert_eq!(store.put_count(), 1);

        let second = service.get_or_create_salt(contract, 7).await.unwrap();
        assert_eq!(first, second);
        // The second call served the stored value without writing.
        assert_eq!(store.put_count(), 1);
    }

    #[tokio::test]
    async fn salts_are_scoped_per_contract_and_poll() {
        let store = Arc::new(MemoryStore::new());
        let service = CommitmentHashService::new(store);
        let contract = addr("0xd6e60e0fbbe52a3c4317cd118dc0ca8cefcea5bc");
        let other = addr("0x8ba1f109551bd432803012645ac136ddd64dba72");

        let a = service.get_or_create_salt(contract, 1).await.unwrap();
        let b = service.get_or_create_salt(contract, 2).await.unwrap();
        let c = service.get_or_create_salt(other, 1).await.unwrap();
        assert_ne!(a, b);
        assert_ne!(a, c);

        // Settlement sees exactly what the hash endpoint stored.
        let seen = service.stored_salt(contract, 1).await.unwrap();
        assert_eq!(seen, Some(a));
        assert_eq!(service.stored_salt(other, 99).await.unwrap(), None);
    }
}
