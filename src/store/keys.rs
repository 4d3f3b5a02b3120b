//! Logical key layout for the poll store.
//!
//! All durable state lives under these keys; the scheduler and hash service
//! are the sole writers of their respective entries.

use alloy::primitives::Address;

/// Highest block number fully scanned by ingestion.
pub const LAST_BLOCK: &str = "last-block";

/// Ordered sequence of poll ids awaiting a settlement decision.
pub const POLLS_PENDING: &str = "polls-pending";

/// Ordered sequence of poll ids whose settlement attempt failed.
pub const POLLS_ERROR: &str = "polls-error";

pub fn poll(poll_id: u64) -> String {
    format!("poll-{poll_id}")
}

/// Salt keys carry the contract address so several deployments can share one
/// store without colliding. The address is lowercased to keep the key
/// independent of caller checksum casing.
pub fn salt(contract: &Address, poll_id: u64) -> String {
    format!("saltHash-0x{}-{}", hex::encode(contract.as_slice()), poll_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn salt_key_is_casing_independent() {
        let a: Address = "0xD6e60E0FBBE52a3C4317cD118dc0Ca8cEfCeA5BC".parse().unwrap();
        let b: Address = "0xd6e60e0fbbe52a3c4317cd118dc0ca8cefcea5bc".parse().unwrap();
        assert_eq!(salt(&a, 7), salt(&b, 7));
        assert_eq!(
            salt(&a, 7),
            "saltHash-0xd6e60e0fbbe52a3c4317cd118dc0ca8cefcea5bc-7"
        );
    }
}
