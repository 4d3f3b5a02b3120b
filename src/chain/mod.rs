pub mod evm;

use alloy::primitives::{Address, B256};
use async_trait::async_trait;
use thiserror::Error;

/// Chain-side errors
#[derive(Error, Debug)]
pub enum ChainError {
    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("contract call failed: {0}")]
    Contract(String),

    #[error("gas estimation failed: {0}")]
    GasEstimation(String),

    #[error("gas estimate {estimated} exceeds ceiling {ceiling}")]
    GasCeilingExceeded { estimated: u64, ceiling: u64 },

    #[error("payout submission failed: {0}")]
    Submission(String),
}

/// A `PollCreated` event as observed on chain.
#[derive(Debug, Clone)]
pub struct PollCreatedEvent {
    pub poll_id: u64,
    pub creator: Address,
    pub start_time: u64,
    pub duration: u64,
    pub mode: u8,
    pub block_number: u64,
}

/// Chain-view poll state consulted before settlement.
#[derive(Debug, Clone, Copy, Default)]
pub struct PollDetails {
    pub is_paid: bool,
    pub is_terminated: bool,
}

/// Outcome of a confirmed payout submission.
#[derive(Debug, Clone)]
pub struct PayoutReceipt {
    pub tx_hash: B256,
    pub block_number: Option<u64>,
    pub gas_used: u64,
}

/// Read/write access to the poll contract.
///
/// Event queries take an inclusive block range; callers derive it from the
/// ingestion cursor. Submission blocks until the transaction is confirmed or
/// fails, with the assigned hash logged as soon as it is known.
#[async_trait]
pub trait PollChain: Send + Sync {
    async fn block_number(&self) -> Result<u64, ChainError>;

    async fn deployed_block(&self) -> Result<u64, ChainError>;

    async fn poll_created_events(
        &self,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<PollCreatedEvent>, ChainError>;

    async fn poll_details(&self, poll_id: u64) -> Result<PollDetails, ChainError>;

    async fn estimate_payout_gas(&self, poll_id: u64, salt: B256) -> Result<u64, ChainError>;

    async fn submit_payout(
        &self,
        poll_id: u64,
        salt: B256,
        gas_limit: u64,
    ) -> Result<PayoutReceipt, ChainError>;
}
