use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::Address;
use chrono::Utc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::{error, info, warn};

use crate::chain::{ChainError, PollChain};
use crate::commitment::{CommitmentHashService, ZERO_SALT};
use crate::error::{AppError, AppResult};
use crate::settlement::ingest::IngestionTracker;
use crate::settlement::models::Poll;
use crate::settlement::pending::PendingSetManager;
use crate::store::{keys, Store, StoreExt};

/// Gas-ceiling handling for payout submissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GasCeilingPolicy {
    /// Log a warning and submit anyway (the permissive default).
    Warn,
    /// Treat the poll as failed and route it to the error set.
    Abort,
}

impl FromStr for GasCeilingPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "warn" => Ok(Self::Warn),
            "abort" => Ok(Self::Abort),
            other => Err(format!("unknown gas ceiling policy: {other}")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SettlementConfig {
    pub gas_ceiling: u64,
    pub gas_ceiling_policy: GasCeilingPolicy,
}

impl Default for SettlementConfig {
    fn default() -> Self {
        Self {
            gas_ceiling: 500_000,
            gas_ceiling_policy: GasCeilingPolicy::Warn,
        }
    }
}

/// Per-poll outcome of one settlement evaluation.
enum Decision {
    /// Betting window still open; stays pending.
    Keep,
    /// Settled now, or already final on chain. Leaves the pending set.
    Done,
}

/// Drives the reconcile-and-settle cycle over the pending set.
pub struct SettlementScheduler {
    chain: Arc<dyn PollChain>,
    store: Arc<dyn Store>,
    contract: Address,
    commitments: CommitmentHashService,
    ingestion: IngestionTracker,
    pending: PendingSetManager,
    config: SettlementConfig,
    /// Serializes whole cycles; interleaved read-modify-write of the shared
    /// sets would lose updates.
    cycle_lock: Mutex<()>,
}

impl SettlementScheduler {
    pub fn new(
        chain: Arc<dyn PollChain>,
        store: Arc<dyn Store>,
        contract: Address,
        config: SettlementConfig,
    ) -> Self {
        Self {
            commitments: CommitmentHashService::new(store.clone()),
            ingestion: IngestionTracker::new(chain.clone(), store.clone()),
            pending: PendingSetManager::new(store.clone()),
            chain,
            store,
            contract,
            config,
            cycle_lock: Mutex::new(()),
        }
    }

    /// Spawns the periodic cycle driver.
    pub fn start(self: Arc<Self>, every: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = interval(every);
            loop {
                ticker.tick().await;
                match self.run_cycle().await {
                    Ok(remaining) => {
                        info!(pending = remaining.len(), "✓ settlement cycle completed")
                    }
                    Err(e) => error!(error = %e, "settlement cycle failed"),
                }
            }
        })
    }

    pub async fn run_cycle(&self) -> AppResult<Vec<u64>> {
        self.run_cycle_at(Utc::now().timestamp().max(0) as u64).await
    }

    /// One full reconciliation pass.
    ///
    /// Ingestion commits before any settlement evaluation reads state, so a
    /// just-created poll always has its record in place. Every per-poll
    /// decision is collected locally first; each durable key is then written
    /// exactly once.
    pub async fn run_cycle_at(&self, now: u64) -> AppResult<Vec<u64>> {
        let _cycle = self.cycle_lock.lock().await;

        let pending = self.ingestion.ingest(None).await?;

        let mut next_pending = Vec::new();
        let mut errored = Vec::new();
        for poll_id in pending {
            match self.evaluate(poll_id, now).await {
                Ok(Decision::Keep) => next_pending.push(poll_id),
                Ok(Decision::Done) => {}
                Err(e) => {
                    error!(poll_id, error = %e, "settlement failed, routing to error set");
                    errored.push(poll_id);
                }
            }
        }

        if !errored.is_empty() {
            self.pending.record_errors(&errored).await?;
        }
        self.pending.save(&next_pending).await?;
        Ok(next_pending)
    }

    async fn evaluate(&self, poll_id: u64, now: u64) -> AppResult<Decision> {
        let poll: Poll = self
            .store
            .get(&keys::poll(poll_id))
            .await?
            .ok_or_else(|| AppError::Internal(format!("no stored record for poll {poll_id}")))?;

        if poll.is_open(now) {
            return Ok(Decision::Keep);
        }

        // Idempotency boundary: chain state that is already final makes
        // settlement a no-op, whoever got there first.
        let details = self.chain.poll_details(poll_id).await?;
        if details.is_paid || details.is_terminated {
            info!(poll_id, "poll already settled on chain");
            return Ok(Decision::Done);
        }

        self.pay_poll(poll_id).await?;
        Ok(Decision::Done)
    }

    /// Commit-reveal payout for a single closed poll.
    pub async fn pay_poll(&self, poll_id: u64) -> AppResult<()> {
        let salt = match self.commitments.stored_salt(self.contract, poll_id).await? {
            Some(salt) => salt,
            None => {
                warn!(
                    poll_id,
                    "no commitment salt recorded, settling with the zero-salt sentinel"
                );
                ZERO_SALT
            }
        };

        let estimated = self.chain.estimate_payout_gas(poll_id, salt).await?;
        if estimated > self.config.gas_ceiling {
            match self.config.gas_ceiling_policy {
                GasCeilingPolicy::Warn => warn!(
                    poll_id,
                    estimated,
                    ceiling = self.config.gas_ceiling,
                    "payout gas estimate exceeds ceiling, submitting anyway"
                ),
                GasCeilingPolicy::Abort => {
                    return Err(ChainError::GasCeilingExceeded {
                        estimated,
                        ceiling: self.config.gas_ceiling,
                    }
                    .into())
                }
            }
        }

        let receipt = self.chain.submit_payout(poll_id, salt, estimated).await?;
        info!(
            poll_id,
            tx_hash = %receipt.tx_hash,
            block = ?receipt.block_number,
            gas_used = receipt.gas_used,
            "payout confirmed"
        );
        Ok(())
    }
}
