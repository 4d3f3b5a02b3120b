use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;
use tracing::info;

use crate::api::handler::AppState;
use crate::chain::{evm::EvmGateway, PollChain};
use crate::commitment::CommitmentHashService;
use crate::config::{Config, StorageBackend};
use crate::error::{AppError, AppResult};
use crate::settlement::ingest::IngestionTracker;
use crate::settlement::scheduler::{SettlementConfig, SettlementScheduler};
use crate::store::{memory::MemoryStore, rocks::RocksStore, Store};

pub async fn initialize_app_state(config: &Config) -> AppResult<AppState> {
    info!("Initializing application components ...");

    let store: Arc<dyn Store> = match config.storage_backend {
        StorageBackend::RocksDb => {
            let store = RocksStore::open(&config.storage_path)?;
            info!(path = %config.storage_path, "✅ RocksDB store opened");
            Arc::new(store)
        }
        StorageBackend::Memory => {
            info!("✅ In-memory store selected, state will not survive restarts");
            Arc::new(MemoryStore::new())
        }
    };

    let contract: Address = config.poll_contract_address.parse().map_err(|_| {
        AppError::Config("POLL_CONTRACT_ADDRESS is not a valid address".to_string())
    })?;
    let signer: PrivateKeySigner = config.chain_private_key.parse().map_err(|_| {
        AppError::Config("CHAIN_PRIVATE_KEY is not a valid signing key".to_string())
    })?;

    let chain: Arc<dyn PollChain> =
        Arc::new(EvmGateway::new(config.rpc_url.clone(), contract, signer));
    info!(contract = %contract, "✅ Chain gateway initialized");

    if config.reset_state {
        IngestionTracker::new(chain.clone(), store.clone())
            .reset()
            .await?;
        info!("Ingestion state reset: cursor rewound, pending set cleared");
    }

    let scheduler = Arc::new(SettlementScheduler::new(
        chain,
        store.clone(),
        contract,
        SettlementConfig {
            gas_ceiling: config.gas_ceiling,
            gas_ceiling_policy: config.gas_ceiling_policy,
        },
    ));
    let _ = scheduler.start(Duration::from_secs(config.settlement_interval_secs));
    info!(
        interval_secs = config.settlement_interval_secs,
        "✅ Settlement scheduler started"
    );

    Ok(AppState {
        commitments: Arc::new(CommitmentHashService::new(store)),
    })
}
