use crate::error::{AppError, AppResult};
use crate::settlement::scheduler::GasCeilingPolicy;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    RocksDb,
    Memory,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_address: String,
    pub rpc_url: String,
    pub chain_private_key: String,
    pub poll_contract_address: String,
    pub storage_backend: StorageBackend,
    pub storage_path: String,
    pub settlement_interval_secs: u64,
    pub gas_ceiling: u64,
    pub gas_ceiling_policy: GasCeilingPolicy,
    pub reset_state: bool,
}

impl Config {
    pub fn from_env() -> AppResult<Self> {
        Ok(Self {
            bind_address: std::env::var("BIND_ADDRESS")
                .unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            rpc_url: require("RPC_URL")?,
            chain_private_key: require("CHAIN_PRIVATE_KEY")?,
            poll_contract_address: require("POLL_CONTRACT_ADDRESS")?,
            storage_backend: match std::env::var("STORAGE_BACKEND").as_deref() {
                Ok("memory") => StorageBackend::Memory,
                Ok("rocksdb") | Err(_) => StorageBackend::RocksDb,
                Ok(other) => {
                    return Err(AppError::Config(format!("unknown storage backend: {other}")))
                }
            },
            storage_path: std::env::var("STORAGE_PATH").unwrap_or_else(|_| "./storage".to_string()),
            settlement_interval_secs: parse_or("SETTLEMENT_INTERVAL_SECS", 60)?,
            gas_ceiling: parse_or("GAS_CEILING", 500_000)?,
            gas_ceiling_policy: match std::env::var("GAS_CEILING_POLICY") {
                Ok(raw) => raw.parse().map_err(AppError::Config)?,
                Err(_) => GasCeilingPolicy::Warn,
            },
            reset_state: std::env::var("RESET_STATE")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
        })
    }
}

fn require(name: &str) -> AppResult<String> {
    std::env::var(name).map_err(|_| AppError::Config(format!("{name} must be set")))
}

fn parse_or(name: &str, default: u64) -> AppResult<u64> {
    match std::env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| AppError::Config(format!("{name} must be an integer"))),
        Err(_) => Ok(default),
    }
}
