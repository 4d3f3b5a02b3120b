//! EVM gateway for the blind-poll betting contract over JSON-RPC.

use alloy::{
    network::EthereumWallet,
    primitives::{Address, B256, U256},
    providers::{Provider, ProviderBuilder},
    signers::local::PrivateKeySigner,
    sol,
    transports::http::{reqwest::Client, Http},
};
use async_trait::async_trait;
use tracing::info;

use super::{ChainError, PayoutReceipt, PollChain, PollCreatedEvent, PollDetails};

sol! {
    #[sol(rpc)]
    contract BlindPollBet {
        event PollCreated(uint256 pollId, address indexed creator, uint32 startTime, uint32 duration, uint8 mode);

        function deployedBlock() external view returns (uint256);
        function pollDetails(uint256 pollId) external view returns (bool isPaid, bool isTerminated, uint16 betCount, uint32 totalAmount, bytes32 secretSalt);
        function payPoll(uint256 pollId, bytes32 secretSalt) external returns (bool);
    }
}

pub struct EvmGateway {
    rpc_url: String,
    contract: Address,
    signer: PrivateKeySigner,
}

impl EvmGateway {
    pub fn new(rpc_url: impl Into<String>, contract: Address, signer: PrivateKeySigner) -> Self {
        Self {
            rpc_url: rpc_url.into(),
            contract,
            signer,
        }
    }

    fn read_provider(&self) -> Result<impl Provider<Http<Client>>, ChainError> {
        let url = self
            .rpc_url
            .parse()
            .map_err(|e| ChainError::Rpc(format!("invalid RPC URL: {e}")))?;
        Ok(ProviderBuilder::new().on_http(url))
    }

    fn write_provider(&self) -> Result<impl Provider<Http<Client>>, ChainError> {
        let url = self
            .rpc_url
            .parse()
            .map_err(|e| ChainError::Rpc(format!("invalid RPC URL: {e}")))?;
        let wallet = EthereumWallet::from(self.signer.clone());
        Ok(ProviderBuilder::new().wallet(wallet).on_http(url))
    }
}

#[async_trait]
impl PollChain for EvmGateway {
    async fn block_number(&self) -> Result<u64, ChainError> {
        let provider = self.read_provider()?;
        provider
            .get_block_number()
            .await
            .map_err(|e| ChainError::Rpc(e.to_string()))
    }

    async fn deployed_block(&self) -> Result<u64, ChainError> {
        let provider = self.read_provider()?;
        let contract = BlindPollBet::new(self.contract, &provider);
        let block = contract
            .deployedBlock()
            .call()
            .await
            .map_err(|e| ChainError::Contract(e.to_string()))?;
        block
            ._0
            .try_into()
            .map_err(|_| ChainError::Contract("deployedBlock out of u64 range".to_string()))
    }

    async fn poll_created_events(
        &self,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<PollCreatedEvent>, ChainError> {
        let provider = self.read_provider()?;
        let contract = BlindPollBet::new(self.contract, &provider);

        let logs = contract
            .PollCreated_filter()
            .from_block(from_block)
            .to_block(to_block)
            .query()
            .await
            .map_err(|e| ChainError::Rpc(e.to_string()))?;

        let mut events = Vec::with_capacity(logs.len());
        for (event, log) in logs {
            let poll_id = event
                .pollId
                .try_into()
                .map_err(|_| ChainError::Contract("pollId out of u64 range".to_string()))?;
            events.push(PollCreatedEvent {
                poll_id,
                creator: event.creator,
                start_time: u64::from(event.startTime),
                duration: u64::from(event.duration),
                mode: event.mode,
                block_number: log.block_number.unwrap_or(to_block),
            });
        }
        Ok(events)
    }

    async fn poll_details(&self, poll_id: u64) -> Result<PollDetails, ChainError> {
        let provider = self.read_provider()?;
        let contract = BlindPollBet::new(self.contract, &provider);
        let details = contract
            .pollDetails(U256::from(poll_id))
            .call()
            .await
            .map_err(|e| ChainError::Contract(e.to_string()))?;
        Ok(PollDetails {
            is_paid: details.isPaid,
            is_terminated: details.isTerminated,
        })
    }

    async fn estimate_payout_gas(&self, poll_id: u64, salt: B256) -> Result<u64, ChainError> {
        let provider = self.write_provider()?;
        let contract = BlindPollBet::new(self.contract, &provider);
        contract
            .payPoll(U256::from(poll_id), salt)
            .from(self.signer.address())
            .estimate_gas()
            .await
            .map_err(|e| ChainError::GasEstimation(e.to_string()))
    }

    async fn submit_payout(
        &self,
        poll_id: u64,
        salt: B256,
        gas_limit: u64,
    ) -> Result<PayoutReceipt, ChainError> {
        let provider = self.write_provider()?;
        let contract = BlindPollBet::new(self.contract, &provider);

        let pending = contract
            .payPoll(U256::from(poll_id), salt)
            .from(self.signer.address())
            .gas(gas_limit)
            .send()
            .await
            .map_err(|e| ChainError::Submission(e.to_string()))?;

        let tx_hash = *pending.tx_hash();
        info!(poll_id, tx_hash = %tx_hash, "payout transaction submitted");

        let receipt = pending
            .get_receipt()
            .await
            .map_err(|e| ChainError::Submission(e.to_string()))?;

        if !receipt.status() {
            return Err(ChainError::Submission(format!(
                "payout transaction {tx_hash} reverted"
            )));
        }

        Ok(PayoutReceipt {
            tx_hash,
            block_number: receipt.block_number,
            gas_used: receipt.gas_used as u64,
        })
    }
}
