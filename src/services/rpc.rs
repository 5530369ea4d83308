//! Solana RPC adapter

use async_trait::async_trait;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_rpc_client_api::config::RpcSimulateTransactionConfig;
use solana_sdk::{
    address_lookup_table::state::AddressLookupTable,
    commitment_config::CommitmentConfig,
    hash::Hash,
    message::AddressLookupTableAccount,
    pubkey::Pubkey,
    transaction::{TransactionError, VersionedTransaction},
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use super::ChainClient;
use crate::config::RpcConfig;
use crate::errors::SwapError;

/// `ChainClient` backed by the nonblocking `RpcClient`
///
/// The client is shared read-only; clones point at the same connection pool.
#[derive(Clone)]
pub struct RpcChainClient {
    client: Arc<RpcClient>,
}

impl RpcChainClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        let client = RpcClient::new_with_timeout_and_commitment(
            url.into(),
            timeout,
            CommitmentConfig::confirmed(),
        );
        Self {
            client: Arc::new(client),
        }
    }

    pub fn from_config(config: &RpcConfig) -> Self {
        Self::new(&config.url, Duration::from_secs(config.timeout_secs))
    }

    pub fn from_client(client: Arc<RpcClient>) -> Self {
        Self { client }
    }

    pub fn url(&self) -> String {
        self.client.url()
    }
}

impl std::fmt::Debug for RpcChainClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcChainClient")
            .field("url", &self.client.url())
            .finish()
    }
}

#[async_trait]
impl ChainClient for RpcChainClient {
    async fn token_decimals(&self, mint: &Pubkey) -> Result<u8, SwapError> {
        let supply = self
            .client
            .get_token_supply(mint)
            .await
            .map_err(|e| SwapError::Rpc(format!("token supply for {}: {}", mint, e)))?;
        Ok(supply.decimals)
    }

    async fn latest_blockhash(&self) -> Result<Hash, SwapError> {
        self.client
            .get_latest_blockhash()
            .await
            .map_err(|e| SwapError::Rpc(format!("latest blockhash: {}", e)))
    }

    async fn recent_prioritization_fees(&self) -> Result<Vec<u64>, SwapError> {
        let mut fees = self
            .client
            .get_recent_prioritization_fees(&[])
            .await
            .map_err(|e| SwapError::Rpc(format!("recent prioritization fees: {}", e)))?;
        fees.sort_by_key(|f| f.slot);
        Ok(fees.into_iter().map(|f| f.prioritization_fee).collect())
    }

    async fn simulate(&self, tx: &VersionedTransaction) -> Result<u64, SwapError> {
        let config = RpcSimulateTransactionConfig {
            sig_verify: false,
            replace_recent_blockhash: true,
            commitment: Some(CommitmentConfig::processed()),
            ..RpcSimulateTransactionConfig::default()
        };

        let response = self
            .client
            .simulate_transaction_with_config(tx, config)
            .await
            .map_err(|e| SwapError::Rpc(format!("simulate transaction: {}", e)))?;
        let result = response.value;

        if let Some(err) = result.err {
            if let Some(logs) = &result.logs {
                debug!(logs = %logs.join(" | "), "Simulation logs");
            }
            return Err(classify_simulation_error(&TransactionError::from(err)));
        }

        result.units_consumed.ok_or_else(|| {
            SwapError::Simulation("simulation did not report consumed units".to_string())
        })
    }

    async fn lookup_tables(
        &self,
        keys: &[Pubkey],
    ) -> Result<Vec<AddressLookupTableAccount>, SwapError> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let accounts = self
            .client
            .get_multiple_accounts(keys)
            .await
            .map_err(|e| SwapError::LookupTable(format!("fetch failed: {}", e)))?;

        keys.iter()
            .zip(accounts)
            .map(|(key, account)| {
                let account = account.ok_or_else(|| {
                    SwapError::LookupTable(format!("lookup table {} not found", key))
                })?;
                let table = AddressLookupTable::deserialize(&account.data).map_err(|e| {
                    SwapError::LookupTable(format!("lookup table {} is malformed: {}", key, e))
                })?;
                Ok(AddressLookupTableAccount {
                    key: *key,
                    addresses: table.addresses.to_vec(),
                })
            })
            .collect()
    }
}

/// Map a simulation failure onto the error taxonomy.
///
/// Only this adapter sees `TransactionError`; everything downstream matches
/// on `SwapError::InsufficientFundsForRent`.
pub(crate) fn classify_simulation_error(err: &TransactionError) -> SwapError {
    match err {
        TransactionError::InsufficientFundsForRent { account_index } => {
            warn!(account_index = *account_index, "Simulation reports insufficient funds for rent");
            SwapError::InsufficientFundsForRent {
                account_index: Some(*account_index),
            }
        }
        other => SwapError::Simulation(format!("{} ({:?})", other, other)),
    }
}
