//! External collaborators of the swap pipeline
//!
//! The orchestrator only talks to these traits. Production adapters live in
//! the submodules; tests substitute in-memory fakes from `test_utils`.

use async_trait::async_trait;
use solana_sdk::{
    hash::Hash, message::AddressLookupTableAccount, pubkey::Pubkey,
    transaction::VersionedTransaction,
};

use crate::errors::SwapError;
use crate::tx_builder::BundleEnvelope;
use crate::types::{BundleId, BundleStatus, Quote, QuoteRequest, SwapInstructions};

pub mod jito;
pub mod jupiter;
pub mod rpc;

pub use jito::JitoClient;
pub use jupiter::JupiterClient;
pub use rpc::RpcChainClient;

/// Quote and instruction source (Jupiter)
#[async_trait]
pub trait SwapAggregator: Send + Sync {
    async fn quote(&self, request: &QuoteRequest) -> Result<Quote, SwapError>;

    /// Instruction set for exactly this quote, with `user` as the payer
    async fn swap_instructions(
        &self,
        quote: &Quote,
        user: &Pubkey,
    ) -> Result<SwapInstructions, SwapError>;
}

/// Read-only view of the chain
#[async_trait]
pub trait ChainClient: Send + Sync {
    async fn token_decimals(&self, mint: &Pubkey) -> Result<u8, SwapError>;

    async fn latest_blockhash(&self) -> Result<Hash, SwapError>;

    /// Recent per-slot prioritization fees (micro-lamports), oldest slot first
    async fn recent_prioritization_fees(&self) -> Result<Vec<u64>, SwapError>;

    /// Dry-run `tx` and return the consumed compute units.
    ///
    /// A rent shortfall must be reported as
    /// `SwapError::InsufficientFundsForRent`; transport failures as
    /// `SwapError::Rpc`; every other failed simulation as
    /// `SwapError::Simulation`.
    async fn simulate(&self, tx: &VersionedTransaction) -> Result<u64, SwapError>;

    async fn lookup_tables(
        &self,
        keys: &[Pubkey],
    ) -> Result<Vec<AddressLookupTableAccount>, SwapError>;
}

/// Bundle submission endpoint (Jito block engine)
#[async_trait]
pub trait BundleService: Send + Sync {
    /// Submit a bundle; every call yields a new id
    async fn send_bundle(&self, bundle: &BundleEnvelope) -> Result<BundleId, SwapError>;

    /// Current status, `None` when the engine returned nothing for the id
    async fn bundle_status(&self, id: &BundleId) -> Result<Option<BundleStatus>, SwapError>;
}
