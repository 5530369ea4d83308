//! Test Utilities Module
//!
//! In-memory fakes for every external collaborator of the swap pipeline,
//! plus helpers to build an executor around them. Nothing here touches the
//! network and every wait is recorded instead of slept.
//!
//! These utilities are only compiled when running tests or when the
//! `test_utils` feature is enabled.

#![cfg(any(test, feature = "test_utils"))]

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde_json::json;
use solana_sdk::{
    hash::Hash,
    message::{v0, AddressLookupTableAccount, VersionedMessage},
    pubkey,
    pubkey::Pubkey,
    signature::Keypair,
    signer::Signer,
    transaction::VersionedTransaction,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use crate::errors::SwapError;
use crate::orchestrator::{ExecutorSettings, SwapExecutor};
use crate::services::{BundleService, ChainClient, SwapAggregator};
use crate::timing::Sleeper;
use crate::tx_builder::{tip_instruction, BundleEnvelope, SignedSwapTransaction, UnsignedSwapTransaction};
use crate::types::{
    AccountPayload, BundleId, BundleStatus, InstructionPayload, Quote, QuoteRequest,
    SwapInstructions, SwapRequest,
};
use crate::wallet::WalletManager;

pub const USDC_MINT: Pubkey = pubkey!("EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v");

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Fake Jupiter API
///
/// Quotes echo the requested slippage. Swap instruction data embeds the
/// quote's slippage and a call counter, so every attempt produces a
/// distinct transaction.
pub struct FakeAggregator {
    program_id: Pubkey,
    pool: Pubkey,
    out_amount: u64,
    failing_quotes: AtomicU32,
    quote_requests: Mutex<Vec<QuoteRequest>>,
    instruction_calls: AtomicUsize,
}

impl FakeAggregator {
    pub fn new() -> Self {
        Self {
            program_id: Pubkey::new_unique(),
            pool: Pubkey::new_unique(),
            out_amount: 154_321,
            failing_quotes: AtomicU32::new(0),
            quote_requests: Mutex::new(Vec::new()),
            instruction_calls: AtomicUsize::new(0),
        }
    }

    /// Fail the first `n` quote requests
    pub fn with_quote_failures(self, n: u32) -> Self {
        self.failing_quotes.store(n, Ordering::SeqCst);
        self
    }

    /// Fail every quote request
    pub fn failing_quotes(self) -> Self {
        self.with_quote_failures(u32::MAX)
    }

    pub fn program_id(&self) -> Pubkey {
        self.program_id
    }

    pub fn quote_requests(&self) -> Vec<QuoteRequest> {
        lock(&self.quote_requests).clone()
    }

    pub fn instruction_calls(&self) -> usize {
        self.instruction_calls.load(Ordering::SeqCst)
    }
}

impl Default for FakeAggregator {
    fn default() -> Self {
        Self::new()
    }
}

fn payload(program: &Pubkey, accounts: &[(Pubkey, bool, bool)], data: &[u8]) -> InstructionPayload {
    InstructionPayload {
        program_id: program.to_string(),
        accounts: accounts
            .iter()
            .map(|(key, is_signer, is_writable)| AccountPayload {
                pubkey: key.to_string(),
                is_signer: *is_signer,
                is_writable: *is_writable,
            })
            .collect(),
        data: BASE64.encode(data),
    }
}

#[async_trait]
impl SwapAggregator for FakeAggregator {
    async fn quote(&self, request: &QuoteRequest) -> Result<Quote, SwapError> {
        let call = {
            let mut requests = lock(&self.quote_requests);
            requests.push(request.clone());
            requests.len()
        };

        let failing = self.failing_quotes.load(Ordering::SeqCst);
        if failing > 0 {
            if failing != u32::MAX {
                self.failing_quotes.store(failing - 1, Ordering::SeqCst);
            }
            return Err(SwapError::Quote("Could not find any route".to_string()));
        }

        Quote::from_response(json!({
            "inputMint": request.input_mint.to_string(),
            "inAmount": request.amount.to_string(),
            "outputMint": request.output_mint.to_string(),
            "outAmount": self.out_amount.to_string(),
            "otherAmountThreshold": self.out_amount.to_string(),
            "swapMode": "ExactIn",
            "slippageBps": request.slippage_bps,
            "priceImpactPct": "0.001",
            "routePlan": [{ "percent": 100, "swapInfo": { "label": "FakeAmm" } }],
            "contextSlot": call,
        }))
    }

    async fn swap_instructions(
        &self,
        quote: &Quote,
        user: &Pubkey,
    ) -> Result<SwapInstructions, SwapError> {
        let call = self.instruction_calls.fetch_add(1, Ordering::SeqCst) as u64;
        let mut data = quote.slippage_bps.to_le_bytes().to_vec();
        data.extend_from_slice(&call.to_le_bytes());

        Ok(SwapInstructions {
            setup_instructions: vec![payload(
                &self.program_id,
                &[(*user, true, true)],
                &[0],
            )],
            swap_instruction: payload(
                &self.program_id,
                &[(*user, true, true), (self.pool, false, true)],
                &data,
            ),
            cleanup_instruction: None,
            address_lookup_table_addresses: vec![],
        })
    }
}

/// Simulation behaviour of `FakeChain`
#[derive(Debug, Clone)]
pub enum SimMode {
    Units(u64),
    RentShortfall,
    Failure(String),
    /// Fail with a transport error `failures` times, then succeed
    TransportFailures { failures: u32, then_units: u64 },
}

/// Fake Solana RPC
pub struct FakeChain {
    sim: SimMode,
    fees: Result<Vec<u64>, String>,
    simulations: Mutex<Vec<VersionedTransaction>>,
    blockhashes: AtomicUsize,
}

impl FakeChain {
    pub fn new() -> Self {
        Self {
            sim: SimMode::Units(120_000),
            fees: Ok(vec![5_000, 15_000, 25_000]),
            simulations: Mutex::new(Vec::new()),
            blockhashes: AtomicUsize::new(0),
        }
    }

    pub fn with_sim(mut self, mode: SimMode) -> Self {
        self.sim = mode;
        self
    }

    pub fn with_fees(mut self, fees: Vec<u64>) -> Self {
        self.fees = Ok(fees);
        self
    }

    pub fn with_fee_error(mut self) -> Self {
        self.fees = Err("fee endpoint unavailable".to_string());
        self
    }

    pub fn simulation_count(&self) -> usize {
        lock(&self.simulations).len()
    }

    pub fn simulated_transactions(&self) -> Vec<VersionedTransaction> {
        lock(&self.simulations).clone()
    }

    pub fn blockhash_requests(&self) -> usize {
        self.blockhashes.load(Ordering::SeqCst)
    }
}

impl Default for FakeChain {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChainClient for FakeChain {
    async fn token_decimals(&self, mint: &Pubkey) -> Result<u8, SwapError> {
        Ok(if *mint == spl_token::native_mint::id() { 9 } else { 6 })
    }

    async fn latest_blockhash(&self) -> Result<Hash, SwapError> {
        self.blockhashes.fetch_add(1, Ordering::SeqCst);
        Ok(Hash::new_unique())
    }

    async fn recent_prioritization_fees(&self) -> Result<Vec<u64>, SwapError> {
        self.fees.clone().map_err(SwapError::Rpc)
    }

    async fn simulate(&self, tx: &VersionedTransaction) -> Result<u64, SwapError> {
        let count = {
            let mut sims = lock(&self.simulations);
            sims.push(tx.clone());
            sims.len() as u32
        };

        match &self.sim {
            SimMode::Units(units) => Ok(*units),
            SimMode::RentShortfall => Err(SwapError::InsufficientFundsForRent {
                account_index: Some(2),
            }),
            SimMode::Failure(reason) => Err(SwapError::Simulation(reason.clone())),
            SimMode::TransportFailures {
                failures,
                then_units,
            } => {
                if count <= *failures {
                    Err(SwapError::Rpc("connection reset by peer".to_string()))
                } else {
                    Ok(*then_units)
                }
            }
        }
    }

    async fn lookup_tables(
        &self,
        keys: &[Pubkey],
    ) -> Result<Vec<AddressLookupTableAccount>, SwapError> {
        Ok(keys
            .iter()
            .map(|key| AddressLookupTableAccount {
                key: *key,
                addresses: vec![],
            })
            .collect())
    }
}

/// Fake Jito block engine with scripted responses
///
/// Statuses are consumed in order across all polls; once the script runs
/// out every poll answers `Pending`. Send results default to success.
pub struct ScriptedBundler {
    statuses: Mutex<VecDeque<Option<BundleStatus>>>,
    send_results: Mutex<VecDeque<bool>>,
    poll_errors: AtomicU32,
    submitted: Mutex<Vec<BundleEnvelope>>,
    polled: Mutex<Vec<BundleId>>,
}

impl ScriptedBundler {
    pub fn new() -> Self {
        Self {
            statuses: Mutex::new(VecDeque::new()),
            send_results: Mutex::new(VecDeque::new()),
            poll_errors: AtomicU32::new(0),
            submitted: Mutex::new(Vec::new()),
            polled: Mutex::new(Vec::new()),
        }
    }

    pub fn with_statuses(self, statuses: Vec<Option<BundleStatus>>) -> Self {
        lock(&self.statuses).extend(statuses);
        self
    }

    /// `false` entries make the matching `send_bundle` call fail
    pub fn with_send_results(self, results: Vec<bool>) -> Self {
        lock(&self.send_results).extend(results);
        self
    }

    /// Fail the first `n` status polls with a transport error
    pub fn with_poll_errors(self, n: u32) -> Self {
        self.poll_errors.store(n, Ordering::SeqCst);
        self
    }

    /// Successfully submitted bundles
    pub fn submitted(&self) -> Vec<BundleEnvelope> {
        lock(&self.submitted).clone()
    }

    pub fn submission_count(&self) -> usize {
        lock(&self.submitted).len()
    }

    pub fn polled_ids(&self) -> Vec<BundleId> {
        lock(&self.polled).clone()
    }
}

impl Default for ScriptedBundler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BundleService for ScriptedBundler {
    async fn send_bundle(&self, bundle: &BundleEnvelope) -> Result<BundleId, SwapError> {
        let accepted = lock(&self.send_results).pop_front().unwrap_or(true);
        if !accepted {
            return Err(SwapError::bundler("connection refused"));
        }
        let mut submitted = lock(&self.submitted);
        submitted.push(bundle.clone());
        Ok(BundleId::new(format!("bundle-{}", submitted.len())))
    }

    async fn bundle_status(&self, id: &BundleId) -> Result<Option<BundleStatus>, SwapError> {
        lock(&self.polled).push(id.clone());

        let errors = self.poll_errors.load(Ordering::SeqCst);
        if errors > 0 {
            self.poll_errors.store(errors - 1, Ordering::SeqCst);
            return Err(SwapError::bundler("status endpoint timed out"));
        }
        Ok(lock(&self.statuses)
            .pop_front()
            .unwrap_or(Some(BundleStatus::Pending)))
    }
}

/// Sleeper that records requested waits and returns immediately
#[derive(Debug, Default)]
pub struct RecordingSleeper {
    sleeps: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sleeps(&self) -> Vec<Duration> {
        lock(&self.sleeps).clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        lock(&self.sleeps).push(duration);
    }
}

/// Swap of 0.001 wrapped SOL into USDC at 100 bps with 3 attempts
pub fn sample_request() -> SwapRequest {
    SwapRequest {
        input_mint: spl_token::native_mint::id(),
        output_mint: USDC_MINT,
        amount: 0.001,
        base_slippage_bps: 100,
        max_retries: 3,
    }
}

/// Signed single-instruction transaction from a throwaway wallet
pub fn signed_transaction() -> SignedSwapTransaction {
    let keypair = Keypair::new();
    let ix = tip_instruction(&keypair.pubkey(), 10_000)
        .unwrap_or_else(|| solana_sdk::system_instruction::transfer(&keypair.pubkey(), &Pubkey::new_unique(), 1));
    let message = v0::Message::try_compile(&keypair.pubkey(), &[ix], &[], Hash::new_unique())
        .expect("compile test message");
    UnsignedSwapTransaction::new(VersionedMessage::V0(message))
        .sign(&keypair)
        .expect("sign test transaction")
}

/// Executor over the given fakes with a recording sleeper and default
/// settings (2 s retry delay, 3 polls every 15 s, no simulation retry wait)
pub fn test_executor(
    aggregator: Arc<FakeAggregator>,
    chain: Arc<FakeChain>,
    bundler: Arc<ScriptedBundler>,
) -> (SwapExecutor, Arc<RecordingSleeper>) {
    let mut settings = ExecutorSettings::default();
    settings.compute_budget.retry_interval = Duration::ZERO;

    let sleeper = Arc::new(RecordingSleeper::new());
    let executor = SwapExecutor::new(
        aggregator,
        chain,
        bundler,
        WalletManager::from_keypair(Keypair::new()),
        settings,
    )
    .with_sleeper(sleeper.clone());
    (executor, sleeper)
}
