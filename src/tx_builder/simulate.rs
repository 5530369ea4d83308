//! Compute-unit estimation by simulation
//!
//! The instructions are dry-run under the maximum compute-unit limit with a
//! placeholder blockhash (the node replaces it) and no signatures. The
//! consumed units, widened by a safety margin, become the real budget.

use solana_sdk::{
    compute_budget::ComputeBudgetInstruction,
    hash::Hash,
    instruction::Instruction,
    message::{v0, AddressLookupTableAccount, VersionedMessage},
    pubkey::Pubkey,
    signature::Signature,
    transaction::VersionedTransaction,
};
use std::time::Duration;
use tokio_retry::{strategy::FixedInterval, RetryIf};
use tracing::{debug, warn};

use crate::errors::SwapError;
use crate::services::ChainClient;
use crate::types::SimulationResult;

/// Compute-unit limit carried by the simulation transaction
pub const SIMULATION_CU_LIMIT: u32 = 1_400_000;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComputeBudgetPolicy {
    /// Multiplier applied to consumed units
    pub margin: f64,
    pub min_cu_limit: u32,
    pub max_cu_limit: u32,
    /// Wait between transport-level retries of the simulation call
    pub retry_interval: Duration,
}

impl Default for ComputeBudgetPolicy {
    fn default() -> Self {
        Self {
            margin: 1.2,
            min_cu_limit: 10_000,
            max_cu_limit: SIMULATION_CU_LIMIT,
            retry_interval: Duration::from_millis(200),
        }
    }
}

/// Budget for `units_consumed`: margin applied, then clamped to the policy bounds
pub fn compute_unit_limit(units_consumed: u64, policy: &ComputeBudgetPolicy) -> u32 {
    let widened = (units_consumed as f64 * policy.margin).ceil();
    let widened = if widened.is_finite() && widened < u32::MAX as f64 {
        widened as u32
    } else {
        u32::MAX
    };
    widened.clamp(policy.min_cu_limit, policy.max_cu_limit)
}

fn simulation_transaction(
    instructions: &[Instruction],
    payer: &Pubkey,
    lookup_tables: &[AddressLookupTableAccount],
) -> Result<VersionedTransaction, SwapError> {
    let mut all = Vec::with_capacity(instructions.len() + 1);
    all.push(ComputeBudgetInstruction::set_compute_unit_limit(SIMULATION_CU_LIMIT));
    all.extend_from_slice(instructions);

    let message = v0::Message::try_compile(payer, &all, lookup_tables, Hash::default())
        .map_err(|e| SwapError::Assembly(format!("simulation message: {}", e)))?;
    let message = VersionedMessage::V0(message);
    let signers = crate::compat::get_num_required_signatures(&message) as usize;

    Ok(VersionedTransaction {
        signatures: vec![Signature::default(); signers],
        message,
    })
}

/// Simulate `instructions` and derive the compute-unit budget.
///
/// Transport failures (`SwapError::Rpc`) are retried up to `retry_hint`
/// times. A rent shortfall or any other simulation failure is returned
/// immediately.
pub async fn estimate_compute_budget(
    chain: &dyn ChainClient,
    instructions: &[Instruction],
    payer: &Pubkey,
    lookup_tables: &[AddressLookupTableAccount],
    retry_hint: usize,
    policy: &ComputeBudgetPolicy,
) -> Result<SimulationResult, SwapError> {
    let tx = simulation_transaction(instructions, payer, lookup_tables)?;
    let strategy = FixedInterval::new(policy.retry_interval).take(retry_hint);

    let units_consumed = RetryIf::spawn(
        strategy,
        || chain.simulate(&tx),
        |e: &SwapError| {
            let transient = matches!(e, SwapError::Rpc(_));
            if transient {
                warn!(error = %e, "Simulation transport error, retrying");
            }
            transient
        },
    )
    .await?;

    let compute_unit_limit = compute_unit_limit(units_consumed, policy);
    crate::metrics::metrics()
        .simulated_compute_units
        .observe(units_consumed as f64);
    debug!(
        units_consumed,
        compute_unit_limit,
        margin = policy.margin,
        "Compute budget estimated"
    );

    Ok(SimulationResult {
        units_consumed,
        compute_unit_limit,
    })
}
