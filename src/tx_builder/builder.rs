//! V0 transaction assembly

use solana_sdk::message::{v0, VersionedMessage};
use tracing::debug;

use super::context::AttemptContext;
use super::instructions::{plan_swap_instructions, sanity_check_ix_order, DecodedSwap};
use super::output::UnsignedSwapTransaction;
use crate::errors::SwapError;
use crate::types::{PriorityFeeEstimate, SimulationResult};

/// Compile the attempt's instructions into an unsigned V0 transaction.
///
/// Order: compute-unit limit, compute-unit price, setup..., swap, cleanup?,
/// tip?. The message is compiled against `ctx.lookup_tables` and
/// `ctx.blockhash` with `ctx.payer` as fee payer.
pub fn assemble(
    ctx: &AttemptContext,
    swap: &DecodedSwap,
    simulation: &SimulationResult,
    priority_fee: &PriorityFeeEstimate,
) -> Result<UnsignedSwapTransaction, SwapError> {
    let plan = plan_swap_instructions(
        simulation.compute_unit_limit,
        priority_fee.micro_lamports,
        swap.body(),
    )?;
    sanity_check_ix_order(&plan.instructions)?;

    let message = v0::Message::try_compile(
        &ctx.payer,
        &plan.instructions,
        &ctx.lookup_tables,
        ctx.blockhash,
    )
    .map_err(|e| SwapError::Assembly(e.to_string()))?;
    let message = VersionedMessage::V0(message);

    debug!(
        attempt = ctx.attempt + 1,
        instructions = plan.instructions.len(),
        has_tip = plan.has_tip,
        lookup_tables = crate::compat::get_lookup_table_count(&message),
        static_keys = crate::compat::get_static_account_keys(&message).len(),
        "Transaction assembled"
    );

    Ok(UnsignedSwapTransaction::new(message))
}
