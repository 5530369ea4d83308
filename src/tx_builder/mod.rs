//! Transaction building for the swap pipeline
//!
//! The builder is split into focused modules:
//! - **instructions**: payload decoding and instruction ordering
//! - **simulate**: compute-unit estimation by dry-run
//! - **fees**: priority fee estimation from recent samples
//! - **builder**: V0 message assembly
//! - **output**: unsigned/signed transaction type-state
//! - **bundle**: Jito tip instruction and bundle envelope
//! - **context**: per-attempt inputs gathered before assembly
//!
//! Final instruction order is always:
//! compute-unit limit, compute-unit price, setup..., swap, cleanup?, tip?

mod builder;
mod bundle;
mod context;
mod fees;
mod instructions;
mod output;
mod simulate;

pub use builder::assemble;
pub use bundle::{random_tip_account, tip_instruction, BundleEnvelope, JITO_TIP_ACCOUNTS};
pub use context::AttemptContext;
pub use fees::{
    average_priority_fee, estimate_priority_fee, PriorityFeePolicy, DEFAULT_PRIORITY_FEE,
    PRIORITY_FEE_WINDOW,
};
pub use instructions::{
    decode_instruction, decode_swap_instructions, plan_swap_instructions, sanity_check_ix_order,
    DecodedSwap, InstructionPlan, MAX_INSTRUCTION_DATA_LEN,
};
pub use output::{SignedSwapTransaction, UnsignedSwapTransaction};
pub use simulate::{
    compute_unit_limit, estimate_compute_budget, ComputeBudgetPolicy, SIMULATION_CU_LIMIT,
};
