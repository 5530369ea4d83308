//! Swap orchestration: attempt control and bundle confirmation

pub mod confirmation;
pub mod controller;

pub use confirmation::{BundleConfirmer, Confirmation, ConfirmationMachine, Step};
pub use controller::{
    effective_slippage_bps, AttemptDecision, AttemptMachine, ExecutorSettings, SwapExecutor,
    MAX_SLIPPAGE_BPS,
};
