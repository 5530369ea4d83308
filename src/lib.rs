//! Jito Swap - Jupiter quote to Jito bundle swap executor
//!
//! This library exposes the swap orchestration core together with the
//! adapters it drives (Solana RPC, Jupiter HTTP API, Jito block engine).

pub mod compat;
pub mod config;
pub mod errors;
pub mod metrics;
pub mod observability;
pub mod orchestrator;
pub mod services;
pub mod structured_logging;
pub mod timing;
pub mod types;
pub mod wallet;

// Transaction assembly, fee estimation and bundle envelopes
pub mod tx_builder;

#[cfg(any(test, feature = "test_utils"))]
pub mod test_utils;

// Re-export commonly used types
pub use errors::SwapError;
pub use orchestrator::{ExecutorSettings, SwapExecutor};
pub use types::{BundleId, BundleStatus, SwapOutcome, SwapReport, SwapRequest};

pub use solana_sdk::{pubkey::Pubkey, signature::Signature};
