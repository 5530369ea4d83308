//! Error types for the swap executor
//!
//! A single taxonomy covers every stage of a swap attempt. Errors fall into
//! three groups, and the attempt controller only ever looks at the group:
//! - Skip: `InsufficientFundsForRent` ends the operation cleanly, no retry
//! - Retriable: quote, instructions, simulation, assembly, bundler and
//!   confirmation failures restart the attempt with wider slippage
//! - Terminal: `Cancelled`, `Configuration` and `RetriesExhausted`

use thiserror::Error;

use crate::types::BundleStatus;

/// Error type for all swap execution operations
#[derive(Error, Debug)]
pub enum SwapError {
    /// The quote service returned no usable route
    #[error("Quote unavailable: {0}")]
    Quote(String),

    /// The instruction service failed or reported an error field
    #[error("Swap instruction fetch failed: {0}")]
    Instructions(String),

    /// An instruction payload could not be turned into an executable instruction
    #[error("Instruction decode error (program={program}): {reason}")]
    InstructionDecode {
        /// Program id as reported by the payload (may itself be invalid)
        program: String,
        /// Detailed reason for the failure
        reason: String,
    },

    /// Address lookup table could not be fetched or parsed
    #[error("Address lookup table error: {0}")]
    LookupTable(String),

    /// Dry-run of the instruction sequence failed
    #[error("Simulation failed: {0}")]
    Simulation(String),

    /// The simulation reported that an account would fall below the
    /// rent-exempt minimum. The amount is too small to swap.
    #[error("Insufficient funds for rent (account index: {account_index:?})")]
    InsufficientFundsForRent {
        /// Index of the offending account in the message, when reported
        account_index: Option<u8>,
    },

    /// Blockchain query failure (decimals, blockhash, fees, transport)
    #[error("RPC error: {0}")]
    Rpc(String),

    /// Message compilation failed
    #[error("Transaction assembly failed: {0}")]
    Assembly(String),

    /// Signing failed
    #[error("Signing failed: {0}")]
    Signing(String),

    /// Bundle submission or status transport failure
    #[error("Bundler error: {0}")]
    Bundler(String),

    /// Confirmation budget spent without a Landed status
    #[error("Bundle not landed after {polls} status checks (last status: {last_status})")]
    ConfirmationExhausted {
        /// Number of status polls performed
        polls: u32,
        /// Last observed status
        last_status: BundleStatus,
    },

    /// Invalid request or configuration values
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The operation was cancelled at a suspension point
    #[error("Swap cancelled")]
    Cancelled,

    /// Outer retry budget exhausted
    #[error("Swap failed after {attempts} attempts: {last}")]
    RetriesExhausted {
        /// Number of attempts performed
        attempts: u32,
        /// Error observed on the final attempt
        #[source]
        last: Box<SwapError>,
    },
}

impl SwapError {
    /// Whether the attempt controller may restart the attempt after this error
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Quote(_)
            | Self::Instructions(_)
            | Self::InstructionDecode { .. }
            | Self::LookupTable(_)
            | Self::Simulation(_)
            | Self::Rpc(_)
            | Self::Assembly(_)
            | Self::Signing(_)
            | Self::Bundler(_)
            | Self::ConfirmationExhausted { .. } => true,

            Self::InsufficientFundsForRent { .. }
            | Self::Configuration(_)
            | Self::Cancelled
            | Self::RetriesExhausted { .. } => false,
        }
    }

    /// Whether this error is a deliberate skip rather than a failure
    pub fn is_skip(&self) -> bool {
        matches!(self, Self::InsufficientFundsForRent { .. })
    }

    /// Stage label for metrics and logs
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Quote(_) => "quote",
            Self::Instructions(_) => "instructions",
            Self::InstructionDecode { .. } => "decode",
            Self::LookupTable(_) => "lookup_table",
            Self::Simulation(_) | Self::InsufficientFundsForRent { .. } => "simulation",
            Self::Rpc(_) => "rpc",
            Self::Assembly(_) => "assembly",
            Self::Signing(_) => "signing",
            Self::Bundler(_) => "bundle_submit",
            Self::ConfirmationExhausted { .. } => "confirmation",
            Self::Configuration(_) => "config",
            Self::Cancelled => "cancelled",
            Self::RetriesExhausted { .. } => "exhausted",
        }
    }
}

// Convenience constructors for common error scenarios
impl SwapError {
    pub fn decode_failed(program: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InstructionDecode {
            program: program.into(),
            reason: reason.into(),
        }
    }

    pub fn rpc(reason: impl std::fmt::Display) -> Self {
        Self::Rpc(reason.to_string())
    }

    pub fn bundler(reason: impl std::fmt::Display) -> Self {
        Self::Bundler(reason.to_string())
    }
}
