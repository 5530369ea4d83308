//! Core types for the swap executor

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use solana_sdk::{pubkey::Pubkey, signature::Signature};
use std::fmt;

use crate::errors::SwapError;

/// Parameters of one swap operation
#[derive(Debug, Clone)]
pub struct SwapRequest {
    pub input_mint: Pubkey,
    pub output_mint: Pubkey,
    /// Amount of the input asset in UI units (e.g. 0.001 SOL)
    pub amount: f64,
    /// Slippage tolerance for the first attempt
    pub base_slippage_bps: u16,
    /// Number of full attempts before giving up
    pub max_retries: u32,
}

impl SwapRequest {
    pub fn validate(&self) -> Result<(), SwapError> {
        if !self.amount.is_finite() || self.amount <= 0.0 {
            return Err(SwapError::Configuration(format!(
                "amount must be positive, got {}",
                self.amount
            )));
        }
        if self.base_slippage_bps == 0 {
            return Err(SwapError::Configuration(
                "slippage_bps must be greater than zero".to_string(),
            ));
        }
        if self.max_retries == 0 {
            return Err(SwapError::Configuration(
                "max_retries must be at least 1".to_string(),
            ));
        }
        if self.input_mint == self.output_mint {
            return Err(SwapError::Configuration(
                "input and output mints must differ".to_string(),
            ));
        }
        Ok(())
    }
}

/// Quote request sent to the aggregator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteRequest {
    pub input_mint: Pubkey,
    pub output_mint: Pubkey,
    /// Amount in base units of the input mint
    pub amount: u64,
    pub slippage_bps: u16,
}

/// Typed view over the aggregator's quote response
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteFields {
    input_mint: String,
    output_mint: String,
    #[serde(deserialize_with = "de_u64_from_str")]
    in_amount: u64,
    #[serde(deserialize_with = "de_u64_from_str")]
    out_amount: u64,
    #[serde(default, deserialize_with = "de_opt_u64_from_str")]
    other_amount_threshold: Option<u64>,
    #[serde(default)]
    slippage_bps: u16,
    #[serde(default)]
    price_impact_pct: Option<String>,
    #[serde(default)]
    route_plan: Vec<serde_json::Value>,
}

/// Price quote for one exchange
///
/// Immutable once received. The raw response is retained verbatim because the
/// instruction endpoint expects the exact quote object back.
#[derive(Debug, Clone)]
pub struct Quote {
    pub input_mint: Pubkey,
    pub output_mint: Pubkey,
    pub in_amount: u64,
    pub out_amount: u64,
    /// Minimum output after slippage
    pub other_amount_threshold: Option<u64>,
    pub slippage_bps: u16,
    pub price_impact_pct: Option<f64>,
    pub route_plan: Vec<serde_json::Value>,
    raw: serde_json::Value,
}

impl Quote {
    /// Parse and validate a quote response. A missing or empty route plan is a
    /// hard failure.
    pub fn from_response(raw: serde_json::Value) -> Result<Self, SwapError> {
        let fields: QuoteFields = serde_json::from_value(raw.clone())
            .map_err(|e| SwapError::Quote(format!("malformed quote response: {}", e)))?;

        if fields.route_plan.is_empty() {
            return Err(SwapError::Quote(format!(
                "quote has no route plan: {}",
                raw
            )));
        }

        let input_mint = parse_pubkey(&fields.input_mint)
            .map_err(|e| SwapError::Quote(format!("invalid inputMint: {}", e)))?;
        let output_mint = parse_pubkey(&fields.output_mint)
            .map_err(|e| SwapError::Quote(format!("invalid outputMint: {}", e)))?;

        Ok(Self {
            input_mint,
            output_mint,
            in_amount: fields.in_amount,
            out_amount: fields.out_amount,
            other_amount_threshold: fields.other_amount_threshold,
            slippage_bps: fields.slippage_bps,
            price_impact_pct: fields
                .price_impact_pct
                .and_then(|p| p.parse::<f64>().ok()),
            route_plan: fields.route_plan,
            raw,
        })
    }

    /// The response exactly as received
    pub fn raw(&self) -> &serde_json::Value {
        &self.raw
    }
}

/// One account reference inside an instruction payload
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AccountPayload {
    pub pubkey: String,
    pub is_signer: bool,
    pub is_writable: bool,
}

/// Serialized instruction as returned by the instruction service
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct InstructionPayload {
    pub program_id: String,
    #[serde(default)]
    pub accounts: Vec<AccountPayload>,
    /// Base64 encoded instruction data
    pub data: String,
}

/// Instruction set derived from a quote
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapInstructions {
    #[serde(default)]
    pub setup_instructions: Vec<InstructionPayload>,
    pub swap_instruction: InstructionPayload,
    #[serde(default)]
    pub cleanup_instruction: Option<InstructionPayload>,
    #[serde(default)]
    pub address_lookup_table_addresses: Vec<String>,
}

impl SwapInstructions {
    /// Parse the lookup-table address list
    pub fn lookup_table_keys(&self) -> Result<Vec<Pubkey>, SwapError> {
        self.address_lookup_table_addresses
            .iter()
            .map(|addr| {
                parse_pubkey(addr).map_err(|e| {
                    SwapError::LookupTable(format!("invalid lookup table address {}: {}", addr, e))
                })
            })
            .collect()
    }
}

/// Outcome of the compute-unit dry-run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulationResult {
    /// Units reported as consumed by the simulation
    pub units_consumed: u64,
    /// Budget to request in the real transaction
    pub compute_unit_limit: u32,
}

/// Priority fee bid derived from recent network samples
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriorityFeeEstimate {
    /// Price per compute unit, in micro-lamports
    pub micro_lamports: u64,
    /// Number of samples that went into the mean (0 when defaulted)
    pub sample_count: usize,
    pub is_default: bool,
}

impl PriorityFeeEstimate {
    /// Total priority fee in lamports for the given compute-unit budget
    pub fn total_cost_lamports(&self, compute_unit_limit: u32) -> u64 {
        let micro = self.micro_lamports as u128 * compute_unit_limit as u128;
        micro.div_ceil(1_000_000).min(u64::MAX as u128) as u64
    }

    /// Total priority fee in SOL for the given compute-unit budget
    pub fn total_cost_sol(&self, compute_unit_limit: u32) -> f64 {
        self.total_cost_lamports(compute_unit_limit) as f64 / 1e9
    }
}

/// Identifier assigned by the bundling service at submission time
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BundleId(String);

impl BundleId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BundleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Confirmation state of a submitted bundle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BundleStatus {
    /// Included and finalized at `slot`
    Landed { slot: u64 },
    /// Rejected or dropped by the block engine
    Failed,
    /// Accepted, not yet included
    Pending,
    /// Unknown to the block engine, or no status returned
    Unknown,
}

impl BundleStatus {
    pub fn is_landed(&self) -> bool {
        matches!(self, Self::Landed { .. })
    }

    pub fn landed_slot(&self) -> Option<u64> {
        match self {
            Self::Landed { slot } => Some(*slot),
            _ => None,
        }
    }

    /// Short label for metrics and logs
    pub fn label(&self) -> &'static str {
        match self {
            Self::Landed { .. } => "landed",
            Self::Failed => "failed",
            Self::Pending => "pending",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for BundleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Landed { slot } => write!(f, "Landed (slot {})", slot),
            Self::Failed => write!(f, "Failed"),
            Self::Pending => write!(f, "Pending"),
            Self::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Final report of a landed swap
#[derive(Debug, Clone, Serialize)]
pub struct SwapReport {
    pub status: BundleStatus,
    pub signature: Signature,
    pub bundle_id: BundleId,
    pub slot: u64,
    /// 1-based number of the attempt that landed
    pub attempts: u32,
    pub slippage_bps: u16,
    pub in_amount: u64,
    pub quoted_out_amount: u64,
    pub resubmissions: u32,
    pub landed_at: DateTime<Utc>,
}

impl SwapReport {
    pub fn explorer_url(&self) -> String {
        format!("https://solscan.io/tx/{}", self.signature)
    }
}

/// Result of a swap operation that did not error
#[derive(Debug, Clone)]
pub enum SwapOutcome {
    Completed(SwapReport),
    /// Deliberately skipped; no bundle was submitted for the skipping attempt
    Skipped { reason: String, attempt: u32 },
}

impl SwapOutcome {
    pub fn report(&self) -> Option<&SwapReport> {
        match self {
            Self::Completed(report) => Some(report),
            Self::Skipped { .. } => None,
        }
    }
}

/// Convert a UI amount to base units of a mint with `decimals` precision
pub fn ui_to_base_units(amount: f64, decimals: u8) -> Result<u64, SwapError> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(SwapError::Configuration(format!(
            "amount must be positive, got {}",
            amount
        )));
    }
    let scaled = (amount * 10f64.powi(decimals as i32)).round();
    if scaled < 1.0 || scaled > u64::MAX as f64 {
        return Err(SwapError::Configuration(format!(
            "amount {} does not fit {} decimals",
            amount, decimals
        )));
    }
    Ok(scaled as u64)
}

pub fn base_units_to_ui(amount: u64, decimals: u8) -> f64 {
    amount as f64 / 10f64.powi(decimals as i32)
}

pub(crate) fn parse_pubkey(s: &str) -> Result<Pubkey, String> {
    s.parse::<Pubkey>().map_err(|e| e.to_string())
}

fn de_u64_from_str<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StrOrNum {
        Str(String),
        Num(u64),
    }

    match StrOrNum::deserialize(deserializer)? {
        StrOrNum::Str(s) => s.parse::<u64>().map_err(serde::de::Error::custom),
        StrOrNum::Num(n) => Ok(n),
    }
}

fn de_opt_u64_from_str<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    de_u64_from_str(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn quote_json(route_plan: serde_json::Value) -> serde_json::Value {
        json!({
            "inputMint": "So11111111111111111111111111111111111111112",
            "inAmount": "1000000",
            "outputMint": "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v",
            "outAmount": "154321",
            "otherAmountThreshold": "152777",
            "swapMode": "ExactIn",
            "slippageBps": 100,
            "priceImpactPct": "0.0012",
            "routePlan": route_plan,
            "contextSlot": 280000000u64
        })
    }

    #[test]
    fn test_quote_from_response() {
        let raw = quote_json(json!([{ "percent": 100, "swapInfo": { "label": "Whirlpool" } }]));
        let quote = Quote::from_response(raw.clone()).expect("valid quote");

        assert_eq!(quote.in_amount, 1_000_000);
        assert_eq!(quote.out_amount, 154_321);
        assert_eq!(quote.other_amount_threshold, Some(152_777));
        assert_eq!(quote.slippage_bps, 100);
        assert_eq!(quote.route_plan.len(), 1);
        assert_eq!(quote.raw(), &raw);
        assert!((quote.price_impact_pct.unwrap() - 0.0012).abs() < f64::EPSILON);
    }

    #[test]
    fn test_quote_without_route_is_rejected() {
        let err = Quote::from_response(quote_json(json!([]))).unwrap_err();
        assert!(matches!(err, SwapError::Quote(_)));

        let err = Quote::from_response(json!({ "error": "Could not find any route" })).unwrap_err();
        assert!(matches!(err, SwapError::Quote(_)));
    }

    #[test]
    fn test_swap_instructions_deserialize() {
        let raw = json!({
            "computeBudgetInstructions": [],
            "setupInstructions": [{
                "programId": "ATokenGPvbdGVxr1b2hvZbsiqW5xWH25efTNsLJA8knL",
                "accounts": [{ "pubkey": "11111111111111111111111111111111", "isSigner": false, "isWritable": false }],
                "data": "AQ=="
            }],
            "swapInstruction": {
                "programId": "JUP6LkbZbjS1jKKwapdHNy74zcZ3tLUZoi5QNyVTaV4",
                "accounts": [],
                "data": "AAEC"
            },
            "cleanupInstruction": null,
            "addressLookupTableAddresses": ["GxS6FiQ3mNnAar9HGQ6mxP7t6FcwmHkU7peSeQDUHmpN"]
        });
        let ixs: SwapInstructions = serde_json::from_value(raw).expect("valid instructions");

        assert_eq!(ixs.setup_instructions.len(), 1);
        assert!(ixs.setup_instructions[0].accounts[0].pubkey.starts_with("1111"));
        assert!(ixs.cleanup_instruction.is_none());
        assert_eq!(ixs.lookup_table_keys().unwrap().len(), 1);
    }

    #[test]
    fn test_ui_amount_conversion() {
        assert_eq!(ui_to_base_units(0.001, 9).unwrap(), 1_000_000);
        assert_eq!(ui_to_base_units(1.5, 6).unwrap(), 1_500_000);
        assert!(ui_to_base_units(0.0, 9).is_err());
        assert!(ui_to_base_units(0.0000001, 6).is_err());
        assert!((base_units_to_ui(154_321, 6) - 0.154321).abs() < 1e-12);
    }

    #[test]
    fn test_priority_fee_total_cost() {
        let fee = PriorityFeeEstimate {
            micro_lamports: 10_000,
            sample_count: 0,
            is_default: true,
        };
        // 10_000 micro-lamports * 200_000 CU = 2_000 lamports
        assert_eq!(fee.total_cost_lamports(200_000), 2_000);
        // rounds up partial lamports
        assert_eq!(fee.total_cost_lamports(1), 1);
        assert!((fee.total_cost_sol(200_000) - 0.000002).abs() < 1e-15);
    }

    #[test]
    fn test_bundle_status_labels() {
        assert!(BundleStatus::Landed { slot: 7 }.is_landed());
        assert_eq!(BundleStatus::Landed { slot: 7 }.landed_slot(), Some(7));
        assert_eq!(BundleStatus::Pending.landed_slot(), None);
        assert_eq!(BundleStatus::Unknown.label(), "unknown");
        assert_eq!(format!("{}", BundleStatus::Landed { slot: 42 }), "Landed (slot 42)");
    }

    #[test]
    fn test_request_validation() {
        let mut req = SwapRequest {
            input_mint: Pubkey::new_unique(),
            output_mint: Pubkey::new_unique(),
            amount: 0.001,
            base_slippage_bps: 100,
            max_retries: 3,
        };
        assert!(req.validate().is_ok());

        req.max_retries = 0;
        assert!(req.validate().is_err());
        req.max_retries = 3;
        req.output_mint = req.input_mint;
        assert!(req.validate().is_err());
    }
}
