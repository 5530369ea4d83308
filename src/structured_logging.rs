//! Structured logging for swap pipeline events

use solana_sdk::{pubkey::Pubkey, signature::Signature};
use std::time::Duration;

use crate::errors::SwapError;
use crate::types::{BundleId, BundleStatus};

/// Structured logger for swap events
///
/// Every event carries the operation's trace id and, where it applies, the
/// attempt index so a failed run can be reconstructed from logs alone.
#[derive(Debug, Clone)]
pub struct SwapLogger {
    context_id: String,
}

impl SwapLogger {
    pub fn new(context_id: impl Into<String>) -> Self {
        Self {
            context_id: context_id.into(),
        }
    }

    pub fn context_id(&self) -> &str {
        &self.context_id
    }

    pub fn log_swap_start(&self, input: &Pubkey, output: &Pubkey, amount: f64, slippage_bps: u16) {
        tracing::info!(
            context_id = %self.context_id,
            input_mint = %input,
            output_mint = %output,
            amount = %amount,
            base_slippage_bps = %slippage_bps,
            "Starting swap operation"
        );
    }

    pub fn log_attempt_start(&self, attempt: u32, max_attempts: u32, slippage_bps: u16) {
        tracing::info!(
            context_id = %self.context_id,
            attempt = attempt + 1,
            max_attempts = %max_attempts,
            slippage_bps = %slippage_bps,
            "Initiating swap attempt"
        );
    }

    pub fn log_quote(&self, attempt: u32, in_amount: u64, out_amount: u64, out_ui: f64, hops: usize) {
        tracing::info!(
            context_id = %self.context_id,
            attempt = attempt + 1,
            in_amount = %in_amount,
            out_amount = %out_amount,
            out_ui = %out_ui,
            route_hops = %hops,
            "Quote received"
        );
    }

    pub fn log_budget(&self, attempt: u32, units_consumed: u64, cu_limit: u32, fee_micro_lamports: u64, fee_sol: f64) {
        tracing::info!(
            context_id = %self.context_id,
            attempt = attempt + 1,
            units_consumed = %units_consumed,
            cu_limit = %cu_limit,
            priority_fee_micro_lamports = %fee_micro_lamports,
            priority_fee_sol = %format!("{:.9}", fee_sol),
            "Transaction budgeted"
        );
    }

    pub fn log_stage_failure(&self, attempt: u32, max_attempts: u32, error: &SwapError) {
        tracing::warn!(
            context_id = %self.context_id,
            attempt = attempt + 1,
            max_attempts = %max_attempts,
            stage = error.stage(),
            error = %error,
            "Swap attempt failed"
        );
    }

    pub fn log_retry_scheduled(&self, next_attempt: u32, delay: Duration, slippage_bps: u16) {
        tracing::info!(
            context_id = %self.context_id,
            next_attempt = next_attempt + 1,
            delay_ms = delay.as_millis() as u64,
            next_slippage_bps = %slippage_bps,
            "Retrying swap with wider slippage"
        );
    }

    pub fn log_skip(&self, attempt: u32, reason: &str) {
        tracing::info!(
            context_id = %self.context_id,
            attempt = attempt + 1,
            reason = %reason,
            "Skipping swap"
        );
    }

    pub fn log_bundle_submitted(&self, bundle_id: &BundleId, signature: &Signature) {
        tracing::info!(
            context_id = %self.context_id,
            bundle_id = %bundle_id,
            signature = %signature,
            "Bundle submitted"
        );
    }

    pub fn log_bundle_resubmitted(&self, previous: &BundleId, bundle_id: &BundleId) {
        tracing::info!(
            context_id = %self.context_id,
            previous_bundle_id = %previous,
            bundle_id = %bundle_id,
            "Bundle failed, resubmitted"
        );
    }

    pub fn log_poll(&self, bundle_id: &BundleId, poll: u32, max_polls: u32, status: &BundleStatus) {
        tracing::info!(
            context_id = %self.context_id,
            bundle_id = %bundle_id,
            poll = poll,
            max_polls = %max_polls,
            status = %status,
            "Bundle status checked"
        );
    }

    pub fn log_landed(&self, bundle_id: &BundleId, slot: u64, signature: &Signature) {
        tracing::info!(
            context_id = %self.context_id,
            bundle_id = %bundle_id,
            slot = %slot,
            signature = %signature,
            "Bundle landed"
        );
    }

    pub fn warn(&self, message: &str) {
        tracing::warn!(
            context_id = %self.context_id,
            message = %message,
            "Warning"
        );
    }

    pub fn error(&self, message: &str) {
        tracing::error!(
            context_id = %self.context_id,
            message = %message,
            "Error"
        );
    }
}
