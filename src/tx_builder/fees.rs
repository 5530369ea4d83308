//! Priority fee estimation from recent prioritization fee samples

use tracing::{debug, warn};

use crate::services::ChainClient;
use crate::types::PriorityFeeEstimate;

/// Number of most recent samples averaged
pub const PRIORITY_FEE_WINDOW: usize = 150;

/// Bid used when no samples are available (micro-lamports per CU)
pub const DEFAULT_PRIORITY_FEE: u64 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriorityFeePolicy {
    pub default_micro_lamports: u64,
    pub max_micro_lamports: Option<u64>,
}

impl Default for PriorityFeePolicy {
    fn default() -> Self {
        Self {
            default_micro_lamports: DEFAULT_PRIORITY_FEE,
            max_micro_lamports: None,
        }
    }
}

impl PriorityFeePolicy {
    fn cap(&self, micro_lamports: u64) -> u64 {
        self.max_micro_lamports
            .map_or(micro_lamports, |max| micro_lamports.min(max))
    }
}

/// Ceiling of the mean of the trailing `PRIORITY_FEE_WINDOW` samples.
///
/// `samples` must be ordered oldest slot first. Returns `None` when empty.
pub fn average_priority_fee(samples: &[u64]) -> Option<u64> {
    if samples.is_empty() {
        return None;
    }
    let window = &samples[samples.len().saturating_sub(PRIORITY_FEE_WINDOW)..];
    let sum: u128 = window.iter().map(|&fee| fee as u128).sum();
    let mean = sum.div_ceil(window.len() as u128);
    Some(mean.min(u64::MAX as u128) as u64)
}

/// Estimate the priority fee bid. Never fails: an RPC error or an empty
/// sample set falls back to the policy default.
pub async fn estimate_priority_fee(
    chain: &dyn ChainClient,
    policy: &PriorityFeePolicy,
) -> PriorityFeeEstimate {
    let samples = match chain.recent_prioritization_fees().await {
        Ok(samples) => samples,
        Err(e) => {
            warn!(error = %e, default = policy.default_micro_lamports, "Priority fee lookup failed, using default");
            Vec::new()
        }
    };

    let estimate = match average_priority_fee(&samples) {
        Some(mean) => PriorityFeeEstimate {
            micro_lamports: policy.cap(mean),
            sample_count: samples.len().min(PRIORITY_FEE_WINDOW),
            is_default: false,
        },
        None => {
            warn!(default = policy.default_micro_lamports, "No prioritization fee samples, using default");
            PriorityFeeEstimate {
                micro_lamports: policy.cap(policy.default_micro_lamports),
                sample_count: 0,
                is_default: true,
            }
        }
    };

    crate::metrics::metrics()
        .last_priority_fee
        .set(estimate.micro_lamports.min(i64::MAX as u64) as i64);
    debug!(
        micro_lamports = estimate.micro_lamports,
        samples = estimate.sample_count,
        is_default = estimate.is_default,
        "Priority fee estimated"
    );
    estimate
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::FakeChain;
    use proptest::prelude::*;

    #[test]
    fn test_average_uses_trailing_window() {
        assert_eq!(average_priority_fee(&[]), None);
        assert_eq!(average_priority_fee(&[1, 2]), Some(2)); // ceil(1.5)
        assert_eq!(average_priority_fee(&[10, 20, 30]), Some(20));

        // 50 old expensive samples fall outside the window
        let mut samples = vec![1_000_000u64; 50];
        samples.extend(std::iter::repeat(100).take(PRIORITY_FEE_WINDOW));
        assert_eq!(average_priority_fee(&samples), Some(100));
    }

    #[tokio::test]
    async fn test_zero_samples_use_default() {
        let chain = FakeChain::new().with_fees(vec![]);
        let estimate = estimate_priority_fee(&chain, &PriorityFeePolicy::default()).await;
        assert_eq!(estimate.micro_lamports, DEFAULT_PRIORITY_FEE);
        assert!(estimate.is_default);
        assert_eq!(estimate.sample_count, 0);
    }

    #[tokio::test]
    async fn test_rpc_failure_uses_default() {
        let chain = FakeChain::new().with_fee_error();
        let estimate = estimate_priority_fee(&chain, &PriorityFeePolicy::default()).await;
        assert_eq!(estimate.micro_lamports, 10_000);
        assert!(estimate.is_default);
    }

    #[tokio::test]
    async fn test_cap_applies() {
        let chain = FakeChain::new().with_fees(vec![500_000, 700_000]);
        let policy = PriorityFeePolicy {
            max_micro_lamports: Some(250_000),
            ..PriorityFeePolicy::default()
        };
        let estimate = estimate_priority_fee(&chain, &policy).await;
        assert_eq!(estimate.micro_lamports, 250_000);
        assert_eq!(estimate.sample_count, 2);
        assert!(!estimate.is_default);
    }

    proptest! {
        #[test]
        fn prop_average_is_ceil_of_trailing_mean(samples in proptest::collection::vec(0u64..5_000_000, 1..400)) {
            let window: Vec<u64> = samples.iter().rev().take(PRIORITY_FEE_WINDOW).copied().collect();
            let sum: u128 = window.iter().map(|&v| v as u128).sum();
            let n = window.len() as u128;
            let expected = ((sum + n - 1) / n) as u64;

            prop_assert_eq!(average_priority_fee(&samples), Some(expected));
            let min = *window.iter().min().unwrap();
            let max = *window.iter().max().unwrap();
            prop_assert!(expected >= min && expected <= max);
        }
    }
}
