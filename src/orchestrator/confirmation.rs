//! Bundle confirmation state machine
//!
//! `ConfirmationMachine` is pure: it consumes one observed status per poll and
//! answers with the next step. `BundleConfirmer` drives it against a
//! `BundleService`, waiting through the injected `Sleeper` before each poll.

use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::errors::SwapError;
use crate::metrics::metrics;
use crate::services::BundleService;
use crate::structured_logging::SwapLogger;
use crate::timing::{cancellable, pause, BackoffPolicy, Sleeper};
use crate::tx_builder::{BundleEnvelope, SignedSwapTransaction};
use crate::types::{BundleId, BundleStatus};

/// Next action after observing a bundle status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Terminal success
    Landed { slot: u64 },
    /// Bundle failed with polls left: submit the same transaction again
    Resubmit,
    /// Inconclusive status with polls left
    KeepPolling,
    /// Poll budget spent without a landed status
    Exhausted { polls: u32, last_status: BundleStatus },
}

/// Poll-budget bookkeeping for one submitted transaction
#[derive(Debug, Clone)]
pub struct ConfirmationMachine {
    max_polls: u32,
    polls: u32,
    last_status: BundleStatus,
}

impl ConfirmationMachine {
    pub fn new(max_polls: u32) -> Self {
        Self {
            max_polls: max_polls.max(1),
            polls: 0,
            last_status: BundleStatus::Unknown,
        }
    }

    /// Record one poll result. A missing status counts as `Unknown`.
    ///
    /// Every observation consumes one poll. A `Failed` status on the final
    /// poll exhausts the budget rather than triggering a resubmission that
    /// could never be checked.
    pub fn observe(&mut self, status: Option<BundleStatus>) -> Step {
        let status = status.unwrap_or(BundleStatus::Unknown);
        self.polls += 1;
        self.last_status = status;

        match status {
            BundleStatus::Landed { slot } => Step::Landed { slot },
            _ if self.polls >= self.max_polls => Step::Exhausted {
                polls: self.polls,
                last_status: status,
            },
            BundleStatus::Failed => Step::Resubmit,
            BundleStatus::Pending | BundleStatus::Unknown => Step::KeepPolling,
        }
    }

    pub fn polls(&self) -> u32 {
        self.polls
    }

    pub fn remaining(&self) -> u32 {
        self.max_polls - self.polls.min(self.max_polls)
    }

    pub fn last_status(&self) -> BundleStatus {
        self.last_status
    }
}

/// Successful confirmation of a swap transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirmation {
    /// Id of the bundle that landed
    pub bundle_id: BundleId,
    pub slot: u64,
    pub polls: u32,
    pub resubmissions: u32,
}

/// Async driver for `ConfirmationMachine`
#[derive(Clone)]
pub struct BundleConfirmer {
    bundler: Arc<dyn BundleService>,
    sleeper: Arc<dyn Sleeper>,
    poll_backoff: Arc<dyn BackoffPolicy>,
    max_polls: u32,
}

impl BundleConfirmer {
    pub fn new(
        bundler: Arc<dyn BundleService>,
        sleeper: Arc<dyn Sleeper>,
        poll_backoff: Arc<dyn BackoffPolicy>,
        max_polls: u32,
    ) -> Self {
        Self {
            bundler,
            sleeper,
            poll_backoff,
            max_polls,
        }
    }

    /// Submit the envelope as a new bundle
    pub async fn submit(
        &self,
        envelope: &BundleEnvelope,
        cancel: &CancellationToken,
    ) -> Result<BundleId, SwapError> {
        let id = cancellable(cancel, self.bundler.send_bundle(envelope)).await??;
        metrics().bundles_submitted.inc();
        Ok(id)
    }

    /// Read the current status; transport errors count as no status
    pub async fn poll(
        &self,
        id: &BundleId,
        cancel: &CancellationToken,
    ) -> Result<Option<BundleStatus>, SwapError> {
        match cancellable(cancel, self.bundler.bundle_status(id)).await? {
            Ok(status) => Ok(status),
            Err(e) => {
                tracing::warn!(bundle_id = %id, error = %e, "Bundle status poll failed");
                Ok(None)
            }
        }
    }

    /// Submit `tx` and poll until it lands or the poll budget is spent
    pub async fn confirm(
        &self,
        tx: &SignedSwapTransaction,
        logger: &SwapLogger,
        cancel: &CancellationToken,
    ) -> Result<Confirmation, SwapError> {
        let envelope = BundleEnvelope::single(tx)?;
        let mut bundle_id = self.submit(&envelope, cancel).await?;
        logger.log_bundle_submitted(&bundle_id, tx.signature());

        let mut machine = ConfirmationMachine::new(self.max_polls);
        let mut resubmissions = 0u32;

        loop {
            let delay = self.poll_backoff.delay(machine.polls());
            pause(self.sleeper.as_ref(), cancel, delay).await?;

            let status = self.poll(&bundle_id, cancel).await?;
            let step = machine.observe(status);
            let observed = machine.last_status();
            metrics()
                .bundle_polls
                .with_label_values(&[observed.label()])
                .inc();
            logger.log_poll(&bundle_id, machine.polls(), self.max_polls, &observed);

            match step {
                Step::Landed { slot } => {
                    logger.log_landed(&bundle_id, slot, tx.signature());
                    return Ok(Confirmation {
                        bundle_id,
                        slot,
                        polls: machine.polls(),
                        resubmissions,
                    });
                }
                Step::Resubmit => match self.submit(&envelope, cancel).await {
                    Ok(new_id) => {
                        logger.log_bundle_resubmitted(&bundle_id, &new_id);
                        metrics().bundles_resubmitted.inc();
                        resubmissions += 1;
                        bundle_id = new_id;
                    }
                    Err(SwapError::Cancelled) => return Err(SwapError::Cancelled),
                    Err(e) => {
                        logger.warn(&format!(
                            "Resubmission failed, still tracking bundle {}: {}",
                            bundle_id, e
                        ));
                    }
                },
                Step::KeepPolling => {}
                Step::Exhausted { polls, last_status } => {
                    return Err(SwapError::ConfirmationExhausted { polls, last_status });
                }
            }
        }
    }
}
