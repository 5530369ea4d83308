//! Swap attempt controller
//!
//! `AttemptMachine` decides, purely, what happens after a failed attempt and
//! which slippage the next attempt uses. `SwapExecutor` runs the attempt
//! pipeline and follows those decisions.

use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use super::confirmation::BundleConfirmer;
use crate::config::Config;
use crate::errors::SwapError;
use crate::metrics::{metrics, Timer};
use crate::observability::TraceContext;
use crate::services::{
    BundleService, ChainClient, JitoClient, JupiterClient, RpcChainClient, SwapAggregator,
};
use crate::structured_logging::SwapLogger;
use crate::timing::{cancellable, pause, BackoffPolicy, FixedBackoff, Sleeper, TokioSleeper};
use crate::tx_builder::{
    assemble, decode_swap_instructions, estimate_compute_budget, estimate_priority_fee,
    tip_instruction, AttemptContext, ComputeBudgetPolicy, PriorityFeePolicy,
};
use crate::types::{
    base_units_to_ui, ui_to_base_units, QuoteRequest, SwapOutcome, SwapReport, SwapRequest,
};
use crate::wallet::WalletManager;

/// Slippage never widens past 100%
pub const MAX_SLIPPAGE_BPS: u16 = 10_000;

/// Slippage for 0-based `attempt`: `base * (1 + attempt / 2)`.
///
/// Computed as `base * (2 + attempt) / 2` in integers, so even bases are
/// exact and odd bases round down.
pub fn effective_slippage_bps(base_bps: u16, attempt: u32) -> u16 {
    let widened = base_bps as u64 * (2 + attempt as u64) / 2;
    widened.min(MAX_SLIPPAGE_BPS as u64) as u16
}

/// Decision after a failed attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptDecision {
    /// Wait `delay`, then run `next_attempt` with `slippage_bps`
    Retry {
        delay: Duration,
        next_attempt: u32,
        slippage_bps: u16,
    },
    /// Deliberate skip; the operation ends without error
    Skip,
    /// Retry budget spent
    Exhausted { attempts: u32 },
    /// Non-retriable failure; surface it unchanged
    Abort,
}

/// Retry bookkeeping for one swap operation
#[derive(Debug, Clone)]
pub struct AttemptMachine {
    base_slippage_bps: u16,
    max_attempts: u32,
    attempt: u32,
}

impl AttemptMachine {
    pub fn new(base_slippage_bps: u16, max_attempts: u32) -> Self {
        Self {
            base_slippage_bps,
            max_attempts: max_attempts.max(1),
            attempt: 0,
        }
    }

    /// Current 0-based attempt index
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn slippage_bps(&self) -> u16 {
        effective_slippage_bps(self.base_slippage_bps, self.attempt)
    }

    pub fn on_failure(&mut self, error: &SwapError, backoff: &dyn BackoffPolicy) -> AttemptDecision {
        if error.is_skip() {
            return AttemptDecision::Skip;
        }
        if !error.is_retryable() {
            return AttemptDecision::Abort;
        }
        if self.attempt + 1 >= self.max_attempts {
            return AttemptDecision::Exhausted {
                attempts: self.attempt + 1,
            };
        }

        let delay = backoff.delay(self.attempt);
        self.attempt += 1;
        AttemptDecision::Retry {
            delay,
            next_attempt: self.attempt,
            slippage_bps: self.slippage_bps(),
        }
    }
}

/// Tunables of the attempt pipeline
#[derive(Debug, Clone)]
pub struct ExecutorSettings {
    pub compute_budget: ComputeBudgetPolicy,
    pub priority_fee: PriorityFeePolicy,
    /// Transport retries of the compute-unit simulation
    pub simulation_retries: usize,
    /// Jito tip per transaction; 0 disables the tip
    pub tip_lamports: u64,
    pub confirmation_polls: u32,
    pub poll_interval: Duration,
    pub retry_delay: Duration,
}

impl Default for ExecutorSettings {
    fn default() -> Self {
        Self {
            compute_budget: ComputeBudgetPolicy::default(),
            priority_fee: PriorityFeePolicy::default(),
            simulation_retries: 5,
            tip_lamports: 10_000,
            confirmation_polls: 3,
            poll_interval: Duration::from_secs(15),
            retry_delay: Duration::from_secs(2),
        }
    }
}

impl ExecutorSettings {
    pub fn from_config(config: &Config) -> Self {
        let exec = &config.execution;
        Self {
            compute_budget: ComputeBudgetPolicy {
                margin: exec.compute_unit_margin,
                min_cu_limit: exec.min_cu_limit,
                max_cu_limit: exec.max_cu_limit,
                retry_interval: Duration::from_millis(exec.simulation_retry_interval_ms),
            },
            priority_fee: PriorityFeePolicy {
                max_micro_lamports: exec.max_priority_fee_micro_lamports,
                ..PriorityFeePolicy::default()
            },
            simulation_retries: exec.simulation_retries,
            tip_lamports: config.jito.tip_lamports,
            confirmation_polls: exec.confirmation_polls,
            poll_interval: exec.poll_interval(),
            retry_delay: exec.retry_delay(),
        }
    }
}

/// Runs swap operations: quote, build, sign, bundle, confirm, retry
///
/// Holds no per-operation state, so one executor can serve concurrent
/// `execute` calls.
pub struct SwapExecutor {
    aggregator: Arc<dyn SwapAggregator>,
    chain: Arc<dyn ChainClient>,
    bundler: Arc<dyn BundleService>,
    wallet: WalletManager,
    sleeper: Arc<dyn Sleeper>,
    retry_backoff: Arc<dyn BackoffPolicy>,
    poll_backoff: Arc<dyn BackoffPolicy>,
    settings: ExecutorSettings,
}

impl SwapExecutor {
    pub fn new(
        aggregator: Arc<dyn SwapAggregator>,
        chain: Arc<dyn ChainClient>,
        bundler: Arc<dyn BundleService>,
        wallet: WalletManager,
        settings: ExecutorSettings,
    ) -> Self {
        Self {
            aggregator,
            chain,
            bundler,
            wallet,
            sleeper: Arc::new(TokioSleeper),
            retry_backoff: Arc::new(FixedBackoff::new(settings.retry_delay)),
            poll_backoff: Arc::new(FixedBackoff::new(settings.poll_interval)),
            settings,
        }
    }

    /// Build an executor wired to the production adapters
    pub fn from_config(config: &Config, wallet: WalletManager) -> Result<Self, SwapError> {
        let aggregator = JupiterClient::from_config(&config.jupiter)?;
        let chain = RpcChainClient::from_config(&config.rpc);
        let bundler = JitoClient::from_config(&config.jito)?;
        Ok(Self::new(
            Arc::new(aggregator),
            Arc::new(chain),
            Arc::new(bundler),
            wallet,
            ExecutorSettings::from_config(config),
        ))
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn with_retry_backoff(mut self, backoff: Arc<dyn BackoffPolicy>) -> Self {
        self.retry_backoff = backoff;
        self
    }

    pub fn with_poll_backoff(mut self, backoff: Arc<dyn BackoffPolicy>) -> Self {
        self.poll_backoff = backoff;
        self
    }

    pub fn settings(&self) -> &ExecutorSettings {
        &self.settings
    }

    pub fn payer(&self) -> solana_sdk::pubkey::Pubkey {
        self.wallet.pubkey()
    }

    fn confirmer(&self) -> BundleConfirmer {
        BundleConfirmer::new(
            self.bundler.clone(),
            self.sleeper.clone(),
            self.poll_backoff.clone(),
            self.settings.confirmation_polls,
        )
    }

    /// Execute one swap operation.
    ///
    /// Returns `Ok(Completed)` once a bundle lands, `Ok(Skipped)` when the
    /// amount cannot cover rent, `Err(RetriesExhausted)` after the last
    /// failed attempt, and non-retriable errors unchanged.
    pub async fn execute(
        &self,
        request: &SwapRequest,
        cancel: &CancellationToken,
    ) -> Result<SwapOutcome, SwapError> {
        request.validate()?;

        let m = metrics();
        m.swaps_started.inc();
        let _active = m.track_active_swap();
        let timer = Timer::new();

        let trace = TraceContext::new("swap");
        let logger = SwapLogger::new(trace.trace_id());
        let span = trace.span();
        span.in_scope(|| {
            logger.log_swap_start(
                &request.input_mint,
                &request.output_mint,
                request.amount,
                request.base_slippage_bps,
            )
        });

        let result = self
            .drive(request, &trace, &logger, cancel)
            .instrument(span)
            .await;

        match &result {
            Ok(SwapOutcome::Completed(_)) => m.swaps_completed.inc(),
            Ok(SwapOutcome::Skipped { .. }) => m.swaps_skipped.inc(),
            Err(_) => m.swaps_failed.inc(),
        }
        timer.observe_duration(&m.swap_latency);
        result
    }

    async fn drive(
        &self,
        request: &SwapRequest,
        trace: &TraceContext,
        logger: &SwapLogger,
        cancel: &CancellationToken,
    ) -> Result<SwapOutcome, SwapError> {
        let mut machine = AttemptMachine::new(request.base_slippage_bps, request.max_retries);

        loop {
            let attempt = machine.attempt();
            let slippage_bps = machine.slippage_bps();
            let attempt_span = trace.child_span(&format!("attempt-{}", attempt + 1)).span();
            attempt_span.in_scope(|| {
                logger.log_attempt_start(attempt, machine.max_attempts(), slippage_bps)
            });
            metrics().attempts_total.inc();

            let error = match self
                .run_attempt(request, attempt, slippage_bps, logger, cancel)
                .instrument(attempt_span.clone())
                .await
            {
                Ok(report) => return Ok(SwapOutcome::Completed(report)),
                Err(e) => e,
            };

            match machine.on_failure(&error, self.retry_backoff.as_ref()) {
                AttemptDecision::Skip => {
                    let reason = error.to_string();
                    attempt_span.in_scope(|| logger.log_skip(attempt, &reason));
                    return Ok(SwapOutcome::Skipped {
                        reason,
                        attempt: attempt + 1,
                    });
                }
                AttemptDecision::Abort => {
                    logger.error(&format!("Swap aborted: {}", error));
                    return Err(error);
                }
                AttemptDecision::Exhausted { attempts } => {
                    attempt_span.in_scope(|| {
                        self.record_failure(attempt, machine.max_attempts(), &error, logger)
                    });
                    logger.error(&format!("Swap failed after {} attempts", attempts));
                    return Err(SwapError::RetriesExhausted {
                        attempts,
                        last: Box::new(error),
                    });
                }
                AttemptDecision::Retry {
                    delay,
                    next_attempt,
                    slippage_bps,
                } => {
                    attempt_span.in_scope(|| {
                        self.record_failure(attempt, machine.max_attempts(), &error, logger)
                    });
                    logger.log_retry_scheduled(next_attempt, delay, slippage_bps);
                    pause(self.sleeper.as_ref(), cancel, delay).await?;
                }
            }
        }
    }

    fn record_failure(&self, attempt: u32, max: u32, error: &SwapError, logger: &SwapLogger) {
        metrics()
            .attempt_failures
            .with_label_values(&[error.stage()])
            .inc();
        logger.log_stage_failure(attempt, max, error);
    }

    /// One complete attempt, from fresh quote to confirmed bundle
    async fn run_attempt(
        &self,
        request: &SwapRequest,
        attempt: u32,
        slippage_bps: u16,
        logger: &SwapLogger,
        cancel: &CancellationToken,
    ) -> Result<SwapReport, SwapError> {
        let chain = self.chain.as_ref();
        let payer = self.wallet.pubkey();

        let in_decimals = cancellable(cancel, chain.token_decimals(&request.input_mint)).await??;
        let out_decimals =
            cancellable(cancel, chain.token_decimals(&request.output_mint)).await??;
        let amount = ui_to_base_units(request.amount, in_decimals)?;

        let quote = cancellable(
            cancel,
            self.aggregator.quote(&QuoteRequest {
                input_mint: request.input_mint,
                output_mint: request.output_mint,
                amount,
                slippage_bps,
            }),
        )
        .await??;
        logger.log_quote(
            attempt,
            quote.in_amount,
            quote.out_amount,
            base_units_to_ui(quote.out_amount, out_decimals),
            quote.route_plan.len(),
        );

        let instructions =
            cancellable(cancel, self.aggregator.swap_instructions(&quote, &payer)).await??;
        let table_keys = instructions.lookup_table_keys()?;
        let lookup_tables = cancellable(cancel, chain.lookup_tables(&table_keys)).await??;

        let decoded = decode_swap_instructions(&instructions, &payer)?
            .with_tip(tip_instruction(&payer, self.settings.tip_lamports));

        let simulation = cancellable(
            cancel,
            estimate_compute_budget(
                chain,
                &decoded.body(),
                &payer,
                &lookup_tables,
                self.settings.simulation_retries,
                &self.settings.compute_budget,
            ),
        )
        .await??;
        let priority_fee =
            cancellable(cancel, estimate_priority_fee(chain, &self.settings.priority_fee)).await?;
        logger.log_budget(
            attempt,
            simulation.units_consumed,
            simulation.compute_unit_limit,
            priority_fee.micro_lamports,
            priority_fee.total_cost_sol(simulation.compute_unit_limit),
        );

        let blockhash = cancellable(cancel, chain.latest_blockhash()).await??;
        let ctx = AttemptContext::new(attempt, slippage_bps, payer, blockhash, lookup_tables);

        let unsigned = assemble(&ctx, &decoded, &simulation, &priority_fee)?;
        let signed = unsigned.sign(self.wallet.keypair())?;

        let confirmation = self.confirmer().confirm(&signed, logger, cancel).await?;

        Ok(SwapReport {
            status: crate::types::BundleStatus::Landed {
                slot: confirmation.slot,
            },
            signature: *signed.signature(),
            bundle_id: confirmation.bundle_id,
            slot: confirmation.slot,
            attempts: attempt + 1,
            slippage_bps,
            in_amount: quote.in_amount,
            quoted_out_amount: quote.out_amount,
            resubmissions: confirmation.resubmissions,
            landed_at: chrono::Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{
        sample_request, test_executor, FakeAggregator, FakeChain, RecordingSleeper,
        ScriptedBundler, SimMode,
    };
    use crate::types::{BundleId, BundleStatus};
    use proptest::prelude::*;

    #[test]
    fn test_slippage_schedule() {
        assert_eq!(effective_slippage_bps(100, 0), 100);
        assert_eq!(effective_slippage_bps(100, 1), 150);
        assert_eq!(effective_slippage_bps(100, 2), 200);
        assert_eq!(effective_slippage_bps(75, 1), 112);
        assert_eq!(effective_slippage_bps(9_000, 4), MAX_SLIPPAGE_BPS);
    }

    #[test]
    fn test_attempt_machine_decisions() {
        let backoff = FixedBackoff::from_millis(2_000);
        let mut m = AttemptMachine::new(100, 3);

        let quote_err = SwapError::Quote("no route".into());
        assert_eq!(
            m.on_failure(&quote_err, &backoff),
            AttemptDecision::Retry {
                delay: Duration::from_secs(2),
                next_attempt: 1,
                slippage_bps: 150
            }
        );
        assert_eq!(m.slippage_bps(), 150);
        assert!(matches!(m.on_failure(&quote_err, &backoff), AttemptDecision::Retry { .. }));
        assert_eq!(
            m.on_failure(&quote_err, &backoff),
            AttemptDecision::Exhausted { attempts: 3 }
        );
    }

    #[test]
    fn test_attempt_machine_skip_and_abort() {
        let backoff = FixedBackoff::from_millis(0);
        let mut m = AttemptMachine::new(100, 3);
        let rent = SwapError::InsufficientFundsForRent { account_index: None };
        assert_eq!(m.on_failure(&rent, &backoff), AttemptDecision::Skip);
        assert_eq!(m.on_failure(&SwapError::Cancelled, &backoff), AttemptDecision::Abort);
        assert_eq!(m.attempt(), 0);
    }

    #[tokio::test]
    async fn test_happy_path_lands_first_attempt() {
        let aggregator = Arc::new(FakeAggregator::new());
        let chain = Arc::new(FakeChain::new());
        let bundler = Arc::new(
            ScriptedBundler::new().with_statuses(vec![Some(BundleStatus::Landed { slot: 777 })]),
        );
        let (executor, sleeper) = test_executor(aggregator.clone(), chain.clone(), bundler.clone());

        let outcome = executor
            .execute(&sample_request(), &CancellationToken::new())
            .await
            .expect("swap succeeds");
        let report = outcome.report().expect("completed");

        assert_eq!(report.slot, 777);
        assert_eq!(report.attempts, 1);
        assert_eq!(report.slippage_bps, 100);
        assert_eq!(report.bundle_id, BundleId::new("bundle-1"));
        assert!(report.explorer_url().ends_with(&report.signature.to_string()));
        assert_eq!(aggregator.quote_requests()[0].amount, 1_000_000);
        assert_eq!(sleeper.sleeps(), vec![Duration::from_secs(15)]);
    }

    #[tokio::test]
    async fn test_rent_shortfall_skips_without_bundle() {
        let aggregator = Arc::new(FakeAggregator::new());
        let chain = Arc::new(FakeChain::new().with_sim(SimMode::RentShortfall));
        let bundler = Arc::new(ScriptedBundler::new());
        let (executor, sleeper) = test_executor(aggregator.clone(), chain, bundler.clone());

        let outcome = executor
            .execute(&sample_request(), &CancellationToken::new())
            .await
            .expect("skip is not an error");

        assert!(matches!(outcome, SwapOutcome::Skipped { attempt: 1, .. }));
        assert_eq!(bundler.submission_count(), 0);
        assert_eq!(aggregator.quote_requests().len(), 1);
        assert!(sleeper.sleeps().is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let (executor, _) = test_executor(
            Arc::new(FakeAggregator::new()),
            Arc::new(FakeChain::new()),
            Arc::new(ScriptedBundler::new()),
        );
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = executor.execute(&sample_request(), &cancel).await.unwrap_err();
        assert!(matches!(err, SwapError::Cancelled));
    }

    #[tokio::test]
    async fn test_invalid_request_is_rejected_without_attempts() {
        let aggregator = Arc::new(FakeAggregator::new());
        let (executor, _) = test_executor(
            aggregator.clone(),
            Arc::new(FakeChain::new()),
            Arc::new(ScriptedBundler::new()),
        );
        let mut request = sample_request();
        request.amount = -1.0;

        let err = executor.execute(&request, &CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, SwapError::Configuration(_)));
        assert!(aggregator.quote_requests().is_empty());
    }

    #[tokio::test]
    async fn test_amount_below_one_base_unit_aborts_without_retry() {
        let aggregator = Arc::new(FakeAggregator::new());
        let chain = Arc::new(FakeChain::new());
        let (executor, sleeper) = test_executor(
            aggregator.clone(),
            chain.clone(),
            Arc::new(ScriptedBundler::new()),
        );
        // passes request validation but rounds to 0 lamports at 9 decimals
        let mut request = sample_request();
        request.amount = 1e-12;

        let err = executor.execute(&request, &CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, SwapError::Configuration(_)));
        assert!(aggregator.quote_requests().is_empty());
        assert!(sleeper.sleeps().is_empty());
        assert_eq!(chain.blockhash_requests(), 0);
    }

    #[tokio::test]
    async fn test_simulation_failure_retries_with_wider_slippage() {
        let aggregator = Arc::new(FakeAggregator::new());
        let chain = Arc::new(FakeChain::new().with_sim(SimMode::Failure("custom program error: 0x1771".into())));
        let bundler = Arc::new(ScriptedBundler::new());
        let (executor, sleeper) = test_executor(aggregator.clone(), chain, bundler.clone());

        let err = executor
            .execute(&sample_request(), &CancellationToken::new())
            .await
            .unwrap_err();

        match err {
            SwapError::RetriesExhausted { attempts, last } => {
                assert_eq!(attempts, 3);
                assert!(matches!(*last, SwapError::Simulation(_)));
            }
            other => panic!("unexpected error: {:?}", other),
        }
        let slippages: Vec<u16> = aggregator.quote_requests().iter().map(|q| q.slippage_bps).collect();
        assert_eq!(slippages, vec![100, 150, 200]);
        assert_eq!(sleeper.sleeps(), vec![Duration::from_secs(2); 2]);
        assert_eq!(bundler.submission_count(), 0);
    }

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl CapturedLogs {
        fn lines_with(&self, message: &str) -> Vec<String> {
            let bytes = self.0.lock().unwrap().clone();
            String::from_utf8_lossy(&bytes)
                .lines()
                .filter(|l| l.contains(message))
                .map(str::to_string)
                .collect()
        }
    }

    fn span_field<'a>(line: &'a str, operation: &str, field: &str) -> Option<&'a str> {
        let scope = &line[line.find(&format!("operation={}", operation))?..];
        let value = &scope[scope.find(&format!("{}=", field))? + field.len() + 1..];
        value.split([' ', '}']).next()
    }

    #[tokio::test]
    async fn test_each_attempt_logs_in_its_own_span() {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();
        let _default = tracing::subscriber::set_default(subscriber);

        // attempt 1 is never confirmed, attempt 2 lands on its first poll
        let bundler = Arc::new(ScriptedBundler::new().with_statuses(vec![
            Some(BundleStatus::Pending),
            Some(BundleStatus::Pending),
            Some(BundleStatus::Pending),
            Some(BundleStatus::Landed { slot: 5 }),
        ]));
        let (executor, _) = test_executor(
            Arc::new(FakeAggregator::new()),
            Arc::new(FakeChain::new()),
            bundler,
        );
        executor
            .execute(&sample_request(), &CancellationToken::new())
            .await
            .expect("second attempt lands");

        let quotes = logs.lines_with("Quote received");
        assert_eq!(quotes.len(), 2);
        let first = span_field(&quotes[0], "attempt-1", "span_id").expect("attempt-1 span");
        let second = span_field(&quotes[1], "attempt-2", "span_id").expect("attempt-2 span");
        assert_ne!(first, second);

        // both attempts share the operation's trace id
        let root = span_field(&quotes[0], "swap", "trace_id").expect("root span");
        assert_eq!(span_field(&quotes[1], "swap", "trace_id"), Some(root));
        assert_eq!(span_field(&quotes[1], "attempt-2", "trace_id"), Some(root));

        let failures = logs.lines_with("Swap attempt failed");
        assert_eq!(failures.len(), 1);
        assert_eq!(span_field(&failures[0], "attempt-1", "span_id"), Some(first));
    }

    proptest! {
        #[test]
        fn prop_slippage_never_narrows(base in 1u16..=10_000, attempt in 0u32..50) {
            let current = effective_slippage_bps(base, attempt);
            let next = effective_slippage_bps(base, attempt + 1);
            prop_assert!(next >= current);
            prop_assert!(current >= base.min(MAX_SLIPPAGE_BPS));
            prop_assert!(current <= MAX_SLIPPAGE_BPS);
        }

        #[test]
        fn prop_even_bases_are_exact(half in 1u16..=2_500, attempt in 0u32..2) {
            let base = half * 2;
            let expected = base as u64 + (base as u64 / 2) * attempt as u64;
            prop_assert_eq!(effective_slippage_bps(base, attempt) as u64, expected);
        }
    }

    #[tokio::test]
    async fn test_machine_bounds_attempts() {
        // extra sleeper handle proves no wait follows the final attempt
        let sleeper = Arc::new(RecordingSleeper::new());
        let (executor, _) = test_executor(
            Arc::new(FakeAggregator::new().failing_quotes()),
            Arc::new(FakeChain::new()),
            Arc::new(ScriptedBundler::new()),
        );
        let executor = executor.with_sleeper(sleeper.clone());
        let mut request = sample_request();
        request.max_retries = 4;

        let err = executor.execute(&request, &CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, SwapError::RetriesExhausted { attempts: 4, .. }));
        assert_eq!(sleeper.sleeps().len(), 3);
    }
}
