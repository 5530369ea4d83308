//! Metrics collection and export module

use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use scopeguard::ScopeGuard;
use std::time::Instant;

/// Swap executor metrics
pub struct Metrics {
    registry: Registry,

    // Operation counters
    pub swaps_started: IntCounter,
    pub swaps_completed: IntCounter,
    pub swaps_skipped: IntCounter,
    pub swaps_failed: IntCounter,

    // Attempt counters
    pub attempts_total: IntCounter,
    pub attempt_failures: IntCounterVec,

    // Bundle counters
    pub bundles_submitted: IntCounter,
    pub bundles_resubmitted: IntCounter,
    pub bundle_polls: IntCounterVec,

    // Gauges
    pub active_swaps: IntGauge,
    pub last_priority_fee: IntGauge,

    // Histograms
    pub swap_latency: Histogram,
    pub simulated_compute_units: Histogram,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let swaps_started =
            IntCounter::with_opts(Opts::new("swaps_started_total", "Swap operations started"))?;
        let swaps_completed = IntCounter::with_opts(Opts::new(
            "swaps_completed_total",
            "Swap operations that landed",
        ))?;
        let swaps_skipped = IntCounter::with_opts(Opts::new(
            "swaps_skipped_total",
            "Swap operations skipped for insufficient rent funds",
        ))?;
        let swaps_failed = IntCounter::with_opts(Opts::new(
            "swaps_failed_total",
            "Swap operations that exhausted retries or were cancelled",
        ))?;

        let attempts_total =
            IntCounter::with_opts(Opts::new("swap_attempts_total", "Swap attempts started"))?;
        let attempt_failures = IntCounterVec::new(
            Opts::new("swap_attempt_failures_total", "Failed swap attempts by stage"),
            &["stage"],
        )?;

        let bundles_submitted = IntCounter::with_opts(Opts::new(
            "bundles_submitted_total",
            "Bundles submitted, including resubmissions",
        ))?;
        let bundles_resubmitted = IntCounter::with_opts(Opts::new(
            "bundles_resubmitted_total",
            "Bundles resubmitted after a Failed status",
        ))?;
        let bundle_polls = IntCounterVec::new(
            Opts::new("bundle_polls_total", "Bundle status polls by observed status"),
            &["status"],
        )?;

        let active_swaps =
            IntGauge::with_opts(Opts::new("active_swaps", "Swap operations in progress"))?;
        let last_priority_fee = IntGauge::with_opts(Opts::new(
            "last_priority_fee_micro_lamports",
            "Most recent priority fee bid",
        ))?;

        let swap_latency = Histogram::with_opts(
            HistogramOpts::new("swap_latency_seconds", "End-to-end swap operation latency")
                .buckets(vec![1.0, 5.0, 15.0, 30.0, 60.0, 120.0, 300.0]),
        )?;
        let simulated_compute_units = Histogram::with_opts(
            HistogramOpts::new("simulated_compute_units", "Compute units consumed in simulation")
                .buckets(vec![50_000.0, 100_000.0, 200_000.0, 400_000.0, 800_000.0, 1_400_000.0]),
        )?;

        registry.register(Box::new(swaps_started.clone()))?;
        registry.register(Box::new(swaps_completed.clone()))?;
        registry.register(Box::new(swaps_skipped.clone()))?;
        registry.register(Box::new(swaps_failed.clone()))?;
        registry.register(Box::new(attempts_total.clone()))?;
        registry.register(Box::new(attempt_failures.clone()))?;
        registry.register(Box::new(bundles_submitted.clone()))?;
        registry.register(Box::new(bundles_resubmitted.clone()))?;
        registry.register(Box::new(bundle_polls.clone()))?;
        registry.register(Box::new(active_swaps.clone()))?;
        registry.register(Box::new(last_priority_fee.clone()))?;
        registry.register(Box::new(swap_latency.clone()))?;
        registry.register(Box::new(simulated_compute_units.clone()))?;

        Ok(Self {
            registry,
            swaps_started,
            swaps_completed,
            swaps_skipped,
            swaps_failed,
            attempts_total,
            attempt_failures,
            bundles_submitted,
            bundles_resubmitted,
            bundle_polls,
            active_swaps,
            last_priority_fee,
            swap_latency,
            simulated_compute_units,
        })
    }

    /// Count one swap as in progress until the returned guard drops,
    /// including when the owning future is dropped mid-flight
    pub fn track_active_swap(&self) -> ScopeGuard<IntGauge, fn(IntGauge)> {
        self.active_swaps.inc();
        let release: fn(IntGauge) = |gauge| gauge.dec();
        scopeguard::guard(self.active_swaps.clone(), release)
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Render the registry in the Prometheus text exposition format
    pub fn render(&self) -> String {
        let mut buffer = Vec::new();
        let encoder = TextEncoder::new();
        if let Err(e) = encoder.encode(&self.registry.gather(), &mut buffer) {
            tracing::debug!(error = %e, "Failed to encode metrics");
            return String::new();
        }
        String::from_utf8(buffer).unwrap_or_default()
    }
}

/// Global metrics instance
pub fn metrics() -> &'static Metrics {
    static METRICS: once_cell::sync::Lazy<Metrics> =
        once_cell::sync::Lazy::new(|| Metrics::new().expect("Failed to initialize metrics"));
    &METRICS
}

/// Timer helper for measuring operation duration
pub struct Timer {
    start: Instant,
}

impl Timer {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn observe_duration(&self, histogram: &Histogram) {
        histogram.observe(self.elapsed_secs());
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}
