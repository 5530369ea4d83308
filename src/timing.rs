//! Injectable wait strategies
//!
//! Both timed waits of a swap (the inter-attempt backoff and the inter-poll
//! confirmation wait) go through a `BackoffPolicy` that decides how long to
//! wait and a `Sleeper` that performs the wait. Tests substitute a sleeper that
//! records durations and returns immediately.

use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::errors::SwapError;

/// Performs a timed wait
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Real-time sleeper backed by the tokio timer
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Chooses the delay before the next try (0-indexed)
pub trait BackoffPolicy: Send + Sync + std::fmt::Debug {
    fn delay(&self, attempt: u32) -> Duration;
}

/// Same delay for every try
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedBackoff {
    delay: Duration,
}

impl FixedBackoff {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn from_millis(ms: u64) -> Self {
        Self::new(Duration::from_millis(ms))
    }
}

impl BackoffPolicy for FixedBackoff {
    fn delay(&self, _attempt: u32) -> Duration {
        self.delay
    }
}

/// Run `fut` unless `cancel` fires first
pub async fn cancellable<F>(cancel: &CancellationToken, fut: F) -> Result<F::Output, SwapError>
where
    F: Future,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(SwapError::Cancelled),
        out = fut => Ok(out),
    }
}

/// Sleep through `sleeper`, aborting early on cancellation
pub async fn pause(
    sleeper: &dyn Sleeper,
    cancel: &CancellationToken,
    duration: Duration,
) -> Result<(), SwapError> {
    cancellable(cancel, sleeper.sleep(duration)).await
}
