//! # Shared poll loop.
//!
//! One engine behind every await/retry form: evaluate the step, account the
//! attempt, check budgets, sleep (or yield when the interval is zero), and
//! observe cancellation between evaluations.
//!
//! ## Rules
//! - Retry semantics: a budget of `n` retries allows `n + 1` evaluations.
//! - A zero interval yields the task/thread each iteration; it never
//!   busy-spins.
//! - Cancellation is observed within one interval.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use crate::error::AwaitError;

/// Poll-loop configuration shared by the builder forms.
#[derive(Clone)]
pub(crate) struct WaitConfig {
    /// Delay between evaluations.
    pub interval: Duration,
    /// Retry budget; `None` means unlimited.
    pub retries: Option<u32>,
    /// Diagnostic message carried into temporal errors.
    pub message: Option<Arc<str>>,
}

impl Default for WaitConfig {
    /// 100 ms interval, unlimited retries, no message.
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(100),
            retries: None,
            message: None,
        }
    }
}

enum Budget<V> {
    Pending,
    Done(Result<V, AwaitError>),
}

/// One evaluation plus budget accounting, shared by both loop flavors.
fn evaluate<V>(
    config: &WaitConfig,
    step: &impl Fn() -> Option<V>,
    attempts: &mut u32,
    started: Instant,
    timeout: Option<Duration>,
) -> Budget<V> {
    if let Some(value) = step() {
        return Budget::Done(Ok(value));
    }
    *attempts = attempts.saturating_add(1);
    if let Some(max_retries) = config.retries {
        if *attempts > max_retries {
            return Budget::Done(Err(AwaitError::RetryExceeded {
                attempts: *attempts,
                message: config.message.clone(),
            }));
        }
    }
    if let Some(limit) = timeout {
        if started.elapsed() >= limit {
            return Budget::Done(Err(AwaitError::Timeout {
                timeout: limit,
                message: config.message.clone(),
            }));
        }
    }
    Budget::Pending
}

/// Async poll loop; the worker-pool and cancellable forms run on this.
pub(crate) async fn poll_async<V>(
    config: WaitConfig,
    step: impl Fn() -> Option<V>,
    timeout: Option<Duration>,
    token: Option<CancellationToken>,
) -> Result<V, AwaitError> {
    let started = Instant::now();
    let mut attempts: u32 = 0;
    loop {
        if let Some(token) = &token {
            if token.is_cancelled() {
                return Err(AwaitError::Canceled);
            }
        }
        match evaluate(&config, &step, &mut attempts, started, timeout) {
            Budget::Done(result) => return result,
            Budget::Pending => {}
        }
        if config.interval.is_zero() {
            tokio::task::yield_now().await;
            continue;
        }
        let sleep_for = match timeout {
            Some(limit) => config.interval.min(limit.saturating_sub(started.elapsed())),
            None => config.interval,
        };
        match &token {
            Some(token) => {
                tokio::select! {
                    _ = token.cancelled() => return Err(AwaitError::Canceled),
                    _ = tokio::time::sleep(sleep_for) => {}
                }
            }
            None => tokio::time::sleep(sleep_for).await,
        }
    }
}

/// Blocking poll loop for bridging into synchronous code.
///
/// Blocks the calling thread; do not run it on an executor thread.
pub(crate) fn poll_blocking<V>(
    config: WaitConfig,
    step: impl Fn() -> Option<V>,
    timeout: Option<Duration>,
) -> Result<V, AwaitError> {
    let started = Instant::now();
    let mut attempts: u32 = 0;
    loop {
        match evaluate(&config, &step, &mut attempts, started, timeout) {
            Budget::Done(result) => return result,
            Budget::Pending => {}
        }
        if config.interval.is_zero() {
            std::thread::yield_now();
            continue;
        }
        let sleep_for = match timeout {
            Some(limit) => config.interval.min(limit.saturating_sub(started.elapsed())),
            None => config.interval,
        };
        std::thread::sleep(sleep_for);
    }
}
