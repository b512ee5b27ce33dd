//! # Await builder: poll a predicate until it holds.
//!
//! The boolean form of the blocking primitive, expressed over the retry
//! engine: a satisfied predicate is a produced `()`.

use std::sync::Arc;
use std::time::Duration;

use crate::error::AwaitError;
use crate::waiting::handle::WaitHandle;
use crate::waiting::retrying::{retry, Retry};

/// Starts a wait on a boolean predicate.
///
/// Defaults: 100 ms interval, unlimited retries, no timeout, no message.
///
/// # Example
/// ```no_run
/// use std::time::Duration;
/// use liveprop::await_until;
///
/// # async fn demo(link_up: impl Fn() -> bool + Send + Sync + 'static) -> Result<(), liveprop::AwaitError> {
/// await_until(link_up)
///     .with_message("link never came up")
///     .at_most(Duration::from_secs(10))
///     .await
/// # }
/// ```
pub fn await_until(predicate: impl Fn() -> bool + Send + Sync + 'static) -> Await {
    Await {
        inner: retry(move || predicate().then_some(())),
    }
}

/// Builder for a poll-based wait on a predicate.
pub struct Await {
    inner: Retry<()>,
}

impl Await {
    /// Sets the delay between evaluations.
    ///
    /// `Duration::ZERO` yields the task/thread each iteration instead of
    /// busy-spinning.
    pub fn with_retry_interval(self, interval: Duration) -> Self {
        Self {
            inner: self.inner.with_retry_interval(interval),
        }
    }

    /// Caps the retry budget: `retries` retries allow `retries + 1`
    /// evaluations before the wait fails.
    pub fn with_retry_count(self, retries: u32) -> Self {
        Self {
            inner: self.inner.with_retry_count(retries),
        }
    }

    /// Attaches a diagnostic message carried by temporal errors.
    pub fn with_message(self, message: impl Into<Arc<str>>) -> Self {
        Self {
            inner: self.inner.with_message(message),
        }
    }

    /// Polls without a wall-clock limit until satisfied or out of retries.
    pub async fn indefinitely(self) -> Result<(), AwaitError> {
        self.inner.indefinitely().await
    }

    /// Polls with a wall-clock limit.
    ///
    /// # Panics
    /// A zero timeout is a programming error.
    pub async fn at_most(self, timeout: Duration) -> Result<(), AwaitError> {
        self.inner.at_most(timeout).await
    }

    /// Blocking form of [`Await::indefinitely`] for synchronous callers.
    pub fn block_indefinitely(self) -> Result<(), AwaitError> {
        self.inner.block_indefinitely()
    }

    /// Blocking form of [`Await::at_most`] for synchronous callers.
    ///
    /// # Panics
    /// A zero timeout is a programming error.
    pub fn block_at_most(self, timeout: Duration) -> Result<(), AwaitError> {
        self.inner.block_at_most(timeout)
    }

    /// Detaches the poll onto the shared runtime, without a wall-clock limit.
    pub fn spawn(self) -> WaitHandle<()> {
        self.inner.spawn()
    }

    /// Detaches the poll with a wall-clock limit.
    ///
    /// # Panics
    /// A zero timeout is a programming error.
    pub fn spawn_at_most(self, timeout: Duration) -> WaitHandle<()> {
        self.inner.spawn_at_most(timeout)
    }
}
