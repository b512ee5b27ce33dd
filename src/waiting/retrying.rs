//! # Retry builder: poll a producer until it yields a value.
//!
//! The "retry" form of the blocking primitive: the step is a producer
//! returning `Option<V>`, and a satisfied wait returns the unwrapped value.

use std::sync::Arc;
use std::time::Duration;

use crate::error::AwaitError;
use crate::waiting::handle::WaitHandle;
use crate::waiting::poll::{poll_async, poll_blocking, WaitConfig};

/// Starts a retry wait over a value producer.
///
/// Defaults: 100 ms interval, unlimited retries, no timeout, no message.
///
/// # Example
/// ```no_run
/// use std::time::Duration;
/// use liveprop::retry;
///
/// # async fn demo() -> Result<(), liveprop::AwaitError> {
/// let value = retry(|| std::fs::read_to_string("ready.txt").ok())
///     .with_retry_interval(Duration::from_millis(50))
///     .with_message("waiting for ready file")
///     .at_most(Duration::from_secs(5))
///     .await?;
/// # let _ = value; Ok(())
/// # }
/// ```
pub fn retry<V>(producer: impl Fn() -> Option<V> + Send + Sync + 'static) -> Retry<V> {
    Retry {
        config: WaitConfig::default(),
        producer: Arc::new(producer),
    }
}

/// Builder for a poll-based wait that produces a value.
pub struct Retry<V> {
    config: WaitConfig,
    producer: Arc<dyn Fn() -> Option<V> + Send + Sync>,
}

impl<V> Retry<V> {
    /// Sets the delay between evaluations.
    ///
    /// `Duration::ZERO` yields the task/thread each iteration instead of
    /// busy-spinning.
    pub fn with_retry_interval(mut self, interval: Duration) -> Self {
        self.config.interval = interval;
        self
    }

    /// Caps the retry budget: `retries` retries allow `retries + 1`
    /// evaluations before the wait fails.
    pub fn with_retry_count(mut self, retries: u32) -> Self {
        self.config.retries = Some(retries);
        self
    }

    /// Attaches a diagnostic message carried by temporal errors.
    pub fn with_message(mut self, message: impl Into<Arc<str>>) -> Self {
        self.config.message = Some(message.into());
        self
    }

    /// Polls without a wall-clock limit until satisfied or out of retries.
    pub async fn indefinitely(self) -> Result<V, AwaitError> {
        let producer = self.producer;
        poll_async(self.config, move || producer(), None, None).await
    }

    /// Polls with a wall-clock limit.
    ///
    /// # Panics
    /// A zero timeout is a programming error.
    pub async fn at_most(self, timeout: Duration) -> Result<V, AwaitError> {
        assert!(!timeout.is_zero(), "wait timeout must be non-zero");
        let producer = self.producer;
        poll_async(self.config, move || producer(), Some(timeout), None).await
    }

    /// Blocking form of [`Retry::indefinitely`] for synchronous callers.
    pub fn block_indefinitely(self) -> Result<V, AwaitError> {
        let producer = self.producer;
        poll_blocking(self.config, move || producer(), None)
    }

    /// Blocking form of [`Retry::at_most`] for synchronous callers.
    ///
    /// # Panics
    /// A zero timeout is a programming error.
    pub fn block_at_most(self, timeout: Duration) -> Result<V, AwaitError> {
        assert!(!timeout.is_zero(), "wait timeout must be non-zero");
        let producer = self.producer;
        poll_blocking(self.config, move || producer(), Some(timeout))
    }
}

impl<V: Clone + Send + 'static> Retry<V> {
    /// Detaches the poll onto the shared runtime, without a wall-clock limit.
    ///
    /// The returned handle memoizes its future and can be cancelled.
    pub fn spawn(self) -> WaitHandle<V> {
        WaitHandle::spawn(self.config, self.producer, None)
    }

    /// Detaches the poll with a wall-clock limit.
    ///
    /// # Panics
    /// A zero timeout is a programming error.
    pub fn spawn_at_most(self, timeout: Duration) -> WaitHandle<V> {
        assert!(!timeout.is_zero(), "wait timeout must be non-zero");
        WaitHandle::spawn(self.config, self.producer, Some(timeout))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn test_retry_returns_the_produced_value() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        let value = retry(move || {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            (n >= 3).then_some(n)
        })
        .with_retry_interval(Duration::ZERO)
        .indefinitely()
        .await
        .unwrap();

        assert_eq!(value, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_budget_allows_n_plus_one_evaluations() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        let err = retry(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            None::<u32>
        })
        .with_retry_count(5)
        .with_retry_interval(Duration::ZERO)
        .indefinitely()
        .await
        .unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 6);
        match err {
            AwaitError::RetryExceeded { attempts, .. } => assert_eq!(attempts, 6),
            other => panic!("expected RetryExceeded, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_timeout_error_carries_the_message() {
        let err = retry(|| None::<u32>)
            .with_retry_interval(Duration::from_millis(10))
            .with_message("widget never arrived")
            .at_most(Duration::from_millis(60))
            .await
            .unwrap_err();

        assert_eq!(err.as_label(), "wait_timeout");
        assert!(err.as_message().contains("widget never arrived"));
    }

    #[test]
    fn test_blocking_form_works_without_a_runtime() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        let value = retry(move || {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            (n >= 2).then_some("ready")
        })
        .with_retry_interval(Duration::from_millis(1))
        .block_at_most(Duration::from_secs(5))
        .unwrap();
        assert_eq!(value, "ready");
    }

    #[test]
    #[should_panic(expected = "non-zero")]
    fn test_zero_timeout_is_rejected_loudly() {
        let _ = retry(|| Some(1)).block_at_most(Duration::ZERO);
    }
}
