//! # Detached wait handle.
//!
//! [`WaitHandle`] backs the async form of the await/retry primitive: the
//! poll runs as a task on the shared runtime, the result future is memoized
//! (asking twice never starts a second poll), and cancellation is observed
//! inside the poll loop within one retry interval.

use std::sync::Arc;
use std::time::Duration;

use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use tokio_util::sync::CancellationToken;

use crate::error::AwaitError;
use crate::waiting::poll::{poll_async, WaitConfig};

/// Shared, memoized result future of a detached wait.
pub type SharedWait<V> = Shared<BoxFuture<'static, Result<V, AwaitError>>>;

/// Handle to a detached poll loop.
pub struct WaitHandle<V> {
    token: CancellationToken,
    future: SharedWait<V>,
}

impl<V: Clone + Send + 'static> WaitHandle<V> {
    pub(crate) fn spawn(
        config: WaitConfig,
        step: Arc<dyn Fn() -> Option<V> + Send + Sync>,
        timeout: Option<Duration>,
    ) -> Self {
        let token = CancellationToken::new();
        let poll_token = token.clone();
        let join =
            tokio::spawn(async move { poll_async(config, move || step(), timeout, Some(poll_token)).await });
        let future = async move {
            match join.await {
                Ok(result) => result,
                Err(join_err) if join_err.is_panic() => {
                    std::panic::resume_unwind(join_err.into_panic())
                }
                Err(_) => Err(AwaitError::Canceled),
            }
        }
        .boxed()
        .shared();
        Self { token, future }
    }

    /// The memoized result future; every call returns the same future.
    pub fn future(&self) -> SharedWait<V> {
        self.future.clone()
    }

    /// Requests cancellation; the poll observes it within one interval and
    /// the future completes with [`AwaitError::Canceled`].
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Awaits the memoized result.
    pub async fn outcome(&self) -> Result<V, AwaitError> {
        self.future().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::waiting::{await_until, retry};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Instant;

    #[tokio::test]
    async fn test_cancel_completes_canceled_promptly() {
        let handle = await_until(|| false)
            .with_retry_interval(Duration::from_millis(20))
            .spawn();

        tokio::time::sleep(Duration::from_millis(50)).await;
        let started = Instant::now();
        handle.cancel();
        let outcome = handle.outcome().await;

        assert_eq!(outcome, Err(AwaitError::Canceled));
        // Cancelled, not timed out, and the worker was freed within ~one
        // interval rather than left polling.
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_future_is_memoized_not_a_second_poll() {
        let polls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&polls);
        let handle = retry(move || {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            (n >= 2).then_some(n)
        })
        .with_retry_interval(Duration::from_millis(5))
        .spawn();

        let first = handle.future();
        let second = handle.future();
        assert_eq!(first.await.unwrap(), 2);
        assert_eq!(second.await.unwrap(), 2);
        assert_eq!(polls.load(Ordering::SeqCst), 2, "one poll, shared result");
    }

    #[tokio::test]
    async fn test_detached_timeout_surfaces_as_a_failed_future() {
        let handle = await_until(|| false)
            .with_retry_interval(Duration::from_millis(10))
            .spawn_at_most(Duration::from_millis(60));

        let err = handle.outcome().await.unwrap_err();
        assert_eq!(err.as_label(), "wait_timeout");
    }
}
