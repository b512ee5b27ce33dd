//! Error and fault types used across the crate.
//!
//! This module defines:
//!
//! - [`AwaitError`] — temporal failures of the await/retry primitive.
//! - [`StageError`] — lifecycle misuse of a derived pipeline stage.
//! - [`Fault`] — the shared "exception" payload delivered to observers.
//!
//! Error enums provide helper methods (`as_label`, `as_message`) for
//! logging/metrics, mirroring the rest of the error surface.

use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

/// Shared fault payload delivered through an observable's exception channel.
///
/// A fault is any error value; it is reference-counted so a single fault can
/// fan out to many observers without cloning the underlying error.
pub type Fault = Arc<dyn std::error::Error + Send + Sync + 'static>;

/// Wraps a concrete error into a [`Fault`].
pub fn fault(err: impl std::error::Error + Send + Sync + 'static) -> Fault {
    Arc::new(err)
}

/// # Errors produced by the await/retry primitive.
///
/// Each cause is a distinct variant so callers can tell a retry budget
/// exhaustion from a wall-clock timeout from an explicit cancellation.
/// Variants carry the diagnostic message configured on the builder, if any.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AwaitError {
    /// The wall-clock timeout elapsed before the condition was satisfied.
    #[error("timed out after {timeout:?}{}", fmt_message(.message))]
    Timeout {
        /// The configured timeout that was exceeded.
        timeout: Duration,
        /// Diagnostic message configured on the builder.
        message: Option<Arc<str>>,
    },

    /// The retry budget was exhausted before the condition was satisfied.
    #[error("retries exceeded after {attempts} evaluations{}", fmt_message(.message))]
    RetryExceeded {
        /// Total number of evaluations performed (1 initial + n retries).
        attempts: u32,
        /// Diagnostic message configured on the builder.
        message: Option<Arc<str>>,
    },

    /// The spawned wait was cancelled before completion.
    #[error("wait cancelled")]
    Canceled,
}

fn fmt_message(message: &Option<Arc<str>>) -> String {
    match message {
        Some(m) => format!(": {m}"),
        None => String::new(),
    }
}

impl AwaitError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use liveprop::AwaitError;
    ///
    /// assert_eq!(AwaitError::Canceled.as_label(), "wait_canceled");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            AwaitError::Timeout { .. } => "wait_timeout",
            AwaitError::RetryExceeded { .. } => "wait_retries_exceeded",
            AwaitError::Canceled => "wait_canceled",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        self.to_string()
    }

    /// Returns true for outcomes that can succeed when simply run again
    /// (budget exhaustion), false for timeout and cancellation.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AwaitError::RetryExceeded { .. })
    }
}

/// # Errors produced by the derived-stage lifecycle.
///
/// These represent programming errors: they are raised loudly at the call
/// site instead of degrading into silent no-ops.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StageError {
    /// An upstream attachment was attempted through an anchor whose stage
    /// has already been reclaimed.
    #[error("stage already reclaimed; its anchor cannot be reused")]
    Reclaimed,
}

impl StageError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            StageError::Reclaimed => "stage_reclaimed",
        }
    }
}

/// Fault raised when an observer callback or a combinator step panics.
///
/// The panic payload is reduced to its message, the same way the delivery
/// workers report panicking subscribers.
#[derive(Error, Debug)]
#[error("panic in callback: {message}")]
pub struct PanicFault {
    /// Panic payload rendered as text.
    pub message: String,
}

/// Converts a caught panic payload into a [`Fault`].
pub(crate) fn panic_fault(payload: Box<dyn Any + Send>) -> Fault {
    let message = {
        let any = &*payload;
        if let Some(msg) = any.downcast_ref::<&'static str>() {
            (*msg).to_string()
        } else if let Some(msg) = any.downcast_ref::<String>() {
            msg.clone()
        } else {
            "unknown panic".to_string()
        }
    };
    Arc::new(PanicFault { message })
}
