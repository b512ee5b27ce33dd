//! # Observer trait and closure-backed observers.
//!
//! [`Observer`] is the extension point for consuming an observable. Each
//! registered observer gets:
//! - **Dedicated worker task** (runs independently)
//! - **Per-observer unbounded queue** (FIFO per observer)
//! - **Panic isolation** (a panicking callback is routed as a fault, other
//!   observers are unaffected)
//!
//! ## Architecture
//! ```text
//! Registry ──► [unbounded queue] ──► worker task ──► observer.on_value()
//!                                 └─► panic caught → observer.on_fault()
//!                                                     └─ default: sink::raise
//! ```
//!
//! ## Rules
//! - `on_value`/`on_fault` run on the observer's worker, never on the
//!   producer's call stack.
//! - `on_subscribe`/`on_unsubscribe` run synchronously with the registry
//!   transition that caused them.
//! - The default `on_fault` escalates to the process-wide sink, so a fault
//!   always terminates somewhere.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Fault;
use crate::observe::Subscription;

/// Consumer of values and faults from an observable.
///
/// ### Implementation requirements
/// - Use async I/O; avoid blocking the executor.
/// - A slow observer only delays its own queue.
/// - Override [`Observer::on_fault`] to handle faults locally; otherwise they
///   escalate to the process-wide sink.
#[async_trait]
pub trait Observer<T>: Send + Sync + 'static {
    /// Processes one dispatched value.
    ///
    /// Called from a dedicated worker task, in FIFO order per observer.
    async fn on_value(&self, value: &T);

    /// Processes one dispatched fault.
    ///
    /// The default escalates to the process-wide sink.
    async fn on_fault(&self, fault: &Fault) {
        crate::sink::raise(fault);
    }

    /// Invoked synchronously when the observer is registered.
    fn on_subscribe(&self, _subscription: &Subscription) {}

    /// Invoked synchronously when the registration is removed, once per
    /// subscribed→unsubscribed transition.
    fn on_unsubscribe(&self, _subscription: &Subscription) {}
}

/// Closure-backed observer.
///
/// Wraps a value closure and an optional fault closure. Prefer
/// [`FnObserver::arc`] when you immediately need an `Arc<dyn Observer<T>>`.
///
/// # Example
/// ```
/// use liveprop::FnObserver;
///
/// let observer = FnObserver::<i64>::arc(|v| println!("got {v}"));
/// # let _ = observer;
/// ```
pub struct FnObserver<T> {
    value_fn: Box<dyn Fn(&T) + Send + Sync>,
    fault_fn: Option<Box<dyn Fn(&Fault) + Send + Sync>>,
}

impl<T> FnObserver<T> {
    /// Creates an observer from a value closure; faults escalate to the sink.
    pub fn new(value_fn: impl Fn(&T) + Send + Sync + 'static) -> Self {
        Self {
            value_fn: Box::new(value_fn),
            fault_fn: None,
        }
    }

    /// Creates the observer and returns it as a shared handle.
    pub fn arc(value_fn: impl Fn(&T) + Send + Sync + 'static) -> Arc<Self> {
        Arc::new(Self::new(value_fn))
    }

    /// Adds a local fault handler; handled faults do not reach the sink.
    pub fn with_fault(mut self, fault_fn: impl Fn(&Fault) + Send + Sync + 'static) -> Self {
        self.fault_fn = Some(Box::new(fault_fn));
        self
    }
}

#[async_trait]
impl<T: Send + Sync + 'static> Observer<T> for FnObserver<T> {
    async fn on_value(&self, value: &T) {
        (self.value_fn)(value);
    }

    async fn on_fault(&self, fault: &Fault) {
        match &self.fault_fn {
            Some(handler) => handler(fault),
            None => crate::sink::raise(fault),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Debug, thiserror::Error)]
    #[error("probe fault")]
    struct Probe;

    #[tokio::test]
    async fn test_fn_observer_forwards_values() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let observer = FnObserver::arc(move |v: &i64| sink.lock().unwrap().push(*v));
        observer.on_value(&7).await;
        observer.on_value(&8).await;
        assert_eq!(seen.lock().unwrap().as_slice(), [7, 8]);
    }

    #[tokio::test]
    async fn test_fault_handler_intercepts_faults() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let observer = Arc::new(
            FnObserver::new(|_: &i64| {})
                .with_fault(move |f| sink.lock().unwrap().push(f.to_string())),
        );
        let fault: Fault = Arc::new(Probe);
        observer.on_fault(&fault).await;
        assert_eq!(seen.lock().unwrap().as_slice(), ["probe fault"]);
    }
}
