//! # Source-facing observable value.
//!
//! [`Dispatcher`] is the producer counterpart of [`Property`](crate::Property):
//! instead of being *set* like a cell, it *dispatches* values and faults on
//! behalf of a source that is not a simple settable value (a poller, a
//! device driver, a protocol decoder). It still caches the last dispatched
//! value, so it is a full [`ObservableValue`].

use std::sync::Arc;

use crate::error::Fault;
use crate::observe::{Observable, ObservableValue, Observer, SubscribeOptions, Subscription};
use crate::value::core::SourceCore;
use crate::value::{Transition, Value};

/// Producer-facing observable value.
///
/// Cheap to clone; clones share the same cache and subscribers.
pub struct Dispatcher<T> {
    core: Arc<SourceCore<T>>,
}

impl<T> Clone for Dispatcher<T> {
    fn clone(&self) -> Self {
        Self {
            core: Arc::clone(&self.core),
        }
    }
}

impl<T: Value> Dispatcher<T> {
    /// Creates a dispatcher with no cached value.
    pub fn new() -> Self {
        Self {
            core: Arc::new(SourceCore::new(None)),
        }
    }

    /// Caches and dispatches a value produced by the source.
    ///
    /// Equal consecutive values are still delivered to every subscriber that
    /// did not opt into `on_change`.
    pub fn dispatch_value(&self, value: T) -> Transition<T> {
        self.core.publish(value)
    }

    /// Dispatches a fault raised by the source.
    ///
    /// With no subscriber registered, the fault goes straight to the
    /// process-wide sink.
    pub fn dispatch_fault(&self, fault: Fault) {
        self.core.raise(fault);
    }

    pub(crate) fn core(&self) -> &Arc<SourceCore<T>> {
        &self.core
    }
}

impl<T: Value> Default for Dispatcher<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Value> Observable<T> for Dispatcher<T> {
    fn subscribe_with(
        &self,
        observer: Arc<dyn Observer<T>>,
        options: SubscribeOptions,
    ) -> Subscription {
        self.core.subscribe_with(observer, options)
    }
}

impl<T: Value> ObservableValue<T> for Dispatcher<T> {
    fn get(&self) -> Option<Arc<T>> {
        self.core.get()
    }
}
