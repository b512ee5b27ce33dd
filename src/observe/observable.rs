//! # Observable traits.
//!
//! [`Observable`] is the object-safe subscription surface; [`ObservableValue`]
//! adds synchronous access to the cached latest value; [`ObservableExt`] is a
//! blanket extension trait carrying the generic combinators, the same split
//! `futures` uses for `Stream`/`StreamExt`.

use std::sync::Arc;
use std::time::Duration;

use crate::observe::{Observer, SubscribeOptions, Subscription};
use crate::operators::{self, Derived};
use crate::value::Value;

/// A subscribable source of values over time.
pub trait Observable<T: Value>: Send + Sync {
    /// Registers an observer with explicit options.
    ///
    /// The registration is established synchronously; `on_subscribe` has
    /// fired by the time this returns. Deliveries run off the calling thread.
    fn subscribe_with(
        &self,
        observer: Arc<dyn Observer<T>>,
        options: SubscribeOptions,
    ) -> Subscription;

    /// Registers an observer with the default option set.
    fn subscribe(&self, observer: Arc<dyn Observer<T>>) -> Subscription {
        self.subscribe_with(observer, SubscribeOptions::default())
    }
}

/// An [`Observable`] that caches its latest value.
pub trait ObservableValue<T: Value>: Observable<T> {
    /// Returns the cached latest value, or `None` while uninitialized.
    fn get(&self) -> Option<Arc<T>>;
}

/// Combinators available on every observable.
///
/// Each combinator creates a derived stage that subscribes upstream
/// immediately and stays collectible while nothing downstream consumes it
/// (see the crate-level lifecycle notes).
pub trait ObservableExt<T: Value>: Observable<T> {
    /// Partial mapping: emits `f(item)` when present, nothing when absent.
    fn derive<O, F>(&self, f: F) -> Derived<O>
    where
        O: Value,
        F: Fn(&T) -> Option<O> + Send + Sync + 'static,
        Self: Sized,
    {
        operators::derive(self, f)
    }

    /// Emits `f(item)` for every upstream item.
    fn map<O, F>(&self, f: F) -> Derived<O>
    where
        O: Value,
        F: Fn(&T) -> O + Send + Sync + 'static,
        Self: Sized,
    {
        self.derive(move |item| Some(f(item)))
    }

    /// Emits only items satisfying the predicate.
    fn filter<F>(&self, predicate: F) -> Derived<T>
    where
        T: Clone,
        F: Fn(&T) -> bool + Send + Sync + 'static,
        Self: Sized,
    {
        self.derive(move |item| predicate(item).then(|| item.clone()))
    }

    /// Emits only values that survive `window` without being superseded.
    ///
    /// Upstream faults bypass the window and are delivered immediately.
    fn debounce(&self, window: Duration) -> Derived<T>
    where
        T: Clone,
        Self: Sized,
    {
        operators::debounce(self, window)
    }

    /// Sliding window of the most recent `capacity` items, emitted as a
    /// snapshot on every update.
    fn buffer(&self, capacity: usize) -> Derived<Vec<T>>
    where
        T: Clone,
        Self: Sized,
    {
        operators::buffer(self, capacity)
    }
}

impl<T: Value, S: Observable<T> + ?Sized> ObservableExt<T> for S {}
