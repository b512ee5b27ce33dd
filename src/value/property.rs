//! # Settable observable value.
//!
//! [`Property`] is the producer-and-consumer cell: a mutable latest value
//! whose every mutation is atomic, returns a [`Transition`], and fans out to
//! subscribers off-thread.
//!
//! All mutators are defined in terms of [`Property::accumulate`]'s
//! compare-and-retry commit, so concurrent writers never lose updates.
//!
//! ## Example
//! ```rust
//! use liveprop::Property;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let temperature = Property::with_value(21.5_f64);
//! let t = temperature.set(22.0);
//! assert_eq!(t.old.as_deref(), Some(&21.5));
//! assert_eq!(*t.new, 22.0);
//! # }
//! ```

use std::sync::Arc;

use crate::error::Fault;
use crate::observe::{Observable, ObservableValue, Observer, SubscribeOptions, Subscription};
use crate::value::core::SourceCore;
use crate::value::{Transition, Value};

/// Settable observable value.
///
/// Cheap to clone; clones share the same cell and subscribers.
pub struct Property<T> {
    core: Arc<SourceCore<T>>,
}

impl<T> Clone for Property<T> {
    fn clone(&self) -> Self {
        Self {
            core: Arc::clone(&self.core),
        }
    }
}

impl<T: Value> Property<T> {
    /// Creates an uninitialized property (`get()` returns `None`).
    pub fn new() -> Self {
        Self {
            core: Arc::new(SourceCore::new(None)),
        }
    }

    /// Creates a property initialized with `value`.
    pub fn with_value(value: T) -> Self {
        Self {
            core: Arc::new(SourceCore::new(Some(Arc::new(value)))),
        }
    }

    /// Replaces the value and returns the transition.
    pub fn set(&self, value: T) -> Transition<T> {
        let value = Arc::new(value);
        self.core.accumulate(move |_| Arc::clone(&value))
    }

    /// Replaces the value and returns the previous one, if any.
    pub fn get_and_set(&self, value: T) -> Option<Arc<T>> {
        self.set(value).old
    }

    /// Computes the next value from the current one.
    ///
    /// `f` may run more than once when racing other writers; it must be a
    /// pure function of its input.
    pub fn update(&self, f: impl Fn(Option<&T>) -> T) -> Transition<T> {
        self.core.accumulate(move |current| Arc::new(f(current)))
    }

    /// Folds an update into the current value.
    ///
    /// Reads the current value, computes `f(current, &update)`, stores the
    /// result, and dispatches it; the commit is a compare-and-retry, so the
    /// returned [`Transition`] always reflects this logical update's true
    /// before/after pair.
    pub fn accumulate<U>(&self, update: U, f: impl Fn(Option<&T>, &U) -> T) -> Transition<T> {
        self.core
            .accumulate(move |current| Arc::new(f(current, &update)))
    }

    /// Dispatches a fault through this property's exception channel.
    pub fn raise(&self, fault: Fault) {
        self.core.raise(fault);
    }

    pub(crate) fn core(&self) -> &Arc<SourceCore<T>> {
        &self.core
    }
}

impl<T: Value> Default for Property<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Value> Observable<T> for Property<T> {
    fn subscribe_with(
        &self,
        observer: Arc<dyn Observer<T>>,
        options: SubscribeOptions,
    ) -> Subscription {
        self.core.subscribe_with(observer, options)
    }
}

impl<T: Value> ObservableValue<T> for Property<T> {
    fn get(&self) -> Option<Arc<T>> {
        self.core.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observe::FnObserver;
    use std::time::Duration;
    use tokio::sync::mpsc;

    fn channel_observer<T: Clone + Send + Sync + 'static>(
    ) -> (Arc<FnObserver<T>>, mpsc::UnboundedReceiver<T>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let observer = FnObserver::arc(move |v: &T| {
            let _ = tx.send(v.clone());
        });
        (observer, rx)
    }

    async fn recv<T>(rx: &mut mpsc::UnboundedReceiver<T>) -> T {
        tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("delivery timed out")
            .expect("delivery channel closed")
    }

    #[tokio::test]
    async fn test_set_and_get() {
        let prop = Property::new();
        assert!(prop.get().is_none());

        prop.set(5);
        assert_eq!(prop.get().as_deref(), Some(&5));

        let previous = prop.get_and_set(6);
        assert_eq!(previous.as_deref(), Some(&5));
        assert_eq!(prop.get().as_deref(), Some(&6));
    }

    #[tokio::test]
    async fn test_on_change_observer_sees_distinct_consecutive_subsequence() {
        let prop = Property::new();
        let (filtered, mut filtered_rx) = channel_observer();
        let (all, mut all_rx) = channel_observer();
        prop.subscribe_with(filtered, SubscribeOptions::new().on_change());
        prop.subscribe(all);

        for v in [1, 1, 2, 2, 2, 3, 1] {
            prop.set(v);
        }

        for expected in [1, 2, 3, 1] {
            assert_eq!(recv(&mut filtered_rx).await, expected);
        }
        for expected in [1, 1, 2, 2, 2, 3, 1] {
            assert_eq!(recv(&mut all_rx).await, expected);
        }
    }

    #[tokio::test]
    async fn test_first_update_replays_before_later_sets() {
        let prop = Property::with_value(10);
        let (observer, mut rx) = channel_observer();
        prop.subscribe_with(observer, SubscribeOptions::new().first_update());
        prop.set(11);

        assert_eq!(recv(&mut rx).await, 10);
        assert_eq!(recv(&mut rx).await, 11);
    }

    #[tokio::test]
    async fn test_first_update_on_uninitialized_property_replays_nothing() {
        let prop = Property::new();
        let (observer, mut rx) = channel_observer();
        prop.subscribe_with(observer, SubscribeOptions::new().first_update());
        prop.set(1);
        assert_eq!(recv(&mut rx).await, 1);
    }

    #[test]
    fn test_concurrent_accumulate_is_linearizable() {
        const WRITERS: usize = 8;
        const PER_WRITER: i64 = 200;

        let prop: Property<i64> = Property::with_value(0);
        let mut handles = Vec::new();
        for _ in 0..WRITERS {
            let prop = prop.clone();
            handles.push(std::thread::spawn(move || {
                for _ in 0..PER_WRITER {
                    let t = prop.accumulate(1, |old, update| old.copied().unwrap_or(0) + update);
                    // Every transition is a true before/after pair.
                    assert_eq!(*t.new, t.old.as_deref().copied().unwrap_or(0) + 1);
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(prop.get().as_deref(), Some(&(WRITERS as i64 * PER_WRITER)));
    }

    #[tokio::test]
    async fn test_update_folds_current_value() {
        let prop = Property::with_value(String::from("a"));
        prop.update(|current| format!("{}b", current.unwrap()));
        assert_eq!(prop.get().unwrap().as_str(), "ab");
    }
}
