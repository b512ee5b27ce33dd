//! # Shared source internals.
//!
//! [`SourceCore`] bundles the latest-value cache with the observer registry.
//! Properties, dispatchers, derived stages, and connectors are all thin
//! shells over one core; what differs is who is allowed to push into it.
//!
//! ## Rules
//! - A committed update dispatches with its `changed` flag so `on_change`
//!   entries can be filtered at enqueue time.
//! - `first_update` replays read the cell under the registry lock, which
//!   orders the replay before any later dispatched update.

use std::sync::Arc;

use crate::error::Fault;
use crate::observe::{Observer, Registry, SubscribeOptions, Subscription};
use crate::value::cell::ValueCell;
use crate::value::{Transition, Value};

pub(crate) struct SourceCore<T> {
    cell: ValueCell<T>,
    registry: Registry<T>,
}

impl<T: Value> SourceCore<T> {
    pub fn new(initial: Option<Arc<T>>) -> Self {
        Self {
            cell: ValueCell::new(initial),
            registry: Registry::new(),
        }
    }

    pub fn registry(&self) -> &Registry<T> {
        &self.registry
    }

    pub fn get(&self) -> Option<Arc<T>> {
        self.cell.get()
    }

    pub fn subscribe_with(
        &self,
        observer: Arc<dyn Observer<T>>,
        options: SubscribeOptions,
    ) -> Subscription {
        self.registry
            .subscribe(observer, options, || self.cell.get())
    }

    /// Atomically accumulates a new value and dispatches the result.
    pub fn accumulate(&self, f: impl Fn(Option<&T>) -> Arc<T>) -> Transition<T> {
        let transition = self.cell.accumulate(f);
        self.registry
            .dispatch_value(transition.changed(), Arc::clone(&transition.new));
        transition
    }

    /// Stores a produced value unconditionally and dispatches it.
    pub fn publish(&self, value: T) -> Transition<T> {
        let value = Arc::new(value);
        self.accumulate(move |_| Arc::clone(&value))
    }

    /// Dispatches a fault through this source's exception channel.
    pub fn raise(&self, fault: Fault) {
        self.registry.dispatch_fault(fault);
    }
}
