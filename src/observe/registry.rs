//! # Observer registry and dispatch engine.
//!
//! Keeps the registered observers of one observable and fans dispatched
//! values/faults out to them without blocking the producer.
//!
//! ## Architecture
//! ```text
//! dispatch_value / dispatch_fault
//!     │ (enqueue under the registry lock, never user code)
//!     ├──► [queue 1] ──► worker 1 ──► observer1.on_value()
//!     │    (unbounded)       └──────► panic → observer1.on_fault() → sink
//!     ├──► [queue 2] ──► worker 2 ──► observer2.on_value()
//!     └──► [queue N] ──► worker N ──► observerN.on_value()
//! ```
//!
//! ## Rules
//! - **Identity-keyed**: entries are keyed by the observer allocation;
//!   re-subscribing the same observer overwrites its option set harmlessly.
//! - **Per-observer FIFO**: enqueueing happens under the registry lock, so a
//!   `first_update` replay enqueued at subscribe time precedes every later
//!   dispatched update for that observer.
//! - **No cross-observer ordering**: observer A may process update N while B
//!   still processes N-5.
//! - **Isolation**: a slow or panicking observer affects only its own queue.
//! - **Weak entries**: a failed upgrade at delivery time removes the entry.
//! - Removing an unknown observer is a no-op.
//!
//! ## Lifecycle hooks
//! The 0→1 and 1→0 entry-count transitions invoke an optional
//! [`LifecycleHook`]; derived stages use it to promote/demote their upstream
//! anchor.

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, Weak};

use futures::FutureExt;
use tokio::sync::mpsc;

use crate::error::{self, Fault};
use crate::observe::subscription::Unsubscriber;
use crate::observe::{Observer, SubscribeOptions, Subscription};

/// Hook invoked on entry-count transitions, under the registry lock so
/// edges arrive in transition order. Implementations must not call back
/// into the same registry.
pub(crate) trait LifecycleHook: Send + Sync {
    /// The registry went from zero entries to one.
    fn first_added(&self);
    /// The registry went from one entry to zero.
    fn last_removed(&self);
}

/// One queued delivery for a single observer.
enum Delivery<T> {
    Value(Arc<T>),
    Fault(Fault),
}

/// Strong or weak handle to a registered observer.
pub(crate) enum ObserverRef<T> {
    Strong(Arc<dyn Observer<T>>),
    Weak(Weak<dyn Observer<T>>),
}

impl<T> Clone for ObserverRef<T> {
    fn clone(&self) -> Self {
        match self {
            ObserverRef::Strong(observer) => ObserverRef::Strong(Arc::clone(observer)),
            ObserverRef::Weak(observer) => ObserverRef::Weak(Weak::clone(observer)),
        }
    }
}

impl<T> ObserverRef<T> {
    /// Identity key: the observer allocation's data pointer.
    fn key(&self) -> usize {
        match self {
            ObserverRef::Strong(observer) => Arc::as_ptr(observer) as *const () as usize,
            ObserverRef::Weak(observer) => Weak::as_ptr(observer) as *const () as usize,
        }
    }

    fn resolve(&self) -> Option<Arc<dyn Observer<T>>> {
        match self {
            ObserverRef::Strong(observer) => Some(Arc::clone(observer)),
            ObserverRef::Weak(observer) => observer.upgrade(),
        }
    }
}

struct Entry<T> {
    observer: ObserverRef<T>,
    options: SubscribeOptions,
    tx: mpsc::UnboundedSender<Delivery<T>>,
    subscription: Subscription,
}

pub(crate) struct RegistryInner<T> {
    entries: Mutex<HashMap<usize, Entry<T>>>,
    hook: Mutex<Option<Arc<dyn LifecycleHook>>>,
}

/// Observer bookkeeping and dispatch for one observable instance.
pub(crate) struct Registry<T> {
    inner: Arc<RegistryInner<T>>,
}

impl<T: Send + Sync + 'static> Registry<T> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                entries: Mutex::new(HashMap::new()),
                hook: Mutex::new(None),
            }),
        }
    }

    /// Registers an observer and spawns its delivery worker.
    ///
    /// `replay` is evaluated under the registry lock when the options request
    /// a `first_update`; the replayed value is queued ahead of any update
    /// dispatched afterwards. `on_subscribe` fires synchronously before this
    /// returns.
    ///
    /// Must be called within a Tokio runtime (the worker task is spawned
    /// here).
    pub fn subscribe(
        &self,
        observer: Arc<dyn Observer<T>>,
        options: SubscribeOptions,
        replay: impl FnOnce() -> Option<Arc<T>>,
    ) -> Subscription {
        let observer_ref = if options.weak {
            ObserverRef::Weak(Arc::downgrade(&observer))
        } else {
            ObserverRef::Strong(Arc::clone(&observer))
        };
        let key = observer_ref.key();

        let mut worker_rx = None;
        let subscription = {
            let mut entries = self.inner.entries.lock().expect("registry lock poisoned");
            match entries.get_mut(&key) {
                Some(existing) => {
                    existing.options = options;
                    if options.first_update {
                        if let Some(value) = replay() {
                            let _ = existing.tx.send(Delivery::Value(value));
                        }
                    }
                    existing.subscription.clone()
                }
                None => {
                    let (tx, rx) = mpsc::unbounded_channel();
                    let inner: Arc<dyn Unsubscriber> = self.inner.clone();
                    let registry: Weak<dyn Unsubscriber> = Arc::downgrade(&inner);
                    let subscription = Subscription::new(registry, key);
                    if options.first_update {
                        if let Some(value) = replay() {
                            let _ = tx.send(Delivery::Value(value));
                        }
                    }
                    let became_first = entries.is_empty();
                    entries.insert(
                        key,
                        Entry {
                            observer: observer_ref.clone(),
                            options,
                            tx,
                            subscription: subscription.clone(),
                        },
                    );
                    // Fired while the map lock is held, so promote/demote
                    // edges reach the hook in transition order.
                    if became_first {
                        if let Some(hook) = self.hook() {
                            hook.first_added();
                        }
                    }
                    worker_rx = Some(rx);
                    subscription
                }
            }
        };

        if let Some(rx) = worker_rx {
            spawn_worker(rx, observer_ref, Arc::downgrade(&self.inner), key);
        }
        observer.on_subscribe(&subscription);
        subscription
    }

    /// Queues a value for every matching observer.
    ///
    /// `changed` is the producer's old-vs-new value comparison: when false,
    /// `on_change` entries are skipped and everyone else still receives the
    /// update.
    pub fn dispatch_value(&self, changed: bool, value: Arc<T>) {
        let entries = self.inner.entries.lock().expect("registry lock poisoned");
        for entry in entries.values() {
            if entry.options.on_change && !changed {
                continue;
            }
            let _ = entry.tx.send(Delivery::Value(Arc::clone(&value)));
        }
    }

    /// Queues a fault for every observer, or hands it to the process-wide
    /// sink when nobody is registered to receive it.
    pub fn dispatch_fault(&self, fault: Fault) {
        let delivered = {
            let entries = self.inner.entries.lock().expect("registry lock poisoned");
            for entry in entries.values() {
                let _ = entry.tx.send(Delivery::Fault(Fault::clone(&fault)));
            }
            !entries.is_empty()
        };
        if !delivered {
            crate::sink::raise(&fault);
        }
    }

    /// Installs the lifecycle hook consulted on 0→1 / 1→0 transitions.
    pub fn set_hook(&self, hook: Arc<dyn LifecycleHook>) {
        *self.inner.hook.lock().expect("registry lock poisoned") = Some(hook);
    }

    fn hook(&self) -> Option<Arc<dyn LifecycleHook>> {
        self.inner.hook.lock().expect("registry lock poisoned").clone()
    }

    /// Number of registered observers.
    pub fn observer_count(&self) -> usize {
        self.inner.entries.lock().expect("registry lock poisoned").len()
    }
}

impl<T: Send + Sync + 'static> Unsubscriber for RegistryInner<T> {
    fn remove_entry(&self, key: usize) {
        let removed = {
            let mut entries = self.entries.lock().expect("registry lock poisoned");
            let removed = entries.remove(&key);
            // Fired while the map lock is held, so promote/demote edges
            // reach the hook in transition order.
            if removed.is_some() && entries.is_empty() {
                let hook = self.hook.lock().expect("registry lock poisoned").clone();
                if let Some(hook) = hook {
                    hook.last_removed();
                }
            }
            removed
        };
        let Some(entry) = removed else {
            return;
        };
        entry.subscription.mark_inactive();
        if let Some(observer) = entry.observer.resolve() {
            observer.on_unsubscribe(&entry.subscription);
        }
    }
}

/// Spawns the per-observer delivery worker.
///
/// The worker drains the entry's queue in FIFO order. A weak observer that
/// fails to upgrade removes its own registration and exits.
fn spawn_worker<T: Send + Sync + 'static>(
    mut rx: mpsc::UnboundedReceiver<Delivery<T>>,
    observer: ObserverRef<T>,
    registry: Weak<RegistryInner<T>>,
    key: usize,
) {
    tokio::spawn(async move {
        while let Some(delivery) = rx.recv().await {
            let Some(target) = observer.resolve() else {
                if let Some(registry) = registry.upgrade() {
                    registry.remove_entry(key);
                }
                break;
            };
            deliver(target.as_ref(), delivery).await;
        }
    });
}

async fn deliver<T: 'static>(observer: &dyn Observer<T>, delivery: Delivery<T>) {
    match delivery {
        Delivery::Value(value) => {
            let fut = observer.on_value(value.as_ref());
            if let Err(payload) = AssertUnwindSafe(fut).catch_unwind().await {
                let fault = error::panic_fault(payload);
                route_fault(observer, &fault).await;
            }
        }
        Delivery::Fault(fault) => route_fault(observer, &fault).await,
    }
}

/// Routes a fault to the observer's `on_fault`; a panic in the handler
/// itself falls through to the process-wide sink.
async fn route_fault<T: 'static>(observer: &dyn Observer<T>, fault: &Fault) {
    let fut = observer.on_fault(fault);
    if AssertUnwindSafe(fut).catch_unwind().await.is_err() {
        crate::sink::raise(fault);
    }
}
