//! # Reconnectable upstream binding.
//!
//! [`Connector`] wraps a *supplier* of upstream observables behind a
//! two-state machine. `connect()` subscribes to a freshly supplied upstream
//! (disconnecting any prior one first); `disconnect()` unsubscribes. The
//! state is itself exposed as a [`Property`], so external logic can drive
//! the connection lifecycle declaratively.
//!
//! ## State machine
//! ```text
//!                 connect()
//! DISCONNECTED ───────────────► CONNECTED ──┐
//!      ▲                            │       │ connect() (resupply:
//!      └────────────────────────────┘       │ disconnect, then connect)
//!               disconnect()        ◄───────┘
//! ```
//!
//! ## Rules
//! - `disconnect()` while disconnected and `connect()` while connected are
//!   defined no-throw operations, guarded by a per-instance lock.
//! - Values and faults relay only from the currently connected upstream.

use std::sync::{Arc, Mutex, OnceLock};

use crate::error::Fault;
use crate::lifecycle::Anchor;
use crate::observe::{Observable, ObservableValue, Observer, SubscribeOptions, Subscription};
use crate::operators::stage::{watch, StageShell, StageSink};
use crate::value::{Property, Value};

/// Connection state, observable through [`Connector::state`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectorState {
    Disconnected,
    Connected,
}

struct Link<T: Value> {
    /// Keeps the supplied upstream alive while connected.
    #[allow(dead_code)]
    upstream: Arc<dyn Observable<T>>,
    subscription: Subscription,
}

pub(crate) struct ConnectorInner<T: Value> {
    shell: StageShell<T>,
    supplier: Box<dyn Fn() -> Arc<dyn Observable<T>> + Send + Sync>,
    link: Mutex<Option<Link<T>>>,
    state: Property<ConnectorState>,
    anchor: OnceLock<Arc<Anchor<ConnectorInner<T>>>>,
}

impl<T: Value + Clone> StageSink<T> for ConnectorInner<T> {
    fn accept(&self, _key: usize, value: &T) {
        self.shell.core().publish(value.clone());
    }

    fn accept_fault(&self, _key: usize, fault: Fault) {
        self.shell.core().raise(fault);
    }
}

/// Reconnectable relay over a supplier of upstream observables.
///
/// Cheap to clone; clones share the connection and the subscribers.
pub struct Connector<T: Value> {
    inner: Arc<ConnectorInner<T>>,
}

impl<T: Value> Clone for Connector<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Value + Clone> Connector<T> {
    /// Creates a disconnected connector over `supplier`.
    ///
    /// Nothing is subscribed until [`Connector::connect`] runs.
    pub fn new(supplier: impl Fn() -> Arc<dyn Observable<T>> + Send + Sync + 'static) -> Self {
        let inner = Arc::new(ConnectorInner {
            shell: StageShell::new(),
            supplier: Box::new(supplier),
            link: Mutex::new(None),
            state: Property::with_value(ConnectorState::Disconnected),
            anchor: OnceLock::new(),
        });
        let anchor = Anchor::new(&inner);
        inner.shell.bind(&anchor);
        let _ = inner.anchor.set(anchor);
        Self { inner }
    }

    /// Subscribes to a freshly supplied upstream.
    ///
    /// An existing connection is disconnected first, so calling this while
    /// connected is a resupply, not an error.
    pub fn connect(&self) {
        let mut link = self.inner.link.lock().expect("connector lock poisoned");
        if let Some(previous) = link.take() {
            previous.subscription.unsubscribe();
            self.inner.state.set(ConnectorState::Disconnected);
        }
        let upstream = (self.inner.supplier)();
        let anchor = self.inner.anchor.get().expect("anchor wired at construction");
        let subscription = watch(upstream.as_ref(), anchor, 0)
            .expect("connector inner is alive while a handle exists");
        *link = Some(Link {
            upstream,
            subscription,
        });
        self.inner.state.set(ConnectorState::Connected);
    }

    /// Unsubscribes from the current upstream, if any.
    pub fn disconnect(&self) {
        let mut link = self.inner.link.lock().expect("connector lock poisoned");
        if let Some(previous) = link.take() {
            previous.subscription.unsubscribe();
            self.inner.state.set(ConnectorState::Disconnected);
        }
    }

    /// The connection state as an observable property.
    pub fn state(&self) -> Property<ConnectorState> {
        self.inner.state.clone()
    }

    /// Returns true while connected.
    pub fn is_connected(&self) -> bool {
        self.inner.state.get().as_deref() == Some(&ConnectorState::Connected)
    }
}

impl<T: Value> Observable<T> for Connector<T> {
    fn subscribe_with(
        &self,
        observer: Arc<dyn Observer<T>>,
        options: SubscribeOptions,
    ) -> Subscription {
        self.inner.shell.core().subscribe_with(observer, options)
    }
}

impl<T: Value> ObservableValue<T> for Connector<T> {
    fn get(&self) -> Option<Arc<T>> {
        self.inner.shell.core().get()
    }
}
