//! # Shared stage plumbing.
//!
//! Every operator is the same machine wearing a different step:
//! - one or more upstreams, each watched through an [`Anchor`]-held observer
//!   keyed by source index,
//! - a per-instance critical section over operator state,
//! - a value-producing step that yields zero-or-one outputs per `(key, item)`.
//!
//! ## Architecture
//! ```text
//! upstream A ──► StageObserver(key=0) ──┐
//! upstream B ──► StageObserver(key=1) ──┼──► StageSink::accept(key, item)
//!                      │                │         │ (operator state, mutex)
//!                      │ target gone?   │         ▼
//!                      └─► anchor.release()   shell.core().publish(out)
//! ```
//!
//! ## Rules
//! - Upstreams are watched with `first_update`, so a stage starts from the
//!   sources' current state.
//! - A delivery that finds its stage gone unsubscribes the dangling
//!   registration on the spot.
//! - Dropping a stage (`StageShell`) releases its anchor, which unsubscribes
//!   every upstream registration it still owns.

use std::marker::PhantomData;
use std::sync::{Arc, OnceLock};

use async_trait::async_trait;

use crate::error::{Fault, StageError};
use crate::lifecycle::{sweeper, Anchor, AnchorControl};
use crate::observe::{
    LifecycleHook, Observable, ObservableValue, Observer, SubscribeOptions, Subscription,
};
use crate::value::{SourceCore, Value};

/// Downstream half of an operator: receives keyed upstream deliveries.
pub(crate) trait StageSink<I>: Send + Sync + 'static {
    fn accept(&self, key: usize, value: &I);
    fn accept_fault(&self, key: usize, fault: Fault);
}

/// Output core plus anchor wiring, embedded in every stage.
pub(crate) struct StageShell<O> {
    core: SourceCore<O>,
    anchor: OnceLock<Arc<dyn AnchorControl>>,
}

impl<O: Value> StageShell<O> {
    pub fn new() -> Self {
        Self {
            core: SourceCore::new(None),
            anchor: OnceLock::new(),
        }
    }

    pub fn core(&self) -> &SourceCore<O> {
        &self.core
    }

    /// Wires the stage's anchor: promote/demote on downstream transitions,
    /// sweeper registration, and release on drop.
    pub fn bind<S: Send + Sync + 'static>(&self, anchor: &Arc<Anchor<S>>) {
        let hook: Arc<dyn LifecycleHook> = anchor.clone();
        self.core.registry().set_hook(hook);
        let control: Arc<dyn AnchorControl> = anchor.clone();
        sweeper::register(Arc::downgrade(&control));
        let _ = self.anchor.set(control);
    }
}

impl<O> Drop for StageShell<O> {
    fn drop(&mut self) {
        if let Some(anchor) = self.anchor.get() {
            anchor.release();
        }
    }
}

/// Upstream observer owned by a stage's anchor.
struct StageObserver<I, S: Send + Sync + 'static> {
    anchor: Arc<Anchor<S>>,
    key: usize,
    _marker: PhantomData<fn(&I)>,
}

#[async_trait]
impl<I, S> Observer<I> for StageObserver<I, S>
where
    I: Value,
    S: StageSink<I>,
{
    async fn on_value(&self, value: &I) {
        match self.anchor.target() {
            Some(stage) => stage.accept(self.key, value),
            // The stage is gone; this registration is dangling.
            None => self.anchor.release(),
        }
    }

    async fn on_fault(&self, fault: &Fault) {
        match self.anchor.target() {
            Some(stage) => stage.accept_fault(self.key, Fault::clone(fault)),
            None => self.anchor.release(),
        }
    }

    fn on_subscribe(&self, subscription: &Subscription) {
        self.anchor.attach(subscription.clone());
    }
}

/// Subscribes a stage to one upstream through its anchor.
///
/// Fails with [`StageError::Reclaimed`] when the anchor's stage has already
/// been dropped — reusing a dead anchor is a programming error, not a no-op.
pub(crate) fn watch<I, S, U>(
    upstream: &U,
    anchor: &Arc<Anchor<S>>,
    key: usize,
) -> Result<Subscription, StageError>
where
    I: Value,
    S: StageSink<I>,
    U: Observable<I> + ?Sized,
{
    if anchor.target().is_none() {
        return Err(StageError::Reclaimed);
    }
    let observer: Arc<dyn Observer<I>> = Arc::new(StageObserver {
        anchor: Arc::clone(anchor),
        key,
        _marker: PhantomData,
    });
    Ok(upstream.subscribe_with(observer, SubscribeOptions::new().first_update()))
}

/// Access to a stage's shell, type-erased over the operator.
pub(crate) trait StageAccess<O>: Send + Sync {
    fn shell(&self) -> &StageShell<O>;
}

/// Handle to a derived pipeline stage.
///
/// Cheap to clone. The stage stays alive while any handle exists or while it
/// has at least one downstream subscriber; an unconsumed stage whose handles
/// are dropped is reclaimed and its upstream registrations removed.
pub struct Derived<O> {
    pub(crate) inner: Arc<dyn StageAccess<O>>,
}

impl<O> Clone for Derived<O> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<O: Value> Observable<O> for Derived<O> {
    fn subscribe_with(
        &self,
        observer: Arc<dyn Observer<O>>,
        options: SubscribeOptions,
    ) -> Subscription {
        self.inner.shell().core().subscribe_with(observer, options)
    }
}

impl<O: Value> ObservableValue<O> for Derived<O> {
    fn get(&self) -> Option<Arc<O>> {
        self.inner.shell().core().get()
    }
}
