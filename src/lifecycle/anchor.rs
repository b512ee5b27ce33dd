//! # Stage anchor: the weak/strong upstream relation.
//!
//! A derived stage subscribes upstream the moment it is constructed — before
//! anyone downstream cares. The upstream registration must not decide the
//! stage's lifetime by itself:
//!
//! - held strongly, an abandoned pipeline could never be reclaimed;
//! - held weakly, a live pipeline could be reclaimed out from under its
//!   subscribers.
//!
//! [`Anchor`] resolves this with a *relation plus a toggle*: a `Weak` lookup
//! of the stage, and a pin slot that holds a strong handle to the same stage
//! exactly while the stage has downstream subscribers.
//!
//! ## State machine
//! ```text
//! downstream 0→1  ──► promote: pin = Some(strong)   (stage outlives callers)
//! downstream 1→0  ──► demote:  pin = None           (stage dies with callers)
//! stage dropped   ──► release: unsubscribe every owned upstream registration
//! ```
//!
//! ## Rules
//! - Promote/demote are driven by the stage's own registry via
//!   [`LifecycleHook`]; they never run user code.
//! - `release` is idempotent and also runs from the background sweeper for
//!   anchors whose stage is already gone.

use std::sync::{Arc, Mutex, Weak};

use crate::observe::{LifecycleHook, Subscription};

/// Reaper-facing view of an anchor, type-erased over the stage type.
pub(crate) trait AnchorControl: LifecycleHook {
    /// True once the stage behind this anchor is gone.
    fn expired(&self) -> bool;
    /// Drops the pin and unsubscribes every owned upstream registration.
    fn release(&self);
}

/// Weak relation to a derived stage plus the strong pin toggle.
pub(crate) struct Anchor<S: Send + Sync + 'static> {
    target: Weak<S>,
    pin: Mutex<Option<Arc<S>>>,
    subscriptions: Mutex<Vec<Subscription>>,
}

impl<S: Send + Sync + 'static> Anchor<S> {
    pub fn new(target: &Arc<S>) -> Arc<Self> {
        Arc::new(Self {
            target: Arc::downgrade(target),
            pin: Mutex::new(None),
            subscriptions: Mutex::new(Vec::new()),
        })
    }

    /// Looks the stage up; `None` once it has been reclaimed.
    pub fn target(&self) -> Option<Arc<S>> {
        self.target.upgrade()
    }

    /// Records an upstream registration owned by this anchor.
    ///
    /// Registrations that already went inactive (connector reconnects) are
    /// pruned on the way in.
    pub fn attach(&self, subscription: Subscription) {
        let mut subs = self.subscriptions.lock().expect("anchor lock poisoned");
        subs.retain(Subscription::is_active);
        subs.push(subscription);
    }
}

impl<S: Send + Sync + 'static> LifecycleHook for Anchor<S> {
    fn first_added(&self) {
        let mut pin = self.pin.lock().expect("anchor lock poisoned");
        if pin.is_none() {
            *pin = self.target.upgrade();
        }
    }

    fn last_removed(&self) {
        // Bind before dropping: letting the pinned stage drop while the pin
        // lock is held would deadlock against the release() its teardown runs.
        let unpinned = self.pin.lock().expect("anchor lock poisoned").take();
        drop(unpinned);
    }
}

impl<S: Send + Sync + 'static> AnchorControl for Anchor<S> {
    fn expired(&self) -> bool {
        self.target.strong_count() == 0
    }

    fn release(&self) {
        let unpinned = self.pin.lock().expect("anchor lock poisoned").take();
        drop(unpinned);
        let drained: Vec<Subscription> = {
            let mut subs = self.subscriptions.lock().expect("anchor lock poisoned");
            subs.drain(..).collect()
        };
        for subscription in drained {
            subscription.unsubscribe();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observe::{FnObserver, Observable, SubscribeOptions};
    use crate::Property;

    #[tokio::test]
    async fn test_promote_pins_and_demote_unpins() {
        let stage = Arc::new(7_u8);
        let anchor = Anchor::new(&stage);
        let weak = Arc::downgrade(&stage);

        anchor.first_added();
        drop(stage);
        // Pinned: the anchor alone keeps the stage alive.
        assert!(weak.upgrade().is_some());
        assert!(!anchor.expired());

        anchor.last_removed();
        assert!(weak.upgrade().is_none());
        assert!(anchor.expired());
    }

    #[tokio::test]
    async fn test_release_unsubscribes_owned_registrations() {
        let stage = Arc::new(0_u8);
        let anchor = Anchor::new(&stage);

        let upstream: Property<i64> = Property::new();
        let subscription =
            upstream.subscribe_with(FnObserver::arc(|_: &i64| {}), SubscribeOptions::new());
        anchor.attach(subscription.clone());
        assert_eq!(upstream.core().registry().observer_count(), 1);

        anchor.release();
        assert!(!subscription.is_active());
        assert_eq!(upstream.core().registry().observer_count(), 0);

        // A second release is a no-op.
        anchor.release();
    }
}
