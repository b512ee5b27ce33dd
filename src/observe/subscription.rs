//! # Subscription handle.
//!
//! A [`Subscription`] ties an observer registration to its registry through a
//! *weak* back-reference: holding a dangling subscription never keeps a dead
//! observable alive.
//!
//! ## Rules
//! - `unsubscribe()` is idempotent; only the first call removes the entry.
//! - `on_unsubscribe` fires exactly once, on the subscribed→unsubscribed
//!   transition, regardless of who triggers the removal.
//! - Clones share state: unsubscribing through any clone deactivates all.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

/// Registry-side removal capability, type-erased so subscriptions do not
/// carry the observable's value type.
pub(crate) trait Unsubscriber: Send + Sync {
    fn remove_entry(&self, key: usize);
}

struct SubscriptionInner {
    registry: Weak<dyn Unsubscriber>,
    key: usize,
    active: AtomicBool,
}

/// Handle to one observer registration.
#[derive(Clone)]
pub struct Subscription {
    inner: Arc<SubscriptionInner>,
}

impl Subscription {
    pub(crate) fn new(registry: Weak<dyn Unsubscriber>, key: usize) -> Self {
        Self {
            inner: Arc::new(SubscriptionInner {
                registry,
                key,
                active: AtomicBool::new(true),
            }),
        }
    }

    /// Removes the registration.
    ///
    /// A second call is a no-op; removal also becomes a no-op once the owning
    /// observable has been dropped.
    pub fn unsubscribe(&self) {
        if let Some(registry) = self.inner.registry.upgrade() {
            registry.remove_entry(self.inner.key);
        } else {
            self.inner.active.store(false, Ordering::Release);
        }
    }

    /// Returns true while the registration is present in its registry.
    pub fn is_active(&self) -> bool {
        self.inner.active.load(Ordering::Acquire) && self.inner.registry.strong_count() > 0
    }

    /// Marks the handle inactive. Called by the registry when the entry is
    /// actually removed, so all clones observe the transition.
    pub(crate) fn mark_inactive(&self) {
        self.inner.active.store(false, Ordering::Release);
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("key", &self.inner.key)
            .field("active", &self.is_active())
            .finish()
    }
}
