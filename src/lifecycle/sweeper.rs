//! # Background anchor sweeper.
//!
//! Stages normally tear their upstream registrations down in `Drop`, and a
//! delivery that finds its stage gone unsubscribes on the spot. The sweeper
//! is the third line: a process-wide task that periodically reaps anchors
//! whose stage is gone, bounding the delay between "stage reclaimed" and
//! "upstream registry entry removed" even for sources that never dispatch.
//!
//! ## Rules
//! - One task per process, started lazily on the first registration made
//!   inside a Tokio runtime; registrations made outside a runtime are kept
//!   and picked up once a later registration starts the task.
//! - The sweeper holds anchors weakly; it never extends a pipeline's life.
//! - A plain Tokio task: it never blocks process exit.

use std::sync::{Arc, Mutex, OnceLock, Weak};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::lifecycle::anchor::AnchorControl;

/// Delay between sweep passes.
pub(crate) const SWEEP_INTERVAL: Duration = Duration::from_millis(250);

struct Sweeper {
    anchors: Mutex<Vec<Weak<dyn AnchorControl>>>,
    running: AtomicBool,
}

fn sweeper() -> &'static Sweeper {
    static SWEEPER: OnceLock<Sweeper> = OnceLock::new();
    SWEEPER.get_or_init(|| Sweeper {
        anchors: Mutex::new(Vec::new()),
        running: AtomicBool::new(false),
    })
}

/// Adds an anchor to the sweep list and lazily starts the sweep task.
pub(crate) fn register(anchor: Weak<dyn AnchorControl>) {
    sweeper()
        .anchors
        .lock()
        .expect("sweeper lock poisoned")
        .push(anchor);
    ensure_running();
}

/// Starts the sweep task if none is alive and a runtime is available.
///
/// The task dies with the runtime that hosted it; the next registration made
/// inside a live runtime starts a fresh one.
pub(crate) fn ensure_running() {
    let sweeper = sweeper();
    if sweeper.running.load(Ordering::Acquire) {
        return;
    }
    // Only a runtime thread can host the sweep task.
    if tokio::runtime::Handle::try_current().is_err() {
        return;
    }
    if sweeper.running.swap(true, Ordering::AcqRel) {
        return;
    }
    tokio::spawn(async move {
        // Reset `running` when the hosting runtime shuts down, so a later
        // registration can restart the task elsewhere.
        struct ResetOnDrop;
        impl Drop for ResetOnDrop {
            fn drop(&mut self) {
                self::sweeper().running.store(false, Ordering::Release);
            }
        }
        let _reset = ResetOnDrop;

        let mut ticker = tokio::time::interval(SWEEP_INTERVAL);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            sweep_now();
        }
    });
}

/// Runs one sweep pass; returns how many anchors were reaped.
///
/// Exposed for tests; the background task calls this on every tick.
pub(crate) fn sweep_now() -> usize {
    let mut reaped: Vec<Arc<dyn AnchorControl>> = Vec::new();
    {
        let mut anchors = sweeper().anchors.lock().expect("sweeper lock poisoned");
        anchors.retain(|weak| match weak.upgrade() {
            None => false,
            Some(anchor) => {
                if anchor.expired() {
                    reaped.push(anchor);
                    false
                } else {
                    true
                }
            }
        });
    }
    let count = reaped.len();
    for anchor in reaped {
        anchor.release();
    }
    if count > 0 {
        log::trace!("sweeper reaped {count} expired stage anchor(s)");
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::anchor::Anchor;
    use crate::observe::{FnObserver, Observable, SubscribeOptions};
    use crate::Property;

    #[tokio::test]
    async fn test_sweep_reaps_expired_anchors_and_their_registrations() {
        let upstream: Property<i64> = Property::new();
        let stage = Arc::new(1_u8);
        let anchor = Anchor::new(&stage);

        let subscription =
            upstream.subscribe_with(FnObserver::arc(|_: &i64| {}), SubscribeOptions::new());
        anchor.attach(subscription);
        let control: Arc<dyn AnchorControl> = anchor.clone();
        let erased: Weak<dyn AnchorControl> = Arc::downgrade(&control);
        register(erased);

        // Stage alive: sweeping must not touch the registration.
        sweep_now();
        assert_eq!(upstream.core().registry().observer_count(), 1);

        drop(stage);
        sweep_now();
        assert_eq!(upstream.core().registry().observer_count(), 0);
    }

    #[tokio::test]
    async fn test_background_task_reaps_without_explicit_sweeps() {
        let upstream: Property<i64> = Property::new();
        let stage = Arc::new(2_u8);
        let anchor = Anchor::new(&stage);

        let subscription =
            upstream.subscribe_with(FnObserver::arc(|_: &i64| {}), SubscribeOptions::new());
        anchor.attach(subscription);
        let control: Arc<dyn AnchorControl> = anchor.clone();
        let erased: Weak<dyn AnchorControl> = Arc::downgrade(&control);
        register(erased);
        drop(stage);

        for _ in 0..40 {
            if upstream.core().registry().observer_count() == 0 {
                return;
            }
            // Another test's runtime may have hosted (and taken down) the
            // sweep task; make sure one is alive here.
            ensure_running();
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        panic!("sweeper task never reaped the expired anchor");
    }
}
