//! # Process-wide unhandled-fault sink.
//!
//! Every fault raised through an observable terminates either in an observer
//! that handles it or here — never nowhere. The sink is a single process-wide
//! handler, replaceable at any time, with a best-effort log-and-continue
//! default.
//!
//! ## Rules
//! - [`raise`] never panics: a panicking sink is caught and logged.
//! - [`set`] replaces the handler for the whole process; [`reset`] restores
//!   the default.
//! - Replacement is safe under concurrent raisers.

use std::panic::AssertUnwindSafe;
use std::sync::{Arc, OnceLock, RwLock};

use crate::error::Fault;

type SinkFn = dyn Fn(&Fault) + Send + Sync;

fn slot() -> &'static RwLock<Arc<SinkFn>> {
    static SLOT: OnceLock<RwLock<Arc<SinkFn>>> = OnceLock::new();
    SLOT.get_or_init(|| RwLock::new(Arc::new(default_sink)))
}

fn default_sink(fault: &Fault) {
    log::error!("unhandled fault: {fault}");
}

/// Replaces the process-wide fault sink.
pub fn set(sink: impl Fn(&Fault) + Send + Sync + 'static) {
    *slot().write().expect("fault sink lock poisoned") = Arc::new(sink);
}

/// Restores the default log-and-continue sink.
pub fn reset() {
    *slot().write().expect("fault sink lock poisoned") = Arc::new(default_sink);
}

/// Hands a fault to the process-wide sink.
///
/// Used by the dispatch engine for faults that no observer handles. Safe to
/// call from any thread; a panic inside the sink itself is swallowed after
/// being logged, so raising can never poison a delivery worker.
pub fn raise(fault: &Fault) {
    let sink = {
        let guard = slot().read().expect("fault sink lock poisoned");
        Arc::clone(&guard)
    };
    if std::panic::catch_unwind(AssertUnwindSafe(|| sink(fault))).is_err() {
        log::error!("fault sink panicked while handling: {fault}");
    }
}

/// Serializes tests that replace the process-wide sink.
///
/// The sink is global state; concurrent tests would observe each other's
/// handlers without this.
#[cfg(test)]
pub(crate) fn test_guard() -> std::sync::MutexGuard<'static, ()> {
    static GUARD: OnceLock<std::sync::Mutex<()>> = OnceLock::new();
    GUARD
        .get_or_init(|| std::sync::Mutex::new(()))
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Debug, thiserror::Error)]
    #[error("synthetic fault")]
    struct Synthetic;

    #[test]
    fn test_replaced_sink_receives_faults_and_reset_restores_default() {
        let _guard = test_guard();
        let seen: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let captured = Arc::clone(&seen);
        set(move |fault| captured.lock().unwrap().push(fault.to_string()));

        let fault: Fault = Arc::new(Synthetic);
        raise(&fault);
        assert_eq!(seen.lock().unwrap().as_slice(), ["synthetic fault"]);

        reset();
        raise(&fault);
        // Default sink only logs; the capture list must not grow further.
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_panicking_sink_does_not_poison_raise() {
        let _guard = test_guard();
        set(|_| panic!("sink blew up"));
        let fault: Fault = Arc::new(Synthetic);
        raise(&fault);
        reset();
    }
}
