//! # Debounce: emit only values that survive the window.
//!
//! Each upstream value supersedes any emission still waiting in the window;
//! only a value left undisturbed for the full window is delivered. Faults
//! bypass the window and are forwarded immediately.
//!
//! The per-instance scheduling resource is a generation counter plus one
//! short-lived timer task per update; a timer whose generation has been
//! superseded emits nothing. Timer tasks hold the stage weakly, so a dying
//! pipeline is never kept alive by an in-flight window.

use std::sync::{Arc, Mutex, OnceLock, Weak};
use std::time::Duration;

use crate::error::Fault;
use crate::lifecycle::Anchor;
use crate::observe::Observable;
use crate::operators::stage::{watch, Derived, StageAccess, StageShell, StageSink};
use crate::value::Value;

struct DebounceState<T> {
    latest: Option<T>,
    generation: u64,
}

pub(crate) struct DebounceStage<T> {
    shell: StageShell<T>,
    window: Duration,
    state: Mutex<DebounceState<T>>,
    weak_self: OnceLock<Weak<DebounceStage<T>>>,
}

impl<T: Value + Clone> StageSink<T> for DebounceStage<T> {
    fn accept(&self, _key: usize, value: &T) {
        let generation = {
            let mut state = self.state.lock().expect("debounce state lock poisoned");
            state.latest = Some(value.clone());
            state.generation += 1;
            state.generation
        };
        let Some(stage) = self.weak_self.get().map(Weak::clone) else {
            return;
        };
        let window = self.window;
        tokio::spawn(async move {
            tokio::time::sleep(window).await;
            let Some(stage) = stage.upgrade() else {
                return;
            };
            let surviving = {
                let state = stage.state.lock().expect("debounce state lock poisoned");
                if state.generation == generation {
                    state.latest.clone()
                } else {
                    None
                }
            };
            if let Some(value) = surviving {
                stage.shell.core().publish(value);
            }
        });
    }

    fn accept_fault(&self, _key: usize, fault: Fault) {
        // Faults are not debounced.
        self.shell.core().raise(fault);
    }
}

impl<T: Value + Clone> StageAccess<T> for DebounceStage<T> {
    fn shell(&self) -> &StageShell<T> {
        &self.shell
    }
}

pub(crate) fn debounce<T, U>(upstream: &U, window: Duration) -> Derived<T>
where
    T: Value + Clone,
    U: Observable<T> + ?Sized,
{
    let stage = Arc::new(DebounceStage {
        shell: StageShell::new(),
        window,
        state: Mutex::new(DebounceState {
            latest: None,
            generation: 0,
        }),
        weak_self: OnceLock::new(),
    });
    let _ = stage.weak_self.set(Arc::downgrade(&stage));
    let anchor = Anchor::new(&stage);
    stage.shell.bind(&anchor);
    watch(upstream, &anchor, 0).expect("freshly constructed stage cannot be reclaimed");
    Derived { inner: stage }
}

#[cfg(test)]
mod tests {
    use crate::observe::{FnObserver, Observable, ObservableExt};
    use crate::Property;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tokio::sync::mpsc;

    async fn recv<T>(rx: &mut mpsc::UnboundedReceiver<T>) -> T {
        tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("delivery timed out")
            .expect("delivery channel closed")
    }

    #[tokio::test]
    async fn test_only_the_surviving_value_is_emitted() {
        let source: Property<i64> = Property::new();
        let settled = source.debounce(Duration::from_millis(80));

        let (tx, mut rx) = mpsc::unbounded_channel();
        let _sub = settled.subscribe(FnObserver::arc(move |v: &i64| {
            let _ = tx.send(*v);
        }));

        // A burst inside one window: only the last value survives.
        source.set(1);
        tokio::time::sleep(Duration::from_millis(20)).await;
        source.set(2);
        tokio::time::sleep(Duration::from_millis(20)).await;
        source.set(3);

        assert_eq!(recv(&mut rx).await, 3);
        tokio::time::sleep(Duration::from_millis(120)).await;
        assert!(rx.try_recv().is_err(), "superseded values must not emit");
    }

    #[tokio::test]
    async fn test_spaced_values_all_emit() {
        let source: Property<i64> = Property::new();
        let settled = source.debounce(Duration::from_millis(30));

        let (tx, mut rx) = mpsc::unbounded_channel();
        let _sub = settled.subscribe(FnObserver::arc(move |v: &i64| {
            let _ = tx.send(*v);
        }));

        source.set(1);
        tokio::time::sleep(Duration::from_millis(90)).await;
        source.set(2);

        assert_eq!(recv(&mut rx).await, 1);
        assert_eq!(recv(&mut rx).await, 2);
    }

    #[tokio::test]
    async fn test_faults_bypass_the_window() {
        let source: Property<i64> = Property::new();
        let settled = source.debounce(Duration::from_secs(5));

        let faults = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&faults);
        let _sub = settled.subscribe(Arc::new(
            crate::FnObserver::new(|_: &i64| {})
                .with_fault(move |fault| seen.lock().unwrap().push(fault.to_string())),
        ));

        source.raise(Arc::new(crate::PanicFault {
            message: "upstream broke".into(),
        }));

        for _ in 0..200 {
            if !faults.lock().unwrap().is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert!(faults.lock().unwrap()[0].contains("upstream broke"));
    }
}
