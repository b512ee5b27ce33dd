//! # Strict round pairing across N sources.
//!
//! Buffers one pending value per source. Once every source has a pending
//! value the round is combined, emitted, and the buffer cleared. A fast
//! source's extra updates before the slow one catches up overwrite its
//! pending slot — dropped by design, not queued.

use std::sync::{Arc, Mutex};

use crate::error::Fault;
use crate::lifecycle::Anchor;
use crate::observe::Observable;
use crate::operators::stage::{watch, Derived, StageAccess, StageShell, StageSink};
use crate::value::Value;

pub(crate) struct ZipStage<T> {
    shell: StageShell<Vec<T>>,
    pending: Mutex<Vec<Option<T>>>,
}

impl<T: Value + Clone> StageSink<T> for ZipStage<T> {
    fn accept(&self, key: usize, value: &T) {
        let round = {
            let mut pending = self.pending.lock().expect("zip state lock poisoned");
            pending[key] = Some(value.clone());
            if pending.iter().all(Option::is_some) {
                Some(
                    pending
                        .iter_mut()
                        .map(|slot| slot.take().expect("all slots checked"))
                        .collect::<Vec<T>>(),
                )
            } else {
                None
            }
        };
        if let Some(values) = round {
            self.shell.core().publish(values);
        }
    }

    fn accept_fault(&self, _key: usize, fault: Fault) {
        self.shell.core().raise(fault);
    }
}

impl<T: Value + Clone> StageAccess<Vec<T>> for ZipStage<T> {
    fn shell(&self) -> &StageShell<Vec<T>> {
        &self.shell
    }
}

/// Pairs the sources' updates into strict rounds.
///
/// Output order follows source declaration order. Panics when called with no
/// sources.
pub fn zip<T: Value + Clone>(sources: &[&dyn Observable<T>]) -> Derived<Vec<T>> {
    assert!(!sources.is_empty(), "zip requires at least one source");
    let stage = Arc::new(ZipStage {
        shell: StageShell::new(),
        pending: Mutex::new(vec![None; sources.len()]),
    });
    let anchor = Anchor::new(&stage);
    stage.shell.bind(&anchor);
    for (key, source) in sources.iter().enumerate() {
        watch(*source, &anchor, key).expect("freshly constructed stage cannot be reclaimed");
    }
    Derived { inner: stage }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observe::FnObserver;
    use crate::Property;
    use std::time::Duration;
    use tokio::sync::mpsc;

    async fn recv<T>(rx: &mut mpsc::UnboundedReceiver<T>) -> T {
        tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("delivery timed out")
            .expect("delivery channel closed")
    }

    #[tokio::test]
    async fn test_zip_emits_complete_rounds_only() {
        let a: Property<String> = Property::new();
        let b: Property<String> = Property::new();
        let zipped = zip(&[&a, &b]);

        let (tx, mut rx) = mpsc::unbounded_channel();
        let _sub = zipped.subscribe(FnObserver::arc(move |pair: &Vec<String>| {
            let _ = tx.send(pair.clone());
        }));

        a.set("A1".into());
        b.set("B1".into());
        assert_eq!(recv(&mut rx).await, vec!["A1", "B1"]);

        a.set("A2".into());
        b.set("B2".into());
        assert_eq!(recv(&mut rx).await, vec!["A2", "B2"]);
    }

    #[tokio::test]
    async fn test_fast_source_updates_overwrite_the_pending_slot() {
        let a: Property<i64> = Property::new();
        let b: Property<i64> = Property::new();
        let zipped = zip(&[&a, &b]);

        let (tx, mut rx) = mpsc::unbounded_channel();
        let _sub = zipped.subscribe(FnObserver::arc(move |pair: &Vec<i64>| {
            let _ = tx.send(pair.clone());
        }));

        // The fast source races ahead; only its latest value pairs up.
        a.set(1);
        a.set(2);
        a.set(3);
        // Let the fast source's deliveries drain before the slow one fires.
        tokio::time::sleep(Duration::from_millis(50)).await;
        b.set(10);

        assert_eq!(recv(&mut rx).await, vec![3, 10]);
    }
}
