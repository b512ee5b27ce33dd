//! # Latest-value join across N sources.
//!
//! Like zip but the per-source buffer is never cleared: once every source
//! has produced at least one value, every further update emits the current
//! latest of all sources. Output order follows source declaration order.

use std::sync::{Arc, Mutex};

use crate::error::Fault;
use crate::lifecycle::Anchor;
use crate::observe::Observable;
use crate::operators::stage::{watch, Derived, StageAccess, StageShell, StageSink};
use crate::value::Value;

pub(crate) struct CombineStage<T> {
    shell: StageShell<Vec<T>>,
    latest: Mutex<Vec<Option<T>>>,
}

impl<T: Value + Clone> StageSink<T> for CombineStage<T> {
    fn accept(&self, key: usize, value: &T) {
        let joined = {
            let mut latest = self.latest.lock().expect("combine state lock poisoned");
            latest[key] = Some(value.clone());
            if latest.iter().all(Option::is_some) {
                Some(
                    latest
                        .iter()
                        .map(|slot| slot.clone().expect("all slots checked"))
                        .collect::<Vec<T>>(),
                )
            } else {
                None
            }
        };
        if let Some(values) = joined {
            self.shell.core().publish(values);
        }
    }

    fn accept_fault(&self, _key: usize, fault: Fault) {
        self.shell.core().raise(fault);
    }
}

impl<T: Value + Clone> StageAccess<Vec<T>> for CombineStage<T> {
    fn shell(&self) -> &StageShell<Vec<T>> {
        &self.shell
    }
}

/// Joins the sources on their latest values.
///
/// Sources are watched with their current values replayed, so a join over
/// already-initialized sources emits immediately. Panics when called with no
/// sources.
pub fn combine_latest<T: Value + Clone>(sources: &[&dyn Observable<T>]) -> Derived<Vec<T>> {
    assert!(
        !sources.is_empty(),
        "combine_latest requires at least one source"
    );
    let stage = Arc::new(CombineStage {
        shell: StageShell::new(),
        latest: Mutex::new(vec![None; sources.len()]),
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
    async fn test_initialized_sources_join_immediately_and_reuse_latest() {
        let a = Property::with_value(String::from("A"));
        let b = Property::with_value(String::from("B"));
        let joined = combine_latest(&[&a, &b]);

        let (tx, mut rx) = mpsc::unbounded_channel();
        let _sub = joined.subscribe(FnObserver::arc(move |values: &Vec<String>| {
            let _ = tx.send(values.clone());
        }));

        // Replays of the initial values complete the join.
        assert_eq!(recv(&mut rx).await, vec!["A", "B"]);

        // One source updates; the other's latest is reused.
        a.set("1".into());
        assert_eq!(recv(&mut rx).await, vec!["1", "B"]);

        b.set("2".into());
        assert_eq!(recv(&mut rx).await, vec!["1", "2"]);
    }

    #[tokio::test]
    async fn test_nothing_emits_until_every_source_produced() {
        let a: Property<i64> = Property::new();
        let b: Property<i64> = Property::new();
        let joined = combine_latest(&[&a, &b]);

        let (tx, mut rx) = mpsc::unbounded_channel();
        let _sub = joined.subscribe(FnObserver::arc(move |values: &Vec<i64>| {
            let _ = tx.send(values.clone());
        }));

        a.set(1);
        a.set(2);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(rx.try_recv().is_err(), "half-populated join must not emit");

        b.set(9);
        assert_eq!(recv(&mut rx).await, vec![2, 9]);
    }
}
