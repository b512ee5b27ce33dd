//! # Pass-through union of N sources.
//!
//! No buffering: every upstream update is forwarded as-is, and `get()`
//! reflects whichever source updated last.

use std::sync::Arc;

use crate::error::Fault;
use crate::lifecycle::Anchor;
use crate::observe::Observable;
use crate::operators::stage::{watch, Derived, StageAccess, StageShell, StageSink};
use crate::value::Value;

pub(crate) struct MergeStage<T> {
    shell: StageShell<T>,
}

impl<T: Value + Clone> StageSink<T> for MergeStage<T> {
    fn accept(&self, _key: usize, value: &T) {
        self.shell.core().publish(value.clone());
    }

    fn accept_fault(&self, _key: usize, fault: Fault) {
        self.shell.core().raise(fault);
    }
}

impl<T: Value + Clone> StageAccess<T> for MergeStage<T> {
    fn shell(&self) -> &StageShell<T> {
        &self.shell
    }
}

/// Forwards every update from every source into one stream.
///
/// Panics when called with no sources.
pub fn merge<T: Value + Clone>(sources: &[&dyn Observable<T>]) -> Derived<T> {
    assert!(!sources.is_empty(), "merge requires at least one source");
    let stage = Arc::new(MergeStage {
        shell: StageShell::new(),
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
    use crate::observe::{FnObserver, ObservableValue};
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
    async fn test_merge_forwards_updates_from_every_source() {
        let a: Property<i64> = Property::new();
        let b: Property<i64> = Property::new();
        let merged = merge(&[&a, &b]);

        let (tx, mut rx) = mpsc::unbounded_channel();
        let _sub = merged.subscribe(FnObserver::arc(move |v: &i64| {
            let _ = tx.send(*v);
        }));

        a.set(1);
        assert_eq!(recv(&mut rx).await, 1);
        b.set(2);
        assert_eq!(recv(&mut rx).await, 2);

        // get() is last-writer.
        assert_eq!(merged.get().as_deref(), Some(&2));
    }
}
