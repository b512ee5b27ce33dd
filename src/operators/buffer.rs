//! # Sliding-window buffering.
//!
//! Keeps the most recent `capacity` upstream values in a ring buffer and
//! emits the window as a snapshot list on every update.

use std::sync::Arc;

use crate::error::Fault;
use crate::lifecycle::Anchor;
use crate::observe::Observable;
use crate::operators::stage::{watch, Derived, StageAccess, StageShell, StageSink};
use crate::ring::RingBuffer;
use crate::value::Value;

pub(crate) struct BufferStage<T> {
    shell: StageShell<Vec<T>>,
    ring: RingBuffer<T>,
}

impl<T: Value + Clone> StageSink<T> for BufferStage<T> {
    fn accept(&self, _key: usize, value: &T) {
        self.ring.push(value.clone());
        self.shell.core().publish(self.ring.snapshot());
    }

    fn accept_fault(&self, _key: usize, fault: Fault) {
        self.shell.core().raise(fault);
    }
}

impl<T: Value + Clone> StageAccess<Vec<T>> for BufferStage<T> {
    fn shell(&self) -> &StageShell<Vec<T>> {
        &self.shell
    }
}

pub(crate) fn buffer<T, U>(upstream: &U, capacity: usize) -> Derived<Vec<T>>
where
    T: Value + Clone,
    U: Observable<T> + ?Sized,
{
    let stage = Arc::new(BufferStage {
        shell: StageShell::new(),
        ring: RingBuffer::new(capacity),
    });
    let anchor = Anchor::new(&stage);
    stage.shell.bind(&anchor);
    watch(upstream, &anchor, 0).expect("freshly constructed stage cannot be reclaimed");
    Derived { inner: stage }
}

#[cfg(test)]
mod tests {
    use crate::observe::{FnObserver, Observable, ObservableExt};
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
    async fn test_buffer_emits_sliding_snapshots() {
        let source: Property<i64> = Property::new();
        let windows = source.buffer(2);

        let (tx, mut rx) = mpsc::unbounded_channel();
        let _sub = windows.subscribe(FnObserver::arc(move |w: &Vec<i64>| {
            let _ = tx.send(w.clone());
        }));

        source.set(1);
        source.set(2);
        source.set(3);

        assert_eq!(recv(&mut rx).await, vec![1]);
        assert_eq!(recv(&mut rx).await, vec![1, 2]);
        assert_eq!(recv(&mut rx).await, vec![2, 3]);
    }
}
