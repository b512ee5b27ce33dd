//! # Latest-value cache with compare-and-retry accumulation.
//!
//! One mutable slot of `Option<Arc<T>>`. [`ValueCell::accumulate`] runs the
//! caller's function *outside* the lock and commits with a pointer-identity
//! compare-and-retry, so:
//! - concurrent writers never lose an update (linearizable),
//! - the returned [`Transition`] is the true before/after pair for that
//!   logical update,
//! - user code can never deadlock against the slot lock.
//!
//! ## Rules
//! - A lost race re-runs the function against the fresh current value.
//! - Replacement is atomic; readers only ever see a complete value.

use std::sync::{Arc, Mutex};

use crate::value::Transition;

/// One atomically replaceable cached value.
pub(crate) struct ValueCell<T> {
    slot: Mutex<Option<Arc<T>>>,
}

impl<T> ValueCell<T> {
    pub fn new(initial: Option<Arc<T>>) -> Self {
        Self {
            slot: Mutex::new(initial),
        }
    }

    /// Returns the current value, or `None` while uninitialized.
    pub fn get(&self) -> Option<Arc<T>> {
        self.slot.lock().expect("value cell lock poisoned").clone()
    }

    /// Atomically computes and stores the next value.
    ///
    /// `f` receives the current value and produces the replacement. If
    /// another writer commits between the read and the store, the commit is
    /// abandoned and `f` runs again against the fresh value.
    pub fn accumulate(&self, f: impl Fn(Option<&T>) -> Arc<T>) -> Transition<T> {
        loop {
            let before = self.get();
            let after = f(before.as_deref());
            let mut slot = self.slot.lock().expect("value cell lock poisoned");
            let unchanged = match (&*slot, &before) {
                (None, None) => true,
                (Some(current), Some(seen)) => Arc::ptr_eq(current, seen),
                _ => false,
            };
            if unchanged {
                *slot = Some(Arc::clone(&after));
                return Transition::new(before, after);
            }
            // Lost the race: retry against the new current value.
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accumulate_initializes_and_reports_old_value() {
        let cell: ValueCell<i64> = ValueCell::new(None);
        let t = cell.accumulate(|old| Arc::new(old.copied().unwrap_or(0) + 1));
        assert!(t.old.is_none());
        assert_eq!(*t.new, 1);

        let t = cell.accumulate(|old| Arc::new(old.copied().unwrap_or(0) + 1));
        assert_eq!(t.old.as_deref(), Some(&1));
        assert_eq!(*t.new, 2);
        assert_eq!(cell.get().as_deref(), Some(&2));
    }

    #[test]
    fn test_concurrent_accumulate_loses_no_updates() {
        const THREADS: usize = 8;
        const PER_THREAD: usize = 250;

        let cell: Arc<ValueCell<usize>> = Arc::new(ValueCell::new(Some(Arc::new(0))));
        let mut handles = Vec::new();
        for _ in 0..THREADS {
            let cell = Arc::clone(&cell);
            handles.push(std::thread::spawn(move || {
                for _ in 0..PER_THREAD {
                    cell.accumulate(|old| Arc::new(old.copied().unwrap_or(0) + 1));
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(cell.get().as_deref(), Some(&(THREADS * PER_THREAD)));
    }

    #[test]
    fn test_transition_reflects_each_logical_update() {
        let cell: ValueCell<i64> = ValueCell::new(Some(Arc::new(10)));
        let t = cell.accumulate(|_| Arc::new(20));
        assert_eq!(t.old.as_deref(), Some(&10));
        assert_eq!(*t.new, 20);
    }
}
