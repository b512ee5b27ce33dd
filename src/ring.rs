//! # Bounded ring buffer used by the `buffer` operator.
//!
//! A small thread-safe FIFO that keeps only the most recent `capacity`
//! items. When full, pushing evicts the oldest item — the same
//! keep-the-most-recent behavior as a lagging broadcast channel.
//!
//! ## Rules
//! - Capacity is clamped to a minimum of 1.
//! - [`RingBuffer::set_capacity`] is allowed at runtime; shrinking drops the
//!   oldest items first.
//! - [`RingBuffer::snapshot`] returns items oldest-first.

use std::collections::VecDeque;
use std::sync::Mutex;

struct RingInner<T> {
    items: VecDeque<T>,
    capacity: usize,
}

/// Thread-safe bounded FIFO of the most recent items.
pub struct RingBuffer<T> {
    inner: Mutex<RingInner<T>>,
}

impl<T: Clone> RingBuffer<T> {
    /// Creates a buffer holding at most `capacity` items (clamped to 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            inner: Mutex::new(RingInner {
                items: VecDeque::with_capacity(capacity),
                capacity,
            }),
        }
    }

    /// Appends an item, evicting the oldest one when full.
    pub fn push(&self, item: T) {
        let mut inner = self.inner.lock().expect("ring buffer lock poisoned");
        if inner.items.len() == inner.capacity {
            inner.items.pop_front();
        }
        inner.items.push_back(item);
    }

    /// Removes all buffered items.
    pub fn clear(&self) {
        self.inner
            .lock()
            .expect("ring buffer lock poisoned")
            .items
            .clear();
    }

    /// Returns the buffered items oldest-first.
    pub fn snapshot(&self) -> Vec<T> {
        self.inner
            .lock()
            .expect("ring buffer lock poisoned")
            .items
            .iter()
            .cloned()
            .collect()
    }

    /// Adjusts the capacity at runtime (clamped to 1).
    ///
    /// Shrinking below the current length drops the oldest items.
    pub fn set_capacity(&self, capacity: usize) {
        let capacity = capacity.max(1);
        let mut inner = self.inner.lock().expect("ring buffer lock poisoned");
        inner.capacity = capacity;
        while inner.items.len() > capacity {
            inner.items.pop_front();
        }
    }

    /// Returns the number of buffered items.
    pub fn len(&self) -> usize {
        self.inner.lock().expect("ring buffer lock poisoned").items.len()
    }

    /// Returns true if nothing is buffered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the current capacity.
    pub fn capacity(&self) -> usize {
        self.inner.lock().expect("ring buffer lock poisoned").capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_evicts_oldest_when_full() {
        let ring = RingBuffer::new(3);
        for n in 1..=5 {
            ring.push(n);
        }
        assert_eq!(ring.snapshot(), vec![3, 4, 5]);
        assert_eq!(ring.len(), 3);
    }

    #[test]
    fn test_capacity_is_clamped_to_one() {
        let ring = RingBuffer::new(0);
        assert_eq!(ring.capacity(), 1);
        ring.push("a");
        ring.push("b");
        assert_eq!(ring.snapshot(), vec!["b"]);
    }

    #[test]
    fn test_shrinking_drops_oldest_first() {
        let ring = RingBuffer::new(4);
        for n in 1..=4 {
            ring.push(n);
        }
        ring.set_capacity(2);
        assert_eq!(ring.snapshot(), vec![3, 4]);
    }

    #[test]
    fn test_clear_empties_the_buffer() {
        let ring = RingBuffer::new(2);
        ring.push(1);
        ring.clear();
        assert!(ring.is_empty());
    }
}
