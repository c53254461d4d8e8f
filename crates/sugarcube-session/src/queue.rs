//! Min-ordered expiry queue.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use chrono::{DateTime, Utc};

/// Queue entry. Ordered so that the earliest deadline is the heap maximum.
#[derive(Debug)]
struct Entry<T> {
    deadline: DateTime<Utc>,
    /// Insertion sequence, breaks deadline ties in FIFO order.
    seq: u64,
    item: T,
}

impl<T> PartialEq for Entry<T> {
    fn eq(&self, other: &Self) -> bool {
        self.deadline == other.deadline && self.seq == other.seq
    }
}

impl<T> Eq for Entry<T> {}

impl<T> PartialOrd for Entry<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Entry<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed: BinaryHeap is a max-heap.
        other
            .deadline
            .cmp(&self.deadline)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Priority queue of items ordered by ascending deadline.
///
/// Insert and pop are O(log n), peek is O(1). Equal deadlines pop in
/// insertion order. The queue is not synchronized; wrap it in a lock to
/// share it.
#[derive(Debug)]
pub struct ExpiryQueue<T> {
    heap: BinaryHeap<Entry<T>>,
    next_seq: u64,
}

impl<T> Default for ExpiryQueue<T> {
    fn default() -> Self {
        Self {
            heap: BinaryHeap::new(),
            next_seq: 0,
        }
    }
}

impl<T> ExpiryQueue<T> {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an item that expires at `deadline`.
    pub fn push(&mut self, deadline: DateTime<Utc>, item: T) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Entry {
            deadline,
            seq,
            item,
        });
    }

    /// The item with the earliest deadline, without removing it.
    pub fn peek_min(&self) -> Option<(&DateTime<Utc>, &T)> {
        self.heap.peek().map(|e| (&e.deadline, &e.item))
    }

    /// Remove and return the item with the earliest deadline.
    pub fn pop_min(&mut self) -> Option<(DateTime<Utc>, T)> {
        self.heap.pop().map(|e| (e.deadline, e.item))
    }

    /// Pop every item whose deadline is not after `now`, earliest first.
    pub fn pop_expired(&mut self, now: DateTime<Utc>) -> Vec<T> {
        let mut expired = Vec::new();
        while let Some(entry) = self.heap.peek() {
            if entry.deadline > now {
                break;
            }
            if let Some(entry) = self.heap.pop() {
                expired.push(entry.item);
            }
        }
        expired
    }

    /// Number of queued items.
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Check if the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}
