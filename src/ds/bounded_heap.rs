//! Fixed-capacity priority queue that keeps the best `C` elements seen.
//!
//! "Best" means *least* under the configured order (a comparator, or `Ord`).
//! The elements are kept in a binary max-heap, so the current worst element
//! sits at the root and can be examined in O(1).
//!
//! ## Architecture
//!
//! ```text
//!   capacity = 4, order = natural, offered: 7 3 9 1 5 8 2
//!
//!   after 7 3 9 1      heap (max at root):   9
//!                                           / \
//!                                          7   3
//!                                         /
//!                                        1
//!
//!   offer(5): 5 < 9 (root)  → evict 9, insert 5   → {7, 5, 3, 1}
//!   offer(8): 8 ≥ 7 (root)  → dropped             → {7, 5, 3, 1}
//!   offer(2): 2 < 7 (root)  → evict 7, insert 2   → {5, 3, 2, 1}
//!
//!   to_sorted_vec() → [1, 2, 3, 5]
//! ```
//!
//! ## Offer Semantics
//!
//! - Below capacity: the element is inserted.
//! - At capacity: the element replaces the root only if it is strictly
//!   better (strictly less). Otherwise it is dropped. Both outcomes return
//!   `true`: "holds the best `C` elements offered" is preserved either way.
//!
//! Ties are broken by offer order: each element carries an insertion
//! sequence number, and among equal elements the latest offered ranks worst.
//! A newcomer equal to the current worst is dropped, and eviction among
//! equal retained elements removes the latest, so the earliest offered
//! survive. The order must be a consistent total order; otherwise which of
//! two "equal" elements survives is unspecified.
//!
//! ## Thread Safety
//!
//! Not thread-safe. Wrap in a mutex for concurrent access.
//!
//! ## Example Usage
//!
//! ```
//! use stripekit::ds::BoundedPriorityQueue;
//!
//! // Keep the three shortest latencies.
//! let mut fastest = BoundedPriorityQueue::new(3);
//! for ms in [40, 12, 95, 7, 33, 12] {
//!     fastest.offer(ms);
//! }
//! assert_eq!(fastest.len(), 3);
//! assert_eq!(fastest.to_sorted_vec(), vec![7, 12, 12]);
//! ```

use std::cmp::Ordering;
use std::fmt;

use crate::error::{ConfigError, InvariantError};

/// Comparator used when the queue is built from `Ord`.
pub type NaturalOrder<T> = fn(&T, &T) -> Ordering;

/// Capacity-bounded priority queue retaining the least `capacity` elements.
///
/// # Type Parameters
///
/// - `T`: Element type
/// - `C`: Comparator, `Fn(&T, &T) -> Ordering`; defaults to `T::cmp`
pub struct BoundedPriorityQueue<T, C = NaturalOrder<T>> {
    heap: Vec<Entry<T>>,
    capacity: usize,
    next_seq: u64,
    compare: C,
}

struct Entry<T> {
    item: T,
    seq: u64,
}

impl<T: Ord> BoundedPriorityQueue<T> {
    /// Creates a queue ordered by `T: Ord`.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        Self::with_comparator(capacity, <T as Ord>::cmp)
    }

    /// Fallible version of [`new`](Self::new).
    pub fn try_new(capacity: usize) -> Result<Self, ConfigError> {
        Self::try_with_comparator(capacity, <T as Ord>::cmp)
    }
}

impl<T, C> BoundedPriorityQueue<T, C>
where
    C: Fn(&T, &T) -> Ordering,
{
    /// Creates a queue ordered by `compare`; lesser elements are better.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    ///
    /// # Example
    ///
    /// ```
    /// use stripekit::ds::BoundedPriorityQueue;
    ///
    /// // Keep the two largest by reversing the order.
    /// let mut top = BoundedPriorityQueue::with_comparator(2, |a: &u32, b: &u32| b.cmp(a));
    /// for v in [5, 1, 9, 3] {
    ///     top.offer(v);
    /// }
    /// assert_eq!(top.to_sorted_vec(), vec![9, 5]);
    /// ```
    pub fn with_comparator(capacity: usize, compare: C) -> Self {
        match Self::try_with_comparator(capacity, compare) {
            Ok(queue) => queue,
            Err(err) => panic!("{err}"),
        }
    }

    /// Fallible version of [`with_comparator`](Self::with_comparator).
    pub fn try_with_comparator(capacity: usize, compare: C) -> Result<Self, ConfigError> {
        if capacity == 0 {
            return Err(ConfigError::new("capacity must be > 0"));
        }
        Ok(Self {
            heap: Vec::with_capacity(capacity),
            capacity,
            next_seq: 0,
            compare,
        })
    }

    /// Offers `item`; see the module docs for the admission rule.
    ///
    /// Always returns `true`.
    pub fn offer(&mut self, item: T) -> bool {
        if self.heap.len() < self.capacity {
            let entry = self.entry(item);
            self.heap.push(entry);
            self.sift_up(self.heap.len() - 1);
        } else if (self.compare)(&item, &self.heap[0].item) == Ordering::Less {
            let entry = self.entry(item);
            self.heap[0] = entry;
            self.sift_down(0);
        }
        true
    }

    /// Returns the current worst element.
    pub fn peek_worst(&self) -> Option<&T> {
        self.heap.first().map(|entry| &entry.item)
    }

    /// Removes and returns the current worst element.
    pub fn pop_worst(&mut self) -> Option<T> {
        if self.heap.is_empty() {
            return None;
        }
        let last = self.heap.len() - 1;
        self.heap.swap(0, last);
        let worst = self.heap.pop();
        if !self.heap.is_empty() {
            self.sift_down(0);
        }
        worst.map(|entry| entry.item)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.heap.len() == self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Iterates the retained elements in heap (unspecified) order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &T> + '_ {
        self.heap.iter().map(|entry| &entry.item)
    }

    pub fn clear(&mut self) {
        self.heap.clear();
        self.next_seq = 0;
    }

    /// Drains the queue, returning its elements best first (ascending).
    ///
    /// Equal elements come out in the order they were offered.
    pub fn to_sorted_vec(&mut self) -> Vec<T> {
        let mut sorted = Vec::with_capacity(self.heap.len());
        while let Some(worst) = self.pop_worst() {
            sorted.push(worst);
        }
        sorted.reverse();
        sorted
    }

    /// Consumes the queue, returning its elements best first (ascending).
    pub fn into_sorted_vec(mut self) -> Vec<T> {
        self.to_sorted_vec()
    }

    /// Validates the size bound and the max-heap property.
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        if self.heap.len() > self.capacity {
            return Err(InvariantError::new(format!(
                "len {} exceeds capacity {}",
                self.heap.len(),
                self.capacity
            )));
        }
        for child in 1..self.heap.len() {
            let parent = (child - 1) / 2;
            if self.rank(&self.heap[parent], &self.heap[child]) == Ordering::Less {
                return Err(InvariantError::new(format!(
                    "heap order violated between {parent} and {child}"
                )));
            }
        }
        Ok(())
    }

    fn entry(&mut self, item: T) -> Entry<T> {
        let seq = self.next_seq;
        self.next_seq += 1;
        Entry { item, seq }
    }

    // Later offers rank worse among equals.
    fn rank(&self, a: &Entry<T>, b: &Entry<T>) -> Ordering {
        (self.compare)(&a.item, &b.item).then(a.seq.cmp(&b.seq))
    }

    fn sift_up(&mut self, mut pos: usize) {
        while pos > 0 {
            let parent = (pos - 1) / 2;
            if self.rank(&self.heap[pos], &self.heap[parent]) != Ordering::Greater {
                break;
            }
            self.heap.swap(pos, parent);
            pos = parent;
        }
    }

    fn sift_down(&mut self, mut pos: usize) {
        let len = self.heap.len();
        loop {
            let left = 2 * pos + 1;
            if left >= len {
                break;
            }
            let right = left + 1;
            let mut largest = left;
            if right < len
                && self.rank(&self.heap[right], &self.heap[left]) == Ordering::Greater
            {
                largest = right;
            }
            if self.rank(&self.heap[largest], &self.heap[pos]) != Ordering::Greater {
                break;
            }
            self.heap.swap(pos, largest);
            pos = largest;
        }
    }
}

impl<T: fmt::Debug, C> fmt::Debug for BoundedPriorityQueue<T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundedPriorityQueue")
            .field("len", &self.heap.len())
            .field("capacity", &self.capacity)
            .field("heap", &self.heap.iter().map(|entry| &entry.item).collect::<Vec<_>>())
            .finish()
    }
}
