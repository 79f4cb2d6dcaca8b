//! Lazily populated, weakly held stripe storage.
//!
//! Segments are created on first access and held by `Weak` references, so a
//! segment lives exactly as long as some caller holds its `Arc`. A later
//! access to a slot whose segment has been dropped creates a fresh one.
//!
//! ## Architecture
//!
//! ```text
//!   Dense (stripes < cutoff)              Sparse (stripes ≥ cutoff)
//!   ┌───┬───┬───┬───┬───┬───┬───┬───┐      16 shards, index & 15
//!   │ W │ ∅ │ W │ ∅ │ ∅ │ W │ ∅ │ ∅ │      ┌─────────────────────────┐
//!   └───┴───┴───┴───┴───┴───┴───┴───┘      │ RwLock<FxHashMap<       │
//!   RwLock<Weak<S>> per slot               │   index, Weak<S>>>      │
//!                                          └─────────────────────────┘
//!
//!   Reclaim queue: [(slot, Weak<S>), ...]   one entry per created segment
//!     sweep when len > threshold:
//!       strong_count == 0 → clear slot if it still holds that Weak
//!       threshold = max(MIN_SWEEP, 2 × survivors)
//! ```
//!
//! ## Creation Race
//!
//! `get_at` first tries a shared read of the slot. On a miss it builds a
//! candidate and installs it under the slot's write lock only if the slot is
//! still empty or dead (compare-and-set). A loser drops its candidate and
//! returns the winner, so one segment per slot is ever visible at a time.

use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashMap;

/// Number of map shards backing the sparse layout.
const SPARSE_SHARDS: usize = 16;

/// Smallest reclaim queue length that triggers a sweep.
const MIN_SWEEP: usize = 16;

pub(crate) type Supplier<S> = Box<dyn Fn() -> S + Send + Sync>;

enum Slots<S> {
    Dense(Box<[RwLock<Weak<S>>]>),
    Sparse(Box<[RwLock<FxHashMap<usize, Weak<S>>>]>),
}

impl<S> Slots<S> {
    fn load(&self, index: usize) -> Option<Arc<S>> {
        match self {
            Slots::Dense(slots) => slots[index].read().upgrade(),
            Slots::Sparse(shards) => shards[index % SPARSE_SHARDS]
                .read()
                .get(&index)
                .and_then(Weak::upgrade),
        }
    }

    /// Installs `candidate` unless a live segment is already present.
    /// Returns the visible segment and whether `candidate` won.
    fn compare_and_set(&self, index: usize, candidate: Arc<S>) -> (Arc<S>, bool) {
        match self {
            Slots::Dense(slots) => {
                let mut slot = slots[index].write();
                if let Some(existing) = slot.upgrade() {
                    return (existing, false);
                }
                *slot = Arc::downgrade(&candidate);
                (candidate, true)
            },
            Slots::Sparse(shards) => {
                let mut map = shards[index % SPARSE_SHARDS].write();
                if let Some(existing) = map.get(&index).and_then(Weak::upgrade) {
                    return (existing, false);
                }
                map.insert(index, Arc::downgrade(&candidate));
                (candidate, true)
            },
        }
    }

    /// Empties `index` if it still refers to `dead`.
    fn clear_if_same(&self, index: usize, dead: &Weak<S>) -> bool {
        match self {
            Slots::Dense(slots) => {
                let mut slot = slots[index].write();
                if Weak::ptr_eq(&*slot, dead) {
                    *slot = Weak::new();
                    true
                } else {
                    false
                }
            },
            Slots::Sparse(shards) => {
                let mut map = shards[index % SPARSE_SHARDS].write();
                match map.get(&index) {
                    Some(current) if Weak::ptr_eq(current, dead) => {
                        map.remove(&index);
                        true
                    },
                    _ => false,
                }
            },
        }
    }

    fn live(&self) -> usize {
        match self {
            Slots::Dense(slots) => slots
                .iter()
                .filter(|slot| slot.read().strong_count() > 0)
                .count(),
            Slots::Sparse(shards) => shards
                .iter()
                .map(|shard| {
                    shard
                        .read()
                        .values()
                        .filter(|weak| weak.strong_count() > 0)
                        .count()
                })
                .sum(),
        }
    }

    #[cfg(test)]
    fn occupied(&self) -> usize {
        match self {
            Slots::Dense(slots) => {
                let empty: Weak<S> = Weak::new();
                slots
                    .iter()
                    .filter(|slot| !Weak::ptr_eq(&*slot.read(), &empty))
                    .count()
            },
            Slots::Sparse(shards) => shards.iter().map(|shard| shard.read().len()).sum(),
        }
    }
}

struct ReclaimQueue<S> {
    pending: Vec<(usize, Weak<S>)>,
    threshold: usize,
}

/// Weakly held segments created on demand.
pub(crate) struct LazyStripes<S> {
    slots: Slots<S>,
    supplier: Supplier<S>,
    reclaim: Mutex<ReclaimQueue<S>>,
}

impl<S> LazyStripes<S> {
    /// `size` addressable slots, stored densely unless `sparse`.
    pub(crate) fn new(size: usize, sparse: bool, supplier: Supplier<S>) -> Self {
        let slots = if !sparse {
            Slots::Dense((0..size).map(|_| RwLock::new(Weak::new())).collect())
        } else {
            Slots::Sparse(
                (0..SPARSE_SHARDS)
                    .map(|_| RwLock::new(FxHashMap::default()))
                    .collect(),
            )
        };
        Self {
            slots,
            supplier,
            reclaim: Mutex::new(ReclaimQueue {
                pending: Vec::new(),
                threshold: MIN_SWEEP,
            }),
        }
    }

    pub(crate) fn is_sparse(&self) -> bool {
        matches!(self.slots, Slots::Sparse(_))
    }

    pub(crate) fn get_at(&self, index: usize) -> Arc<S> {
        if let Some(existing) = self.slots.load(index) {
            return existing;
        }
        let candidate = Arc::new((self.supplier)());
        let (segment, installed) = self.slots.compare_and_set(index, candidate);
        if installed {
            self.register(index, &segment);
        }
        segment
    }

    /// Slots currently holding a live segment.
    pub(crate) fn live(&self) -> usize {
        self.slots.live()
    }

    /// Slots holding a weak reference, live or dead.
    #[cfg(test)]
    pub(crate) fn occupied(&self) -> usize {
        self.slots.occupied()
    }

    /// Sweeps the whole reclaim queue now; returns the number of slots cleared.
    pub(crate) fn reclaim(&self) -> usize {
        let mut queue = self.reclaim.lock();
        self.sweep(&mut queue)
    }

    fn register(&self, index: usize, segment: &Arc<S>) {
        let mut queue = self.reclaim.lock();
        queue.pending.push((index, Arc::downgrade(segment)));
        if queue.pending.len() > queue.threshold {
            self.sweep(&mut queue);
        }
    }

    fn sweep(&self, queue: &mut ReclaimQueue<S>) -> usize {
        let before = queue.pending.len();
        let mut cleared = 0usize;
        queue.pending.retain(|(index, weak)| {
            if weak.strong_count() > 0 {
                return true;
            }
            if self.slots.clear_if_same(*index, weak) {
                cleared += 1;
            }
            false
        });
        queue.threshold = MIN_SWEEP.max(queue.pending.len() * 2);
        tracing::trace!(
            before,
            after = queue.pending.len(),
            cleared,
            "swept lazy stripe reclaim queue"
        );
        cleared
    }
}
