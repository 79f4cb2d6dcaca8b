//! Striped locks: many keys, a fixed set of lock segments.
//!
//! A [`Striped<S>`] maps keys onto a power-of-two number of segments (locks,
//! semaphores, read-write locks, or any `S`), trading a little false sharing
//! for far less contention than one global lock and far less memory than one
//! lock per key.
//!
//! ## Architecture
//!
//! ```text
//!   key ──► StripeIndexer (FxHash → smear → & mask) ──► index
//!                                                        │
//!            ┌───────────────────────────────────────────┘
//!            ▼
//!   Eager:       [Arc<S>; size]             all built up front
//!   Lazy dense:  [RwLock<Weak<S>>; size]    built on first use  (stripes < cutoff)
//!   Lazy sparse: 16 × RwLock<FxHashMap>     built on first use  (stripes ≥ cutoff)
//! ```
//!
//! ## Segment Lifecycles
//!
//! - **Eager** segments live as long as the `Striped`. `get(k)` returns the
//!   same `Arc` for equal keys forever.
//! - **Lazy** segments are held weakly and live only while a caller holds the
//!   returned `Arc`. Equal keys get the same segment while it is referenced;
//!   once every holder drops it, the next access builds a new one. Guards
//!   obtained through `lock_arc`/`read_arc`/`write_arc`/`acquire_arc` own the
//!   `Arc`, so a held lock always keeps its segment alive.
//!
//! ## Multi-key Locking
//!
//! [`bulk_get`](Striped::bulk_get) returns segments sorted by stripe index.
//! Every thread that locks several segments must lock them in that order;
//! the global order is what rules out deadlock between overlapping key sets.
//! The result contains one entry per key, so keys that collide produce the
//! same segment twice in a row; lock it once.
//!
//! ## Example Usage
//!
//! ```
//! use std::sync::Arc;
//! use stripekit::sync::Striped;
//!
//! let locks = Striped::lock(16);
//!
//! // Same key, same segment.
//! assert!(Arc::ptr_eq(&locks.get(&"account:1"), &locks.get(&"account:1")));
//!
//! {
//!     let _guard = locks.lock_for(&"account:1");
//!     // ... mutate account 1 ...
//! }
//!
//! // Transfer between two accounts without deadlock.
//! let _guards = locks.lock_all([&"account:1", &"account:2"]);
//! ```
//!
//! ## Thread Safety
//!
//! Lookup never blocks on other lookups: eager storage is immutable, lazy
//! storage takes a slot's read lock and only writes on creation.

use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use parking_lot::{
    ArcMutexGuard, ArcRwLockReadGuard, ArcRwLockWriteGuard, Mutex, RawMutex, RawRwLock, RwLock,
};

use crate::builder::{StripeLayout, DEFAULT_SPARSE_CUTOFF};
use crate::error::ConfigError;
use crate::sync::index::{StripeIndexer, MAX_POWER_OF_TWO};
use crate::sync::lazy::LazyStripes;
use crate::sync::semaphore::{ArcSemaphorePermit, Semaphore};

enum Storage<S> {
    Eager(Box<[Arc<S>]>),
    Lazy(LazyStripes<S>),
}

/// A set of `S` segments addressed by key.
pub struct Striped<S> {
    indexer: StripeIndexer,
    storage: Storage<S>,
}

impl<S> Striped<S> {
    /// Builds every segment up front with `supplier`.
    ///
    /// # Panics
    ///
    /// Panics if `stripes` is zero or exceeds `2^30`.
    pub fn eager<F>(stripes: usize, supplier: F) -> Self
    where
        F: FnMut() -> S,
    {
        match Self::try_eager(stripes, supplier) {
            Ok(striped) => striped,
            Err(err) => panic!("{err}"),
        }
    }

    /// Fallible version of [`eager`](Self::eager).
    pub fn try_eager<F>(stripes: usize, mut supplier: F) -> Result<Self, ConfigError>
    where
        F: FnMut() -> S,
    {
        if stripes > MAX_POWER_OF_TWO {
            return Err(ConfigError::new(format!(
                "eager stripes must be <= {MAX_POWER_OF_TWO}, got {stripes}"
            )));
        }
        let indexer = StripeIndexer::try_new(stripes)?;
        let segments = (0..indexer.size()).map(|_| Arc::new(supplier())).collect();
        Ok(Self {
            indexer,
            storage: Storage::Eager(segments),
        })
    }

    /// Builds segments on first use and holds them weakly.
    ///
    /// # Panics
    ///
    /// Panics if `stripes` is zero.
    pub fn lazy<F>(stripes: usize, supplier: F) -> Self
    where
        F: Fn() -> S + Send + Sync + 'static,
    {
        Self::lazy_with_cutoff(stripes, DEFAULT_SPARSE_CUTOFF, supplier)
    }

    /// Fallible version of [`lazy`](Self::lazy).
    pub fn try_lazy<F>(stripes: usize, supplier: F) -> Result<Self, ConfigError>
    where
        F: Fn() -> S + Send + Sync + 'static,
    {
        Self::try_lazy_with_cutoff(stripes, DEFAULT_SPARSE_CUTOFF, supplier)
    }

    /// Like [`lazy`](Self::lazy), choosing a sparse map instead of a dense
    /// slot array once the requested stripe count reaches `sparse_cutoff`.
    pub fn lazy_with_cutoff<F>(stripes: usize, sparse_cutoff: usize, supplier: F) -> Self
    where
        F: Fn() -> S + Send + Sync + 'static,
    {
        match Self::try_lazy_with_cutoff(stripes, sparse_cutoff, supplier) {
            Ok(striped) => striped,
            Err(err) => panic!("{err}"),
        }
    }

    /// Fallible version of [`lazy_with_cutoff`](Self::lazy_with_cutoff).
    pub fn try_lazy_with_cutoff<F>(
        stripes: usize,
        sparse_cutoff: usize,
        supplier: F,
    ) -> Result<Self, ConfigError>
    where
        F: Fn() -> S + Send + Sync + 'static,
    {
        let indexer = StripeIndexer::try_new(stripes)?;
        let sparse = stripes >= sparse_cutoff;
        let lazy = LazyStripes::new(indexer.size(), sparse, Box::new(supplier));
        Ok(Self {
            indexer,
            storage: Storage::Lazy(lazy),
        })
    }

    /// Returns the segment for `key`.
    ///
    /// Equal keys always map to the same stripe index; distinct keys may share
    /// one.
    #[inline]
    pub fn get<K: Hash + ?Sized>(&self, key: &K) -> Arc<S> {
        self.get_at(self.indexer.index_for(key))
    }

    /// Returns the segment at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.size()`.
    pub fn get_at(&self, index: usize) -> Arc<S> {
        assert!(
            index < self.size(),
            "stripe index {index} out of range for {} stripes",
            self.size()
        );
        match &self.storage {
            Storage::Eager(segments) => Arc::clone(&segments[index]),
            Storage::Lazy(lazy) => lazy.get_at(index),
        }
    }

    /// Returns one segment per key, sorted by stripe index.
    ///
    /// Keys sharing a stripe yield the same `Arc` in adjacent positions.
    /// Acquire the segments in the returned order.
    ///
    /// ```
    /// use std::sync::Arc;
    /// use stripekit::sync::Striped;
    ///
    /// let locks = Striped::lock(1);
    /// let segments = locks.bulk_get(["a", "b", "c"].iter());
    /// assert_eq!(segments.len(), 3);
    /// assert!(Arc::ptr_eq(&segments[0], &segments[2]));
    /// ```
    pub fn bulk_get<'k, K, I>(&self, keys: I) -> Vec<Arc<S>>
    where
        K: Hash + ?Sized + 'k,
        I: IntoIterator<Item = &'k K>,
    {
        let mut indexes: Vec<usize> = keys
            .into_iter()
            .map(|key| self.indexer.index_for(key))
            .collect();
        indexes.sort_unstable();

        let mut segments: Vec<Arc<S>> = Vec::with_capacity(indexes.len());
        let mut previous: Option<usize> = None;
        for index in indexes {
            let segment = match (previous, segments.last()) {
                (Some(prev), Some(last)) if prev == index => Arc::clone(last),
                _ => self.get_at(index),
            };
            segments.push(segment);
            previous = Some(index);
        }
        segments
    }

    /// Stripe index for `key`.
    #[inline]
    pub fn index_for<K: Hash + ?Sized>(&self, key: &K) -> usize {
        self.indexer.index_for(key)
    }

    /// Number of addressable stripes (a power of two, or `2^31`).
    pub fn size(&self) -> usize {
        self.indexer.size()
    }

    /// `true` when segments are created on first use.
    pub fn is_lazy(&self) -> bool {
        matches!(self.storage, Storage::Lazy(_))
    }

    /// Storage layout chosen at construction.
    pub fn layout(&self) -> StripeLayout {
        match &self.storage {
            Storage::Eager(_) => StripeLayout::Eager,
            Storage::Lazy(lazy) if lazy.is_sparse() => StripeLayout::LazySparse,
            Storage::Lazy(_) => StripeLayout::LazyDense,
        }
    }

    /// Number of segments currently alive. Eager sets report `size()`.
    pub fn live_segments(&self) -> usize {
        match &self.storage {
            Storage::Eager(segments) => segments.len(),
            Storage::Lazy(lazy) => lazy.live(),
        }
    }

    /// Clears lazy slots whose segment has been dropped; returns how many.
    ///
    /// Creation already sweeps opportunistically; this forces a full pass.
    /// Always `0` for eager sets.
    pub fn reclaim(&self) -> usize {
        match &self.storage {
            Storage::Eager(_) => 0,
            Storage::Lazy(lazy) => lazy.reclaim(),
        }
    }
}

impl Striped<Mutex<()>> {
    /// `stripes` eagerly built mutexes.
    pub fn lock(stripes: usize) -> Self {
        Self::eager(stripes, || Mutex::new(()))
    }

    /// `stripes` lazily built, weakly held mutexes.
    pub fn lazy_weak_lock(stripes: usize) -> Self {
        Self::lazy(stripes, || Mutex::new(()))
    }

    /// Locks the segment for `key`. The guard keeps the segment alive.
    pub fn lock_for<K: Hash + ?Sized>(&self, key: &K) -> ArcMutexGuard<RawMutex, ()> {
        self.get(key).lock_arc()
    }

    /// Locks the segments of all `keys` in stripe order, once per distinct
    /// segment.
    pub fn lock_all<'k, K, I>(&self, keys: I) -> Vec<ArcMutexGuard<RawMutex, ()>>
    where
        K: Hash + ?Sized + 'k,
        I: IntoIterator<Item = &'k K>,
    {
        distinct(self.bulk_get(keys))
            .into_iter()
            .map(|segment| segment.lock_arc())
            .collect()
    }
}

impl Striped<Semaphore> {
    /// `stripes` eagerly built semaphores of `permits` permits each.
    ///
    /// # Panics
    ///
    /// Panics if `stripes` or `permits` is zero.
    pub fn semaphore(stripes: usize, permits: usize) -> Self {
        assert!(permits > 0, "permits must be > 0");
        Self::eager(stripes, || Semaphore::new(permits))
    }

    /// `stripes` lazily built, weakly held semaphores of `permits` permits.
    pub fn lazy_weak_semaphore(stripes: usize, permits: usize) -> Self {
        assert!(permits > 0, "permits must be > 0");
        Self::lazy(stripes, move || Semaphore::new(permits))
    }

    /// Acquires a permit from the segment for `key`, blocking if needed.
    pub fn acquire_for<K: Hash + ?Sized>(&self, key: &K) -> ArcSemaphorePermit {
        self.get(key).acquire_arc()
    }
}

impl Striped<RwLock<()>> {
    /// `stripes` eagerly built read-write locks.
    pub fn read_write_lock(stripes: usize) -> Self {
        Self::eager(stripes, || RwLock::new(()))
    }

    /// `stripes` lazily built, weakly held read-write locks.
    pub fn lazy_weak_read_write_lock(stripes: usize) -> Self {
        Self::lazy(stripes, || RwLock::new(()))
    }

    /// Read-locks the segment for `key`. The guard keeps the segment alive.
    pub fn read_for<K: Hash + ?Sized>(&self, key: &K) -> ArcRwLockReadGuard<RawRwLock, ()> {
        self.get(key).read_arc()
    }

    /// Write-locks the segment for `key`. The guard keeps the segment alive.
    pub fn write_for<K: Hash + ?Sized>(&self, key: &K) -> ArcRwLockWriteGuard<RawRwLock, ()> {
        self.get(key).write_arc()
    }

    /// Write-locks the segments of all `keys` in stripe order, once per
    /// distinct segment.
    pub fn write_all<'k, K, I>(&self, keys: I) -> Vec<ArcRwLockWriteGuard<RawRwLock, ()>>
    where
        K: Hash + ?Sized + 'k,
        I: IntoIterator<Item = &'k K>,
    {
        distinct(self.bulk_get(keys))
            .into_iter()
            .map(|segment| segment.write_arc())
            .collect()
    }
}

/// Drops adjacent duplicates from a `bulk_get` result.
fn distinct<S>(mut segments: Vec<Arc<S>>) -> Vec<Arc<S>> {
    segments.dedup_by(|a, b| Arc::ptr_eq(a, b));
    segments
}

impl<S> fmt::Debug for Striped<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Striped")
            .field("size", &self.size())
            .field("layout", &self.layout())
            .finish()
    }
}
