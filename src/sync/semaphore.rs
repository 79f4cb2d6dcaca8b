//! Blocking counting semaphore used as a striped segment.
//!
//! Permits are an atomic counter with a lock-free fast path; threads that find
//! no permit park on a `parking_lot::Condvar` until one is released.
//!
//! ```
//! use std::sync::Arc;
//! use stripekit::sync::Semaphore;
//!
//! let sem = Arc::new(Semaphore::new(2));
//! let a = sem.acquire();
//! let b = Arc::clone(&sem).acquire_arc();
//! assert!(sem.try_acquire().is_none());
//! drop(a);
//! assert_eq!(sem.available_permits(), 1);
//! drop(b);
//! assert_eq!(sem.available_permits(), 2);
//! ```

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

/// A counting semaphore with blocking acquire.
pub struct Semaphore {
    permits: AtomicUsize,
    waiters: Mutex<usize>,
    available: Condvar,
}

impl Semaphore {
    /// Creates a semaphore holding `permits` permits.
    pub fn new(permits: usize) -> Self {
        Self {
            permits: AtomicUsize::new(permits),
            waiters: Mutex::new(0),
            available: Condvar::new(),
        }
    }

    /// Blocks until a permit is available and returns it.
    pub fn acquire(&self) -> SemaphorePermit<'_> {
        self.acquire_raw();
        SemaphorePermit { semaphore: self }
    }

    /// Like [`acquire`](Self::acquire), but the permit owns a strong reference
    /// to the semaphore, keeping it alive while the permit is held.
    pub fn acquire_arc(self: Arc<Self>) -> ArcSemaphorePermit {
        self.acquire_raw();
        ArcSemaphorePermit { semaphore: self }
    }

    /// Takes a permit if one is immediately available.
    pub fn try_acquire(&self) -> Option<SemaphorePermit<'_>> {
        self.try_take().then(|| SemaphorePermit { semaphore: self })
    }

    /// Owned version of [`try_acquire`](Self::try_acquire).
    pub fn try_acquire_arc(self: Arc<Self>) -> Option<ArcSemaphorePermit> {
        if self.try_take() {
            Some(ArcSemaphorePermit { semaphore: self })
        } else {
            None
        }
    }

    /// Waits up to `timeout` for a permit.
    pub fn try_acquire_for(&self, timeout: Duration) -> Option<SemaphorePermit<'_>> {
        if self.try_take() {
            return Some(SemaphorePermit { semaphore: self });
        }
        let deadline = Instant::now() + timeout;
        let mut waiters = self.waiters.lock();
        *waiters += 1;
        let acquired = loop {
            if self.try_take() {
                break true;
            }
            if self.available.wait_until(&mut waiters, deadline).timed_out() {
                break self.try_take();
            }
        };
        *waiters -= 1;
        acquired.then(|| SemaphorePermit { semaphore: self })
    }

    /// Returns `n` permits to the semaphore, waking waiters.
    ///
    /// Normally permits come back by dropping a guard; this is for callers
    /// that manage permits manually via [`SemaphorePermit::forget`].
    pub fn add_permits(&self, n: usize) {
        self.permits.fetch_add(n, Ordering::Release);
        let waiters = self.waiters.lock();
        if *waiters > 0 {
            self.available.notify_all();
        }
    }

    pub fn available_permits(&self) -> usize {
        self.permits.load(Ordering::Acquire)
    }

    fn acquire_raw(&self) {
        if self.try_take() {
            return;
        }
        let mut waiters = self.waiters.lock();
        *waiters += 1;
        while !self.try_take() {
            self.available.wait(&mut waiters);
        }
        *waiters -= 1;
    }

    fn try_take(&self) -> bool {
        let mut current = self.permits.load(Ordering::Acquire);
        loop {
            if current == 0 {
                return false;
            }
            match self.permits.compare_exchange_weak(
                current,
                current - 1,
                Ordering::Acquire,
                Ordering::Acquire,
            ) {
                Ok(_) => return true,
                Err(actual) => current = actual,
            }
        }
    }
}

impl fmt::Debug for Semaphore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Semaphore")
            .field("permits", &self.available_permits())
            .finish()
    }
}

/// A permit borrowed from a [`Semaphore`]; released on drop.
#[must_use = "the permit is released immediately if not held"]
pub struct SemaphorePermit<'a> {
    semaphore: &'a Semaphore,
}

impl SemaphorePermit<'_> {
    /// Consumes the permit without returning it to the semaphore.
    pub fn forget(self) {
        std::mem::forget(self);
    }
}

impl Drop for SemaphorePermit<'_> {
    fn drop(&mut self) {
        self.semaphore.add_permits(1);
    }
}

/// A permit that keeps its [`Semaphore`] alive; released on drop.
#[must_use = "the permit is released immediately if not held"]
pub struct ArcSemaphorePermit {
    semaphore: Arc<Semaphore>,
}

impl ArcSemaphorePermit {
    /// The semaphore this permit came from.
    pub fn semaphore(&self) -> &Arc<Semaphore> {
        &self.semaphore
    }
}

impl Drop for ArcSemaphorePermit {
    fn drop(&mut self) {
        self.semaphore.add_permits(1);
    }
}
