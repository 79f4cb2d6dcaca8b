//! Unbounded FIFO with a per-element admission check.
//!
//! Every producer call first asks an [`AdmissionPolicy`] whether the element
//! may enter. A rejected element is dropped silently: `put` still returns
//! `Ok(())`, `offer` returns `false`. Admitted elements follow plain unbounded
//! queue semantics; consumers block in [`take`](AdmissionQueue::take) while
//! the queue is empty.
//!
//! ## Cancellation
//!
//! [`cancel`](AdmissionQueue::cancel) wakes every blocked consumer with
//! [`Cancelled`] and makes all later producer calls and blocking consumer
//! calls return [`Cancelled`]. Elements already queued stay reachable through
//! the non-blocking [`poll`](AdmissionQueue::poll) and
//! [`drain_to`](AdmissionQueue::drain_to).
//!
//! ## Memory Backpressure
//!
//! ```
//! use stripekit::sync::AdmissionQueue;
//!
//! // Admit work only while more than 64 MiB is available.
//! let queue = AdmissionQueue::memory_limited(64 * 1024 * 1024);
//! if queue.offer("job") {
//!     assert_eq!(queue.poll(), Some("job"));
//! }
//! ```
//!
//! ## Custom Policies
//!
//! ```
//! use stripekit::sync::AdmissionQueue;
//!
//! let queue = AdmissionQueue::new(|n: &u32| n % 2 == 0);
//! queue.put(1).unwrap();
//! queue.put(2).unwrap();
//! assert_eq!(queue.len(), 1);
//! assert_eq!(queue.take().unwrap(), 2);
//! ```

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::error::Cancelled;
use crate::sync::memory::MemorySampler;

/// Decides whether an element may enter an [`AdmissionQueue`].
///
/// Called once per producer call, outside the queue lock. Must be fast and
/// must not block.
pub trait AdmissionPolicy<T>: Send + Sync {
    fn admit(&self, item: &T) -> bool;
}

impl<T, F> AdmissionPolicy<T> for F
where
    F: Fn(&T) -> bool + Send + Sync,
{
    #[inline]
    fn admit(&self, item: &T) -> bool {
        self(item)
    }
}

/// Admits everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct AdmitAll;

impl<T> AdmissionPolicy<T> for AdmitAll {
    #[inline]
    fn admit(&self, _item: &T) -> bool {
        true
    }
}

/// Admits while sampled available memory is strictly above `floor` bytes.
#[derive(Debug, Clone)]
pub struct MemoryFloor {
    floor: u64,
    sampler: Arc<MemorySampler>,
}

impl MemoryFloor {
    pub fn new(floor: u64, sampler: Arc<MemorySampler>) -> Self {
        Self { floor, sampler }
    }

    pub fn floor(&self) -> u64 {
        self.floor
    }

    pub fn sampler(&self) -> &Arc<MemorySampler> {
        &self.sampler
    }
}

impl<T> AdmissionPolicy<T> for MemoryFloor {
    #[inline]
    fn admit(&self, _item: &T) -> bool {
        self.sampler.available() > self.floor
    }
}

struct State<T> {
    items: VecDeque<T>,
    cancelled: bool,
}

/// Unbounded blocking FIFO guarded by an admission policy.
pub struct AdmissionQueue<T, P = AdmitAll> {
    state: Mutex<State<T>>,
    not_empty: Condvar,
    policy: P,
}

impl<T> AdmissionQueue<T, AdmitAll> {
    /// A queue that admits every element.
    pub fn unbounded() -> Self {
        Self::new(AdmitAll)
    }
}

impl<T> Default for AdmissionQueue<T, AdmitAll> {
    fn default() -> Self {
        Self::unbounded()
    }
}

impl<T> AdmissionQueue<T, MemoryFloor> {
    /// A queue backed by the process-wide [`MemorySampler`].
    pub fn memory_limited(floor: u64) -> Self {
        Self::with_sampler(floor, MemorySampler::global())
    }

    /// A memory-limited queue reading a caller-owned sampler.
    pub fn with_sampler(floor: u64, sampler: Arc<MemorySampler>) -> Self {
        Self::new(MemoryFloor::new(floor, sampler))
    }
}

impl<T, P: AdmissionPolicy<T>> AdmissionQueue<T, P> {
    pub fn new(policy: P) -> Self {
        Self {
            state: Mutex::new(State {
                items: VecDeque::new(),
                cancelled: false,
            }),
            not_empty: Condvar::new(),
            policy,
        }
    }

    /// Enqueues `item` if admitted.
    ///
    /// Returns `Ok(())` whether or not the item was admitted. Never blocks:
    /// the queue has no capacity bound.
    pub fn put(&self, item: T) -> Result<(), Cancelled> {
        self.enqueue(item).map(|_| ())
    }

    /// Enqueues `item` if admitted; `false` when rejected or cancelled.
    pub fn offer(&self, item: T) -> bool {
        matches!(self.enqueue(item), Ok(true))
    }

    /// Timed form of [`offer`](Self::offer).
    ///
    /// An unbounded queue never waits for room, so `timeout` only matters for
    /// signature parity with bounded queues; cancellation is still reported.
    pub fn offer_timeout(&self, item: T, _timeout: Duration) -> Result<bool, Cancelled> {
        self.enqueue(item)
    }

    /// Removes the head, blocking while the queue is empty.
    pub fn take(&self) -> Result<T, Cancelled> {
        let mut state = self.state.lock();
        loop {
            if state.cancelled {
                return Err(Cancelled);
            }
            if let Some(item) = state.items.pop_front() {
                return Ok(item);
            }
            self.not_empty.wait(&mut state);
        }
    }

    /// Removes the head if present.
    pub fn poll(&self) -> Option<T> {
        self.state.lock().items.pop_front()
    }

    /// Removes the head, waiting up to `timeout` for one to arrive.
    pub fn poll_timeout(&self, timeout: Duration) -> Result<Option<T>, Cancelled> {
        let deadline = Instant::now() + timeout;
        let mut state = self.state.lock();
        loop {
            if state.cancelled {
                return Err(Cancelled);
            }
            if let Some(item) = state.items.pop_front() {
                return Ok(Some(item));
            }
            if self.not_empty.wait_until(&mut state, deadline).timed_out() {
                return Ok(state.items.pop_front());
            }
        }
    }

    /// Moves every queued element into `sink`; returns how many moved.
    pub fn drain_to<E: Extend<T>>(&self, sink: &mut E) -> usize {
        let drained: Vec<T> = self.state.lock().items.drain(..).collect();
        let count = drained.len();
        sink.extend(drained);
        count
    }

    pub fn len(&self) -> usize {
        self.state.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().items.is_empty()
    }

    /// Cancels the queue, waking all blocked consumers. Idempotent.
    pub fn cancel(&self) {
        let mut state = self.state.lock();
        if state.cancelled {
            return;
        }
        state.cancelled = true;
        tracing::debug!(queued = state.items.len(), "admission queue cancelled");
        drop(state);
        self.not_empty.notify_all();
    }

    pub fn is_cancelled(&self) -> bool {
        self.state.lock().cancelled
    }

    pub fn policy(&self) -> &P {
        &self.policy
    }

    /// `Ok(true)` if queued, `Ok(false)` if the policy refused it.
    fn enqueue(&self, item: T) -> Result<bool, Cancelled> {
        if self.is_cancelled() {
            return Err(Cancelled);
        }
        if !self.policy.admit(&item) {
            tracing::trace!("admission policy rejected element");
            return Ok(false);
        }
        let mut state = self.state.lock();
        if state.cancelled {
            return Err(Cancelled);
        }
        state.items.push_back(item);
        drop(state);
        self.not_empty.notify_one();
        Ok(true)
    }
}

impl<T, P> fmt::Debug for AdmissionQueue<T, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("AdmissionQueue")
            .field("len", &state.items.len())
            .field("cancelled", &state.cancelled)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
    use std::thread;

    use crate::sync::memory::SamplerConfig;

    mod admission {
        use super::*;

        #[test]
        fn reject_all_never_grows() {
            let queue: AdmissionQueue<u32, _> = AdmissionQueue::new(|_: &u32| false);
            for i in 0..100 {
                queue.put(i).unwrap();
                assert!(!queue.offer(i));
                assert!(!queue.offer_timeout(i, Duration::from_millis(1)).unwrap());
            }
            assert!(queue.is_empty());
        }

        #[test]
        fn admit_all_is_plain_fifo() {
            let queue = AdmissionQueue::unbounded();
            queue.put(1).unwrap();
            assert!(queue.offer(2));
            assert!(queue.offer_timeout(3, Duration::ZERO).unwrap());
            assert_eq!(queue.len(), 3);
            assert_eq!(queue.take().unwrap(), 1);
            assert_eq!(queue.poll(), Some(2));
            assert_eq!(queue.poll_timeout(Duration::ZERO).unwrap(), Some(3));
            assert_eq!(queue.poll(), None);
        }

        #[test]
        fn stateful_policy_is_consulted_per_call() {
            let open = Arc::new(AtomicBool::new(true));
            let gate = Arc::clone(&open);
            let queue = AdmissionQueue::new(move |_: &&str| gate.load(Ordering::SeqCst));

            assert!(queue.offer("a"));
            open.store(false, Ordering::SeqCst);
            assert!(!queue.offer("b"));
            open.store(true, Ordering::SeqCst);
            assert!(queue.offer("c"));

            let mut out = Vec::new();
            assert_eq!(queue.drain_to(&mut out), 2);
            assert_eq!(out, vec!["a", "c"]);
        }
    }

    mod memory {
        use super::*;

        static AVAILABLE: AtomicU64 = AtomicU64::new(0);

        fn scripted() -> u64 {
            AVAILABLE.load(Ordering::SeqCst)
        }

        #[test]
        fn admits_only_strictly_above_floor() {
            AVAILABLE.store(1000, Ordering::SeqCst);
            let sampler =
                MemorySampler::start(SamplerConfig::new(Duration::from_secs(60), scripted));
            let queue = AdmissionQueue::with_sampler(1000, Arc::clone(&sampler));
            assert!(!queue.offer(1));

            AVAILABLE.store(1001, Ordering::SeqCst);
            sampler.sample_now();
            assert!(queue.offer(2));

            AVAILABLE.store(10, Ordering::SeqCst);
            sampler.sample_now();
            queue.put(3).unwrap();
            assert_eq!(queue.len(), 1);
            assert_eq!(queue.policy().floor(), 1000);
        }

        #[test]
        fn zero_floor_with_global_sampler() {
            let queue = AdmissionQueue::memory_limited(0);
            assert!(Arc::ptr_eq(queue.policy().sampler(), &MemorySampler::global()));
            assert!(queue.offer(()));
        }
    }

    mod cancellation {
        use super::*;

        #[test]
        fn cancel_wakes_blocked_take() {
            let queue: Arc<AdmissionQueue<u32>> = Arc::new(AdmissionQueue::unbounded());
            let consumer = {
                let queue = Arc::clone(&queue);
                thread::spawn(move || queue.take())
            };
            thread::sleep(Duration::from_millis(20));
            queue.cancel();
            assert_eq!(consumer.join().unwrap(), Err(Cancelled));
        }

        #[test]
        fn producers_see_cancellation() {
            let queue = AdmissionQueue::unbounded();
            queue.cancel();
            queue.cancel();
            assert!(queue.is_cancelled());
            assert_eq!(queue.put(1), Err(Cancelled));
            assert_eq!(queue.offer_timeout(1, Duration::ZERO), Err(Cancelled));
            assert!(!queue.offer(1));
            assert_eq!(queue.poll_timeout(Duration::from_millis(1)), Err(Cancelled));
        }

        #[test]
        fn queued_items_survive_cancel() {
            let queue = AdmissionQueue::unbounded();
            queue.put("left").unwrap();
            queue.cancel();
            assert_eq!(queue.take(), Err(Cancelled));
            assert_eq!(queue.poll(), Some("left"));
        }

        #[test]
        fn poll_timeout_expires_empty() {
            let queue: AdmissionQueue<u8> = AdmissionQueue::unbounded();
            let start = Instant::now();
            assert_eq!(queue.poll_timeout(Duration::from_millis(15)), Ok(None));
            assert!(start.elapsed() >= Duration::from_millis(15));
        }
    }

    #[test]
    fn take_receives_from_producer_thread() {
        let queue = Arc::new(AdmissionQueue::unbounded());
        let producer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                for i in 0..100u32 {
                    queue.put(i).unwrap();
                }
            })
        };
        let received: Vec<u32> = (0..100).map(|_| queue.take().unwrap()).collect();
        producer.join().unwrap();
        assert_eq!(received, (0..100).collect::<Vec<_>>());
    }
}
