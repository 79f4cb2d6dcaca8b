// ==============================================
// STRIPED SEGMENT CONCURRENCY TESTS (integration)
// ==============================================
//
// Identity, mutual exclusion and deadlock freedom of Striped under real
// thread contention. These need multi-threaded execution and cannot live
// inline.

use std::sync::atomic::{AtomicI64, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

use parking_lot::Mutex;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use stripekit::sync::Striped;

const THREADS: usize = 8;

// ==============================================
// Segment Identity
// ==============================================

mod identity {
    use super::*;

    #[test]
    fn eager_key_maps_to_one_segment_across_threads() {
        let striped = Arc::new(Striped::lock(64));
        let barrier = Arc::new(Barrier::new(THREADS));

        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let striped = Arc::clone(&striped);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    striped.get(&"shared-key")
                })
            })
            .collect();

        let segments: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        for segment in &segments[1..] {
            assert!(Arc::ptr_eq(&segments[0], segment));
        }
    }

    #[test]
    fn lazy_creation_race_publishes_one_segment() {
        for sparse_cutoff in [1024, 1] {
            for _ in 0..100 {
                let created = Arc::new(AtomicUsize::new(0));
                let counter = Arc::clone(&created);
                let striped = Arc::new(Striped::lazy_with_cutoff(64, sparse_cutoff, move || {
                    counter.fetch_add(1, Ordering::Relaxed);
                    Mutex::new(())
                }));
                let barrier = Arc::new(Barrier::new(THREADS));

                let handles: Vec<_> = (0..THREADS)
                    .map(|_| {
                        let striped = Arc::clone(&striped);
                        let barrier = Arc::clone(&barrier);
                        thread::spawn(move || {
                            barrier.wait();
                            striped.get_at(17)
                        })
                    })
                    .collect();

                // Every thread still holds its Arc, so losers of the race must
                // have been handed the winner.
                let segments: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
                for segment in &segments[1..] {
                    assert!(Arc::ptr_eq(&segments[0], segment));
                }
                assert!(created.load(Ordering::Relaxed) >= 1);
                assert_eq!(striped.live_segments(), 1);
            }
        }
    }
}

// ==============================================
// Mutual Exclusion
// ==============================================
//
// Counters are updated with a separate load and store, which only stays
// correct if the stripe really serializes the writers.

mod exclusion {
    use super::*;

    const ITERATIONS: usize = 2_000;
    const KEYS: u64 = 32;

    fn hammer<F>(guarded_increment: F) -> Vec<AtomicU64>
    where
        F: Fn(u64, &AtomicU64) + Send + Sync + 'static,
    {
        let counters: Arc<Vec<AtomicU64>> =
            Arc::new((0..KEYS).map(|_| AtomicU64::new(0)).collect());
        let guarded_increment = Arc::new(guarded_increment);
        let barrier = Arc::new(Barrier::new(THREADS));

        let handles: Vec<_> = (0..THREADS)
            .map(|t| {
                let counters = Arc::clone(&counters);
                let increment = Arc::clone(&guarded_increment);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    for i in 0..ITERATIONS {
                        let key = ((t + i) as u64) % KEYS;
                        increment(key, &counters[key as usize]);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        Arc::try_unwrap(counters).unwrap_or_else(|_| panic!("counters still shared"))
    }

    fn total(counters: &[AtomicU64]) -> u64 {
        counters.iter().map(|c| c.load(Ordering::SeqCst)).sum()
    }

    fn split_increment(counter: &AtomicU64) {
        let value = counter.load(Ordering::Relaxed);
        thread::yield_now();
        counter.store(value + 1, Ordering::Relaxed);
    }

    #[test]
    fn eager_mutex_stripes_serialize_writers() {
        let striped = Arc::new(Striped::lock(8));
        let counters = hammer(move |key, counter| {
            let _guard = striped.lock_for(&key);
            split_increment(counter);
        });
        assert_eq!(total(&counters), (THREADS * ITERATIONS) as u64);
    }

    #[test]
    fn lazy_write_lock_stripes_serialize_writers() {
        let striped = Arc::new(Striped::lazy_weak_read_write_lock(16));
        let counters = hammer(move |key, counter| {
            let _guard = striped.write_for(&key);
            split_increment(counter);
        });
        assert_eq!(total(&counters), (THREADS * ITERATIONS) as u64);
    }

    #[test]
    fn lazy_sparse_mutex_stripes_serialize_writers() {
        let striped = Arc::new(Striped::lazy_with_cutoff(4096, 1024, || Mutex::new(())));
        let counters = hammer(move |key, counter| {
            let _guard = striped.get(&key).lock_arc();
            split_increment(counter);
        });
        assert_eq!(total(&counters), (THREADS * ITERATIONS) as u64);
    }

    #[test]
    fn semaphore_stripe_bounds_concurrency() {
        let striped = Arc::new(Striped::semaphore(4, 2));
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let barrier = Arc::new(Barrier::new(THREADS));

        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let striped = Arc::clone(&striped);
                let active = Arc::clone(&active);
                let peak = Arc::clone(&peak);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    for _ in 0..200 {
                        let _permit = striped.acquire_for(&"tenant-a");
                        let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                        peak.fetch_max(now, Ordering::SeqCst);
                        thread::yield_now();
                        active.fetch_sub(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert!(peak.load(Ordering::SeqCst) <= 2);
        assert_eq!(striped.get(&"tenant-a").available_permits(), 2);
    }
}

// ==============================================
// Ordered Multi-key Locking
// ==============================================
//
// Threads move money between random account pairs, locking both accounts'
// stripes through lock_all. Opposite-direction transfers would deadlock
// without the global stripe order.

mod transfers {
    use super::*;

    const ACCOUNTS: usize = 64;
    const TRANSFERS: usize = 3_000;
    const OPENING_BALANCE: i64 = 1_000;

    #[test]
    fn concurrent_transfers_conserve_total() {
        for striped in [Striped::lock(16), Striped::lazy_weak_lock(16)] {
            let striped = Arc::new(striped);
            let balances: Arc<Vec<AtomicI64>> = Arc::new(
                (0..ACCOUNTS)
                    .map(|_| AtomicI64::new(OPENING_BALANCE))
                    .collect(),
            );
            let barrier = Arc::new(Barrier::new(THREADS));

            let handles: Vec<_> = (0..THREADS)
                .map(|t| {
                    let striped = Arc::clone(&striped);
                    let balances = Arc::clone(&balances);
                    let barrier = Arc::clone(&barrier);
                    thread::spawn(move || {
                        let mut rng = SmallRng::seed_from_u64(t as u64);
                        barrier.wait();
                        for _ in 0..TRANSFERS {
                            let from = rng.gen_range(0..ACCOUNTS);
                            let to = rng.gen_range(0..ACCOUNTS);
                            let amount = rng.gen_range(1..10);

                            let _guards = striped.lock_all([&from, &to]);
                            let debit = balances[from].load(Ordering::Relaxed);
                            balances[from].store(debit - amount, Ordering::Relaxed);
                            let credit = balances[to].load(Ordering::Relaxed);
                            balances[to].store(credit + amount, Ordering::Relaxed);
                        }
                    })
                })
                .collect();
            for handle in handles {
                handle.join().unwrap();
            }

            let total: i64 = balances.iter().map(|b| b.load(Ordering::SeqCst)).sum();
            assert_eq!(total, OPENING_BALANCE * ACCOUNTS as i64);
        }
    }

    #[test]
    fn bulk_get_order_is_consistent_across_threads() {
        let striped = Arc::new(Striped::lazy_weak_lock(32));
        let keys: Vec<String> = (0..100).map(|i| format!("key-{i}")).collect();
        let mut reversed = keys.clone();
        reversed.reverse();

        let forward = striped.bulk_get(keys.iter());
        let backward = striped.bulk_get(reversed.iter());
        assert_eq!(forward.len(), backward.len());
        for (a, b) in forward.iter().zip(&backward) {
            assert!(Arc::ptr_eq(a, b));
        }
    }
}
