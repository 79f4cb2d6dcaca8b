//! DHAT heap profiler for stripekit.
//!
//! Run with: cargo run --bin dhat_profile --release --features dhat-heap
//! View results: Open dhat-heap.json in <https://nnethercote.github.io/dh_view/dh_view.html>
//!
//! Compares the footprint of the striped layouts: eager sets pay for every
//! segment up front, lazy dense sets pay one weak slot per stripe, and lazy
//! sparse sets pay only for segments that are alive.

#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

use parking_lot::Mutex;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use stripekit::builder::StripedBuilder;
use stripekit::sync::{AdmissionQueue, Striped};

const OPERATIONS: usize = 100_000;

fn heap_bytes() -> usize {
    dhat::HeapStats::get().curr_bytes
}

/// Touches random keys, holding a sliding window of segments alive.
fn touch_workload(striped: &Striped<Mutex<u64>>, universe: u64, window: usize, seed: u64) {
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut held = Vec::with_capacity(window);

    for _ in 0..OPERATIONS {
        let key = rng.gen_range(0..universe);
        let segment = striped.get(&key);
        *segment.lock() += 1;
        if held.len() == window {
            held.swap_remove(rng.gen_range(0..window));
        }
        held.push(segment);
    }
}

fn profile_layout(name: &str, stripes: usize, lazy: bool) {
    println!("=== Profiling {name} ({stripes} stripes) ===");
    let before = heap_bytes();

    let mut builder = StripedBuilder::new(stripes);
    if lazy {
        builder = builder.lazy();
    }
    let striped = builder.build(|| Mutex::new(0u64));
    println!("  After construction: {} bytes", heap_bytes().saturating_sub(before));

    touch_workload(&striped, 1 << 20, 64, 42);
    let reclaimed = striped.reclaim();
    println!("  After workload:     {} bytes", heap_bytes().saturating_sub(before));
    println!("  Live segments:      {}", striped.live_segments());
    println!("  Reclaimed slots:    {reclaimed}");
}

fn profile_admission_queue() {
    println!("=== Profiling AdmissionQueue ===");
    let before = heap_bytes();
    let queue = AdmissionQueue::new(|n: &u64| n % 4 != 0);

    for i in 0..OPERATIONS as u64 {
        let _ = queue.put(i);
        if i % 2 == 0 {
            let _ = queue.poll();
        }
    }
    println!("  Queued: {}", queue.len());
    println!("  Retained: {} bytes", heap_bytes().saturating_sub(before));

    let mut sink = Vec::new();
    queue.drain_to(&mut sink);
    println!("  Drained: {}", sink.len());
}

fn main() {
    let _profiler = dhat::Profiler::new_heap();

    println!("stripekit DHAT Heap Profiling");
    println!("=============================\n");

    profile_layout("eager", 1 << 14, false);
    profile_layout("lazy dense", 1 << 9, true);
    profile_layout("lazy sparse", 1 << 24, true);
    profile_admission_queue();

    println!("\n=============================");
    println!("Profiling complete. Results written to dhat-heap.json");
}
