#![no_main]

use libfuzzer_sys::fuzz_target;
use stripekit::ds::BoundedPriorityQueue;

// Fuzz arbitrary offer/pop sequences on BoundedPriorityQueue
//
// A sorted Vec truncated to capacity is the reference: after every step the
// queue must hold exactly the smallest `capacity` values offered and not yet
// popped.
fuzz_target!(|data: &[u8]| {
    let Some((&cap, ops)) = data.split_first() else {
        return;
    };
    let capacity = usize::from(cap % 16) + 1;
    let mut queue = BoundedPriorityQueue::new(capacity);
    let mut model: Vec<u8> = Vec::new();

    for pair in ops.chunks_exact(2) {
        match pair[0] % 4 {
            0 | 1 => {
                assert!(queue.offer(pair[1]));
                model.push(pair[1]);
                model.sort_unstable();
                model.truncate(capacity);
            },
            2 => assert_eq!(queue.pop_worst(), model.pop()),
            _ => assert_eq!(queue.peek_worst(), model.last()),
        }

        queue.check_invariants().unwrap();
        assert_eq!(queue.len(), model.len());
        assert!(queue.len() <= capacity);
    }

    assert_eq!(queue.into_sorted_vec(), model);
});
