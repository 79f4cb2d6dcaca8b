#![no_main]

use libfuzzer_sys::fuzz_target;
use stripekit::select::WeightedListSelector;
use stripekit::traits::Selector;

// Fuzz add/remove/select on WeightedListSelector
//
// Individual weights recovered from the cumulative sums must always match
// what was added, and selection must only ever return a live item.
fuzz_target!(|data: &[u8]| {
    let mut pool = WeightedListSelector::new();
    let mut model: Vec<(u8, u64)> = Vec::new();

    for pair in data.chunks_exact(2) {
        let item = pair[1] % 32;
        match pair[0] % 3 {
            0 => {
                let weight = u64::from(pair[0] / 3) + 1;
                pool.add(item, weight);
                model.push((item, weight));
            },
            1 => {
                let expected = model
                    .iter()
                    .position(|(m, _)| *m == item)
                    .map(|index| model.remove(index));
                assert_eq!(pool.take(&item), expected);
            },
            _ => match pool.select() {
                Some(picked) => assert!(model.iter().any(|(m, _)| m == picked)),
                None => assert!(model.is_empty()),
            },
        }

        assert_eq!(pool.len(), model.len());
        assert_eq!(pool.total_weight(), model.iter().map(|(_, w)| w).sum::<u64>());
        let listed: Vec<(u8, u64)> = pool.iter().map(|(item, w)| (*item, w)).collect();
        assert_eq!(listed, model);
    }
});
