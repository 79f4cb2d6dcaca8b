// ==============================================
// SELECTOR BEHAVIOR TESTS (integration)
// ==============================================
//
// Cross-strategy checks through the Selector trait: fixture sequences,
// frequency convergence and coverage.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use stripekit::select::{
    RandomSelector, RoundRobinSelector, SmoothWeightedSelector, WeightedListSelector,
    WeightedRandomSelector,
};
use stripekit::traits::Selector;

fn draw<T: Clone, S: Selector<T>>(selector: &mut S, n: usize) -> Vec<T> {
    (0..n).filter_map(|_| selector.select().cloned()).collect()
}

fn frequencies<S: Selector<&'static str>>(selector: &mut S, names: &[&str], n: usize) -> Vec<f64> {
    let mut counts = vec![0usize; names.len()];
    for _ in 0..n {
        let picked = *selector.select().unwrap();
        let index = names.iter().position(|name| *name == picked).unwrap();
        counts[index] += 1;
    }
    counts.into_iter().map(|c| c as f64 / n as f64).collect()
}

// ==============================================
// Fixtures
// ==============================================

mod fixtures {
    use super::*;

    #[test]
    fn smooth_weighted_five_three_two() {
        let mut selector = SmoothWeightedSelector::new();
        selector.add("A", 5);
        selector.add("B", 3);
        selector.add("C", 2);
        assert_eq!(
            draw(&mut selector, 10),
            vec!["A", "B", "C", "A", "A", "B", "A", "C", "B", "A"]
        );
    }

    #[test]
    fn round_robin_visits_each_then_restarts() {
        let names = ["n0", "n1", "n2", "n3", "n4"];
        let mut selector: RoundRobinSelector<&str> = names.into_iter().collect();
        let first_pass = draw(&mut selector, names.len());
        assert_eq!(first_pass, names.to_vec());
        assert_eq!(selector.select(), Some(&"n0"));
    }

    #[test]
    fn every_strategy_returns_none_when_empty() {
        assert!(RandomSelector::<u8>::new().select().is_none());
        assert!(RoundRobinSelector::<u8>::new().select().is_none());
        assert!(WeightedRandomSelector::<u8>::new().select().is_none());
        assert!(WeightedListSelector::<u8>::new().select().is_none());
        assert!(SmoothWeightedSelector::<u8>::new().select().is_none());
    }
}

// ==============================================
// Proportionality
// ==============================================

mod proportionality {
    use super::*;

    const TRIALS: usize = 100_000;
    const NAMES: [&str; 4] = ["D1", "D2", "D3", "D4"];

    fn assert_close_to_one_two_three_four(observed: &[f64]) {
        for (index, share) in observed.iter().enumerate() {
            let expected = (index + 1) as f64 / 10.0;
            assert!(
                (share - expected).abs() / expected < 0.05,
                "{}: observed {share:.4}, expected {expected:.4}",
                NAMES[index]
            );
        }
    }

    #[test]
    fn weighted_random_converges() {
        let mut selector = WeightedRandomSelector::with_rng(ChaCha8Rng::seed_from_u64(2024));
        for (index, name) in NAMES.iter().enumerate() {
            selector.add(*name, index as u64 + 1);
        }
        assert_close_to_one_two_three_four(&frequencies(&mut selector, &NAMES, TRIALS));
    }

    #[test]
    fn weighted_list_converges() {
        let mut selector = WeightedListSelector::with_rng(ChaCha8Rng::seed_from_u64(99));
        for (index, name) in NAMES.iter().enumerate() {
            selector.add(*name, index as u64 + 1);
        }
        assert_close_to_one_two_three_four(&frequencies(&mut selector, &NAMES, TRIALS));
    }

    #[test]
    fn smooth_weighted_is_exact_per_cycle() {
        let mut selector = SmoothWeightedSelector::new();
        for (index, name) in NAMES.iter().enumerate() {
            selector.add(*name, index as u32 + 1);
        }
        let observed = frequencies(&mut selector, &NAMES, 10_000);
        for (index, share) in observed.iter().enumerate() {
            assert_eq!(*share, (index + 1) as f64 / 10.0);
        }
    }

    #[test]
    fn uniform_random_is_even() {
        let mut selector = RandomSelector::with_rng(ChaCha8Rng::seed_from_u64(5));
        for name in NAMES {
            selector.add(name);
        }
        for share in frequencies(&mut selector, &NAMES, TRIALS) {
            assert!((share - 0.25).abs() < 0.0125, "observed {share}");
        }
    }
}

// ==============================================
// Smoothness
// ==============================================

mod smoothness {
    use super::*;

    #[test]
    fn heavy_item_never_runs_longer_than_its_share() {
        let mut selector = SmoothWeightedSelector::new();
        selector.add('H', 4);
        selector.add('L', 1);
        let picks = draw(&mut selector, 50);

        let mut longest = 0;
        let mut run = 0;
        for pick in &picks {
            run = if *pick == 'H' { run + 1 } else { 0 };
            longest = longest.max(run);
        }
        assert!(longest <= 4);
        assert_eq!(picks.iter().filter(|p| **p == 'L').count(), 10);
    }
}
