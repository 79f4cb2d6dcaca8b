//! Weighted random selection by binary search over cumulative weights.
//!
//! ## Architecture
//!
//! ```text
//!   add(A, 1)  add(B, 2)  add(C, 3)  add(D, 4)
//!
//!   entries:   (A, 1)   (B, 3)   (C, 6)   (D, 10)      total = 10
//!              ├─┤      ├──┤     ├───┤    ├────┤
//!   draw:      0        1..=2    3..=5    6..=9
//!
//!   select: draw r in [0, total), return the first entry whose
//!           cumulative weight is strictly greater than r
//! ```
//!
//! ## Key Components
//!
//! - [`WeightedRandomSelector`]: append-only; `add` is O(1), `select` is
//!   O(log n).
//! - [`WeightedListSelector`]: same selection, plus [`remove`]
//!   (WeightedListSelector::remove), which recovers the removed entry's
//!   weight from its predecessor's cumulative sum and shifts every later sum
//!   down by it (O(n)).
//!
//! ## Example Usage
//!
//! ```
//! use stripekit::select::WeightedListSelector;
//! use stripekit::traits::Selector;
//!
//! let mut pool = WeightedListSelector::new();
//! pool.add("primary", 9);
//! pool.add("canary", 1);
//! assert_eq!(pool.total_weight(), 10);
//!
//! assert!(pool.remove(&"canary"));
//! assert_eq!(pool.select(), Some(&"primary"));
//! ```

use std::fmt;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::error::ConfigError;
use crate::traits::Selector;

/// Items paired with running weight sums.
#[derive(Clone)]
struct Cumulative<T> {
    entries: Vec<(T, u64)>,
}

impl<T> Cumulative<T> {
    const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    fn total(&self) -> u64 {
        self.entries.last().map_or(0, |(_, cumulative)| *cumulative)
    }

    fn try_push(&mut self, item: T, weight: u64) -> Result<(), ConfigError> {
        if weight == 0 {
            return Err(ConfigError::new("weight must be > 0"));
        }
        let cumulative = self
            .total()
            .checked_add(weight)
            .ok_or_else(|| ConfigError::new("total weight overflows u64"))?;
        self.entries.push((item, cumulative));
        Ok(())
    }

    /// Weight of the entry at `index`.
    fn weight_at(&self, index: usize) -> u64 {
        let previous = match index {
            0 => 0,
            _ => self.entries[index - 1].1,
        };
        self.entries[index].1 - previous
    }

    fn position(&self, item: &T) -> Option<usize>
    where
        T: PartialEq,
    {
        self.entries.iter().position(|(candidate, _)| candidate == item)
    }

    fn pick<R: Rng>(&self, rng: &mut R) -> Option<&T> {
        let total = self.total();
        if total == 0 {
            return None;
        }
        let draw = rng.gen_range(0..total);
        let index = self.entries.partition_point(|(_, cumulative)| *cumulative <= draw);
        self.entries.get(index).map(|(item, _)| item)
    }

    fn remove_at(&mut self, index: usize) -> (T, u64) {
        let weight = self.weight_at(index);
        let (item, _) = self.entries.remove(index);
        for (_, cumulative) in &mut self.entries[index..] {
            *cumulative -= weight;
        }
        (item, weight)
    }
}

fn add_or_panic<T>(entries: &mut Cumulative<T>, item: T, weight: u64) {
    if let Err(err) = entries.try_push(item, weight) {
        panic!("{err}");
    }
}

// ---------------------------------------------------------------------------
// WeightedRandomSelector
// ---------------------------------------------------------------------------

/// Append-only weighted random selector.
pub struct WeightedRandomSelector<T, R = SmallRng> {
    entries: Cumulative<T>,
    rng: R,
}

impl<T> WeightedRandomSelector<T, SmallRng> {
    pub fn new() -> Self {
        Self::with_rng(SmallRng::from_entropy())
    }
}

impl<T> Default for WeightedRandomSelector<T, SmallRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, R: Rng> WeightedRandomSelector<T, R> {
    pub fn with_rng(rng: R) -> Self {
        Self {
            entries: Cumulative::new(),
            rng,
        }
    }

    /// Adds `item` with `weight`.
    ///
    /// # Panics
    ///
    /// Panics if `weight` is zero or the total weight overflows.
    pub fn add(&mut self, item: T, weight: u64) {
        add_or_panic(&mut self.entries, item, weight);
    }

    /// Fallible version of [`add`](Self::add).
    pub fn try_add(&mut self, item: T, weight: u64) -> Result<(), ConfigError> {
        self.entries.try_push(item, weight)
    }

    pub fn total_weight(&self) -> u64 {
        self.entries.total()
    }

    /// Weight of the first entry equal to `item`.
    pub fn weight_of(&self, item: &T) -> Option<u64>
    where
        T: PartialEq,
    {
        self.entries
            .position(item)
            .map(|index| self.entries.weight_at(index))
    }
}

impl<T, R: Rng> Selector<T> for WeightedRandomSelector<T, R> {
    fn select(&mut self) -> Option<&T> {
        self.entries.pick(&mut self.rng)
    }

    fn len(&self) -> usize {
        self.entries.entries.len()
    }
}

impl<T: fmt::Debug, R> fmt::Debug for WeightedRandomSelector<T, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeightedRandomSelector")
            .field("entries", &self.entries.entries)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// WeightedListSelector
// ---------------------------------------------------------------------------

/// Weighted random selector that also supports removal.
pub struct WeightedListSelector<T, R = SmallRng> {
    entries: Cumulative<T>,
    rng: R,
}

impl<T> WeightedListSelector<T, SmallRng> {
    pub fn new() -> Self {
        Self::with_rng(SmallRng::from_entropy())
    }
}

impl<T> Default for WeightedListSelector<T, SmallRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, R: Rng> WeightedListSelector<T, R> {
    pub fn with_rng(rng: R) -> Self {
        Self {
            entries: Cumulative::new(),
            rng,
        }
    }

    /// Adds `item` with `weight`.
    ///
    /// # Panics
    ///
    /// Panics if `weight` is zero or the total weight overflows.
    pub fn add(&mut self, item: T, weight: u64) {
        add_or_panic(&mut self.entries, item, weight);
    }

    /// Fallible version of [`add`](Self::add).
    pub fn try_add(&mut self, item: T, weight: u64) -> Result<(), ConfigError> {
        self.entries.try_push(item, weight)
    }

    pub fn total_weight(&self) -> u64 {
        self.entries.total()
    }

    pub fn weight_of(&self, item: &T) -> Option<u64>
    where
        T: PartialEq,
    {
        self.entries
            .position(item)
            .map(|index| self.entries.weight_at(index))
    }

    /// Removes the first entry equal to `item`. O(n).
    pub fn remove(&mut self, item: &T) -> bool
    where
        T: PartialEq,
    {
        self.take(item).is_some()
    }

    /// Removes the first entry equal to `item`, returning it with its weight.
    pub fn take(&mut self, item: &T) -> Option<(T, u64)>
    where
        T: PartialEq,
    {
        let index = self.entries.position(item)?;
        Some(self.entries.remove_at(index))
    }

    /// Items with their individual weights, in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&T, u64)> + '_ {
        (0..self.entries.entries.len())
            .map(move |index| (&self.entries.entries[index].0, self.entries.weight_at(index)))
    }
}

impl<T, R: Rng> Selector<T> for WeightedListSelector<T, R> {
    fn select(&mut self) -> Option<&T> {
        self.entries.pick(&mut self.rng)
    }

    fn len(&self) -> usize {
        self.entries.entries.len()
    }
}

impl<T: fmt::Debug, R> fmt::Debug for WeightedListSelector<T, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeightedListSelector")
            .field("entries", &self.entries.entries)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand_chacha::ChaCha8Rng;

    fn assert_ratio(counts: &[usize], weights: &[u64], trials: usize) {
        let total: u64 = weights.iter().sum();
        for (count, weight) in counts.iter().zip(weights) {
            let expected = trials as f64 * *weight as f64 / total as f64;
            let deviation = (*count as f64 - expected).abs() / expected;
            assert!(deviation < 0.05, "count {count}, expected {expected}");
        }
    }

    mod cumulative {
        use super::*;

        #[test]
        fn draws_map_to_strictly_greater_sum() {
            let mut entries = Cumulative::new();
            for (item, weight) in [('a', 1), ('b', 2), ('c', 3), ('d', 4)] {
                entries.try_push(item, weight).unwrap();
            }
            let sums: Vec<u64> = entries.entries.iter().map(|(_, c)| *c).collect();
            assert_eq!(sums, vec![1, 3, 6, 10]);

            let owner = |draw: u64| {
                let index = entries.entries.partition_point(|(_, c)| *c <= draw);
                entries.entries[index].0
            };
            assert_eq!(owner(0), 'a');
            assert_eq!(owner(1), 'b');
            assert_eq!(owner(2), 'b');
            assert_eq!(owner(3), 'c');
            assert_eq!(owner(5), 'c');
            assert_eq!(owner(6), 'd');
            assert_eq!(owner(9), 'd');
        }

        #[test]
        fn rejects_zero_and_overflow() {
            let mut entries = Cumulative::new();
            assert!(entries.try_push(1, 0).is_err());
            entries.try_push(1, u64::MAX).unwrap();
            let err = entries.try_push(2, 1).unwrap_err();
            assert!(err.message().contains("overflow"));
            assert_eq!(entries.entries.len(), 1);
        }
    }

    mod weighted_random {
        use super::*;

        #[test]
        fn empty_selects_none() {
            let mut pool: WeightedRandomSelector<u8> = WeightedRandomSelector::new();
            assert!(pool.select().is_none());
            assert_eq!(pool.total_weight(), 0);
        }

        #[test]
        #[should_panic(expected = "weight must be > 0")]
        fn zero_weight_panics() {
            let mut pool = WeightedRandomSelector::new();
            pool.add("x", 0);
        }

        #[test]
        fn weight_of_recovers_individual_weights() {
            let mut pool = WeightedRandomSelector::new();
            pool.add("a", 5);
            pool.add("b", 3);
            assert_eq!(pool.weight_of(&"a"), Some(5));
            assert_eq!(pool.weight_of(&"b"), Some(3));
            assert_eq!(pool.weight_of(&"c"), None);
        }

        #[test]
        fn frequencies_follow_weights() {
            let mut pool = WeightedRandomSelector::with_rng(ChaCha8Rng::seed_from_u64(42));
            let weights = [1u64, 2, 3, 4];
            for (index, weight) in weights.iter().enumerate() {
                pool.add(index, *weight);
            }
            let trials = 100_000;
            let mut counts = [0usize; 4];
            for _ in 0..trials {
                counts[*pool.select().unwrap()] += 1;
            }
            assert_ratio(&counts, &weights, trials);
        }
    }

    mod weighted_list {
        use super::*;

        #[test]
        fn remove_rebalances_later_sums() {
            let mut pool = WeightedListSelector::new();
            pool.add('a', 1);
            pool.add('b', 2);
            pool.add('c', 3);
            pool.add('d', 4);

            assert_eq!(pool.take(&'b'), Some(('b', 2)));
            assert_eq!(pool.total_weight(), 8);
            let listed: Vec<(char, u64)> = pool.iter().map(|(c, w)| (*c, w)).collect();
            assert_eq!(listed, vec![('a', 1), ('c', 3), ('d', 4)]);

            assert!(pool.remove(&'a'));
            assert!(pool.remove(&'d'));
            assert!(!pool.remove(&'d'));
            assert_eq!(pool.total_weight(), 3);
            assert_eq!(pool.select(), Some(&'c'));
        }

        #[test]
        fn removed_item_never_selected() {
            let mut pool = WeightedListSelector::with_rng(ChaCha8Rng::seed_from_u64(3));
            pool.add(1u8, 10);
            pool.add(2u8, 10);
            pool.add(3u8, 10);
            pool.remove(&2);
            for _ in 0..1_000 {
                assert_ne!(pool.select(), Some(&2));
            }
        }

        #[test]
        fn frequencies_follow_weights_after_removal() {
            let mut pool = WeightedListSelector::with_rng(ChaCha8Rng::seed_from_u64(11));
            pool.add(9usize, 50);
            let weights = [1u64, 2, 3, 4];
            for (index, weight) in weights.iter().enumerate() {
                pool.add(index, *weight);
            }
            pool.remove(&9);

            let trials = 100_000;
            let mut counts = [0usize; 4];
            for _ in 0..trials {
                counts[*pool.select().unwrap()] += 1;
            }
            assert_ratio(&counts, &weights, trials);
        }

        proptest! {
            #[test]
            fn sums_stay_consistent_under_removal(
                weights in prop::collection::vec(1u64..1_000, 1..32),
                removals in prop::collection::vec(any::<prop::sample::Index>(), 0..16),
            ) {
                let mut pool = WeightedListSelector::with_rng(ChaCha8Rng::seed_from_u64(0));
                let mut model: Vec<(usize, u64)> = Vec::new();
                for (id, weight) in weights.iter().enumerate() {
                    pool.add(id, *weight);
                    model.push((id, *weight));
                }
                for removal in removals {
                    if model.is_empty() {
                        break;
                    }
                    let (id, weight) = model.remove(removal.index(model.len()));
                    prop_assert_eq!(pool.take(&id), Some((id, weight)));
                }
                let listed: Vec<(usize, u64)> = pool.iter().map(|(id, w)| (*id, w)).collect();
                prop_assert_eq!(&listed, &model);
                prop_assert_eq!(pool.total_weight(), model.iter().map(|(_, w)| w).sum::<u64>());
            }
        }
    }
}
