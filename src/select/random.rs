//! Uniform random selection.
//!
//! Every call draws an index uniformly from `[0, len)`. No weights, no
//! memory of past picks.
//!
//! ```
//! use stripekit::select::RandomSelector;
//! use stripekit::traits::Selector;
//!
//! let mut pool: RandomSelector<&str> = ["a", "b", "c"].into_iter().collect();
//! let picked = *pool.select().unwrap();
//! assert!(["a", "b", "c"].contains(&picked));
//! ```

use std::fmt;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::traits::Selector;

/// Picks items uniformly at random.
pub struct RandomSelector<T, R = SmallRng> {
    items: Vec<T>,
    rng: R,
}

impl<T> RandomSelector<T, SmallRng> {
    /// An empty pool with an entropy-seeded RNG.
    pub fn new() -> Self {
        Self::with_rng(SmallRng::from_entropy())
    }
}

impl<T> Default for RandomSelector<T, SmallRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, R: Rng> RandomSelector<T, R> {
    /// An empty pool drawing from `rng`.
    pub fn with_rng(rng: R) -> Self {
        Self {
            items: Vec::new(),
            rng,
        }
    }

    pub fn add(&mut self, item: T) {
        self.items.push(item);
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Removes the first item equal to `item`.
    pub fn remove(&mut self, item: &T) -> bool
    where
        T: PartialEq,
    {
        match self.items.iter().position(|candidate| candidate == item) {
            Some(index) => {
                self.items.remove(index);
                true
            },
            None => false,
        }
    }
}

impl<T, R: Rng> Selector<T> for RandomSelector<T, R> {
    fn select(&mut self) -> Option<&T> {
        if self.items.is_empty() {
            return None;
        }
        let index = self.rng.gen_range(0..self.items.len());
        self.items.get(index)
    }

    fn len(&self) -> usize {
        self.items.len()
    }
}

impl<T> FromIterator<T> for RandomSelector<T, SmallRng> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut selector = Self::new();
        selector.items.extend(iter);
        selector
    }
}

impl<T: fmt::Debug, R> fmt::Debug for RandomSelector<T, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RandomSelector")
            .field("items", &self.items)
            .finish_non_exhaustive()
    }
}
