//! Smooth weighted round-robin.
//!
//! Interleaves items in proportion to their weights without long runs of the
//! same item, the way nginx balances upstreams.
//!
//! ## Algorithm
//!
//! ```text
//!   each item: weight w, current c (starts at 0)
//!
//!   select():
//!     for each item:  c += w          track the first item with max c
//!     winner.c -= total
//!     return winner
//!
//!   A=5 B=3 C=2 (total 10)
//!   ┌──────┬────────────────┬────────┬────────────────┐
//!   │ call │ c after adding │ winner │ c after winner │
//!   ├──────┼────────────────┼────────┼────────────────┤
//!   │  1   │  5   3   2     │   A    │ -5   3   2     │
//!   │  2   │  0   6   4     │   B    │  0  -4   4     │
//!   │  3   │  5  -1   6     │   C    │  5  -1  -4     │
//!   │  4   │ 10   2  -2     │   A    │  0   2  -2     │
//!   │  5   │  5   5   0     │   A    │ -5   5   0     │
//!   │  6   │  0   8   2     │   B    │  0  -2   2     │
//!   │  7   │  5   1   4     │   A    │ -5   1   4     │
//!   │  8   │  0   4   6     │   C    │  0   4  -4     │
//!   │  9   │  5   7  -2     │   B    │  5  -3  -2     │
//!   │ 10   │ 10   0   0     │   A    │  0   0   0     │
//!   └──────┴────────────────┴────────┴────────────────┘
//! ```
//!
//! Current weights always sum to zero after a call, so after `total` calls
//! every item has been picked exactly `w` times and the state is back to all
//! zeros.
//!
//! Ties go to the item added first.

use crate::error::ConfigError;
use crate::traits::Selector;

#[derive(Debug, Clone)]
struct Entry<T> {
    item: T,
    weight: i64,
    current: i64,
}

/// Deterministic, burst-free weighted round-robin.
#[derive(Debug, Clone)]
pub struct SmoothWeightedSelector<T> {
    entries: Vec<Entry<T>>,
    total: i64,
}

impl<T> SmoothWeightedSelector<T> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            total: 0,
        }
    }

    /// Adds `item` with `weight`.
    ///
    /// # Panics
    ///
    /// Panics if `weight` is zero or the total weight overflows.
    pub fn add(&mut self, item: T, weight: u32) {
        if let Err(err) = self.try_add(item, weight) {
            panic!("{err}");
        }
    }

    /// Fallible version of [`add`](Self::add).
    pub fn try_add(&mut self, item: T, weight: u32) -> Result<(), ConfigError> {
        if weight == 0 {
            return Err(ConfigError::new("weight must be > 0"));
        }
        let weight = i64::from(weight);
        self.total = self
            .total
            .checked_add(weight)
            .ok_or_else(|| ConfigError::new("total weight overflows i64"))?;
        self.entries.push(Entry {
            item,
            weight,
            current: 0,
        });
        Ok(())
    }

    /// Removes the first entry equal to `item`.
    ///
    /// Current weights of the remaining entries are kept, so the rotation
    /// carries on from where it was rather than restarting.
    pub fn remove(&mut self, item: &T) -> bool
    where
        T: PartialEq,
    {
        match self.entries.iter().position(|entry| entry.item == *item) {
            Some(index) => {
                let entry = self.entries.remove(index);
                self.total -= entry.weight;
                true
            },
            None => false,
        }
    }

    /// Zeroes every current weight, restarting the sequence.
    pub fn reset(&mut self) {
        for entry in &mut self.entries {
            entry.current = 0;
        }
    }

    pub fn total_weight(&self) -> u64 {
        self.total as u64
    }

    pub fn weight_of(&self, item: &T) -> Option<u32>
    where
        T: PartialEq,
    {
        self.entries
            .iter()
            .find(|entry| entry.item == *item)
            .map(|entry| entry.weight as u32)
    }
}

impl<T> Default for SmoothWeightedSelector<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Selector<T> for SmoothWeightedSelector<T> {
    fn select(&mut self) -> Option<&T> {
        let mut best: Option<usize> = None;
        for index in 0..self.entries.len() {
            let entry = &mut self.entries[index];
            entry.current += entry.weight;
            let current = entry.current;
            match best {
                Some(b) if self.entries[b].current >= current => {},
                _ => best = Some(index),
            }
        }
        let winner = best?;
        let entry = &mut self.entries[winner];
        entry.current -= self.total;
        Some(&entry.item)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}
