//! # Selector Trait
//!
//! One interface over every load-distribution strategy in [`crate::select`],
//! so routing code can swap strategies without changing call sites.
//!
//! ## Architecture
//!
//! ```text
//!                    ┌──────────────────────────────────────┐
//!                    │             Selector<T>              │
//!                    │                                      │
//!                    │  select(&mut) → Option<&T>           │
//!                    │  len(&) → usize                      │
//!                    │  is_empty(&) → bool                  │
//!                    └──────────────────┬───────────────────┘
//!                                       │
//!     ┌──────────────┬──────────────────┼──────────────────┬──────────────────┐
//!     ▼              ▼                  ▼                  ▼                  ▼
//!  Random       RoundRobin      WeightedRandom       WeightedList      SmoothWeighted
//!  uniform      insertion       binary search on     weighted random   nginx-style
//!  pick         order, wraps    cumulative weights   + remove(&T)      smooth WRR
//! ```
//!
//! ## Trait Summary
//!
//! | Implementor                 | Weighted | Deterministic | Supports remove |
//! |-----------------------------|----------|---------------|-----------------|
//! | `RandomSelector`            | no       | no            | yes             |
//! | `RoundRobinSelector`        | no       | yes           | yes             |
//! | `WeightedRandomSelector`    | yes      | no            | no              |
//! | `WeightedListSelector`      | yes      | no            | yes             |
//! | `SmoothWeightedSelector`    | yes      | yes           | yes             |
//!
//! `select` takes `&mut self` because every strategy advances internal state
//! (an RNG, a cursor, or current weights). An empty pool yields `None`.
//!
//! ## Example Usage
//!
//! ```
//! use stripekit::select::{RoundRobinSelector, SmoothWeightedSelector};
//! use stripekit::traits::Selector;
//!
//! fn route<S: Selector<&'static str>>(selector: &mut S, n: usize) -> Vec<&'static str> {
//!     (0..n).filter_map(|_| selector.select().copied()).collect()
//! }
//!
//! let mut rr = RoundRobinSelector::new();
//! rr.add("a");
//! rr.add("b");
//! assert_eq!(route(&mut rr, 3), vec!["a", "b", "a"]);
//!
//! let mut swrr = SmoothWeightedSelector::new();
//! swrr.add("a", 2);
//! swrr.add("b", 1);
//! assert_eq!(route(&mut swrr, 3), vec!["a", "b", "a"]);
//! ```
//!
//! ## Thread Safety
//!
//! Selectors are **not** internally synchronized. Share one across threads
//! behind a `Mutex`, or give each thread its own.

/// A pool of items that hands out one item per call.
pub trait Selector<T> {
    /// Picks the next item, or `None` if the pool is empty.
    fn select(&mut self) -> Option<&T>;

    /// Number of items in the pool.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
