//! Load-distribution strategies over a mutable pool of items.
//!
//! All of them implement [`Selector`](crate::traits::Selector). None are
//! internally synchronized.

pub mod random;
pub mod round_robin;
pub mod smooth;
pub mod weighted;

pub use random::RandomSelector;
pub use round_robin::RoundRobinSelector;
pub use smooth::SmoothWeightedSelector;
pub use weighted::{WeightedListSelector, WeightedRandomSelector};
