//! stripekit: striped locks, intrusive lists, bounded and admission-controlled
//! queues, and weighted selectors.
//!
//! - [`sync`]: [`Striped`](sync::Striped) segment sets, the
//!   [`AdmissionQueue`](sync::AdmissionQueue) and its memory sampler.
//! - [`ds`]: single-threaded building blocks ([`IntrusiveList`],
//!   [`BoundedPriorityQueue`]).
//! - [`select`]: round-robin and weighted load distribution behind the
//!   [`Selector`](traits::Selector) trait.

pub mod builder;
pub mod ds;
pub mod error;
pub mod prelude;
pub mod select;
pub mod sync;
pub mod traits;

pub use crate::ds::{BoundedPriorityQueue, IntrusiveList, SlotArena, SlotId};
pub use crate::select::{
    RandomSelector, RoundRobinSelector, SmoothWeightedSelector, WeightedListSelector,
    WeightedRandomSelector,
};
pub use crate::sync::{AdmissionQueue, MemorySampler, Semaphore, StripeIndexer, Striped};
