pub use crate::builder::{StripeLayout, StripedBuilder};
pub use crate::ds::{BoundedPriorityQueue, IntrusiveList, Linked, LinkedNode, SlotArena, SlotId};
pub use crate::error::{Cancelled, ConfigError, InvariantError};
pub use crate::select::{
    RandomSelector, RoundRobinSelector, SmoothWeightedSelector, WeightedListSelector,
    WeightedRandomSelector,
};
pub use crate::sync::{AdmissionPolicy, AdmissionQueue, MemoryFloor, MemorySampler, Striped};
pub use crate::traits::Selector;
