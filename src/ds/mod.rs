//! Single-threaded data structures: the slot arena, the intrusive list that
//! threads through it, and the bounded priority queue.

pub mod bounded_heap;
pub mod intrusive_list;
pub mod slot_arena;

pub use bounded_heap::{BoundedPriorityQueue, NaturalOrder};
pub use intrusive_list::{IntrusiveList, Iter as IntrusiveListIter, Linked, LinkedNode, Links};
pub use slot_arena::{SlotArena, SlotId};
