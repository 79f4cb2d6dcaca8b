//! Intrusive doubly linked list over a caller-owned `SlotArena`.
//!
//! The elements carry their own `prev`/`next` links (a [`Links`] value exposed
//! through the [`Linked`] trait) and live in a [`SlotArena`] owned by the
//! caller. The list itself stores only the `head` and `tail` [`SlotId`]s, so
//! linking and unlinking never allocate, and several lists (e.g. the probation
//! and protected queues of a segmented LRU) can thread through one arena.
//!
//! ## Architecture
//!
//! ```text
//!   arena (SlotArena<E>, owned by the caller)
//!   ┌────────┬─────────────────────────────────────────────────┐
//!   │ SlotId │ E { .., links: Links { prev, next } }           │
//!   ├────────┼─────────────────────────────────────────────────┤
//!   │ id_1   │ { value: A, prev: None,       next: Some(id_2) }│
//!   │ id_2   │ { value: B, prev: Some(id_1), next: Some(id_3) }│
//!   │ id_3   │ { value: C, prev: Some(id_2), next: None }      │
//!   └────────┴─────────────────────────────────────────────────┘
//!
//!   IntrusiveList { head: id_1, tail: id_3 }
//!   head ─► [id_1] ◄──► [id_2] ◄──► [id_3] ◄── tail
//! ```
//!
//! ## Membership
//!
//! An element is *linked* when it is the list head, or has a `prev`, or has a
//! `next`. That is the only membership test, which is what makes push/remove
//! O(1); it also means an element must never be linked into two lists, or
//! twice into one. Pushing an already-linked element is rejected (`false`)
//! instead of corrupting the links.
//!
//! ## Operations
//!
//! | Operation                      | Complexity |
//! |--------------------------------|------------|
//! | `push_front` / `push_back`     | O(1)       |
//! | `pop_front` / `pop_back`       | O(1)       |
//! | `remove`                       | O(1)       |
//! | `move_to_front` / `move_to_back` | O(1)     |
//! | `len` / `contains`             | O(n)       |
//! | `clear`                        | O(n)       |
//!
//! `len` walks the list. Callers that need O(1) size track it themselves.
//!
//! ## Thread Safety
//!
//! No internal synchronization. Guard the list and its arena with an external
//! lock (for example one [`Striped`](crate::sync::Striped) segment per list).
//!
//! ## Traversal
//!
//! [`iter`](IntrusiveList::iter) borrows the arena, so the list cannot be
//! mutated through safe code while a traversal is live. A traversal is not
//! restartable; create a new one to walk the list again.
//!
//! ## Example Usage
//!
//! ```
//! use stripekit::ds::{IntrusiveList, LinkedNode, SlotArena};
//!
//! let mut arena = SlotArena::new();
//! let mut lru = IntrusiveList::new();
//!
//! let a = arena.insert(LinkedNode::new("a"));
//! let b = arena.insert(LinkedNode::new("b"));
//! assert!(lru.push_front(&mut arena, a));
//! assert!(lru.push_front(&mut arena, b));
//! assert!(!lru.push_back(&mut arena, a)); // already linked
//!
//! // Touch "a": it becomes most recent.
//! lru.move_to_front(&mut arena, a);
//! assert_eq!(lru.pop_back(&mut arena), Some(b));
//! assert_eq!(lru.peek_front(), Some(a));
//! ```

use std::marker::PhantomData;

use crate::ds::slot_arena::{SlotArena, SlotId};
use crate::error::InvariantError;

/// Neighbor links embedded in a list element.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Links {
    prev: Option<SlotId>,
    next: Option<SlotId>,
}

impl Links {
    /// Unlinked state.
    pub const fn new() -> Self {
        Self {
            prev: None,
            next: None,
        }
    }

    pub fn prev(&self) -> Option<SlotId> {
        self.prev
    }

    pub fn next(&self) -> Option<SlotId> {
        self.next
    }

    fn reset(&mut self) {
        self.prev = None;
        self.next = None;
    }
}

/// An element that can be threaded through an [`IntrusiveList`].
///
/// Implementors embed a [`Links`] value and hand it out; the list reads and
/// rewrites it. Implementors must not modify the links themselves.
pub trait Linked {
    fn links(&self) -> &Links;
    fn links_mut(&mut self) -> &mut Links;
}

/// A value paired with its links, for callers without their own entry type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkedNode<T> {
    pub value: T,
    links: Links,
}

impl<T> LinkedNode<T> {
    pub fn new(value: T) -> Self {
        Self {
            value,
            links: Links::new(),
        }
    }
}

impl<T> Linked for LinkedNode<T> {
    fn links(&self) -> &Links {
        &self.links
    }

    fn links_mut(&mut self) -> &mut Links {
        &mut self.links
    }
}

/// Doubly linked list whose links live inside arena-owned elements.
#[derive(Debug)]
pub struct IntrusiveList<T> {
    head: Option<SlotId>,
    tail: Option<SlotId>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Linked> IntrusiveList<T> {
    /// Creates an empty list.
    pub const fn new() -> Self {
        Self {
            head: None,
            tail: None,
            _marker: PhantomData,
        }
    }

    /// Returns `true` if the list has no elements. O(1).
    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// Counts the elements by walking the list. O(n).
    pub fn len(&self, arena: &SlotArena<T>) -> usize {
        self.iter(arena).count()
    }

    /// Returns the first element without unlinking it.
    pub fn peek_front(&self) -> Option<SlotId> {
        self.head
    }

    /// Returns the last element without unlinking it.
    pub fn peek_back(&self) -> Option<SlotId> {
        self.tail
    }

    /// Returns `true` if `id` tests as linked: it is the head, or has a
    /// previous or next neighbor.
    pub fn is_linked(&self, arena: &SlotArena<T>, id: SlotId) -> bool {
        match arena.get(id) {
            Some(element) => {
                let links = element.links();
                self.head == Some(id) || links.prev.is_some() || links.next.is_some()
            },
            None => false,
        }
    }

    /// Returns `true` if `id` is reachable from this list's head. O(n).
    pub fn contains(&self, arena: &SlotArena<T>, id: SlotId) -> bool {
        self.is_linked(arena, id) && self.iter(arena).any(|(current, _)| current == id)
    }

    /// Links `id` as the new head.
    ///
    /// Returns `false` (and leaves everything untouched) if `id` is not in the
    /// arena or is already linked.
    pub fn push_front(&mut self, arena: &mut SlotArena<T>, id: SlotId) -> bool {
        if !arena.contains(id) || self.is_linked(arena, id) {
            return false;
        }
        self.link_first(arena, id);
        true
    }

    /// Links `id` as the new tail.
    ///
    /// Returns `false` (and leaves everything untouched) if `id` is not in the
    /// arena or is already linked.
    pub fn push_back(&mut self, arena: &mut SlotArena<T>, id: SlotId) -> bool {
        if !arena.contains(id) || self.is_linked(arena, id) {
            return false;
        }
        self.link_last(arena, id);
        true
    }

    /// Queue-style alias of [`push_back`](Self::push_back).
    pub fn offer(&mut self, arena: &mut SlotArena<T>, id: SlotId) -> bool {
        self.push_back(arena, id)
    }

    /// Unlinks and returns the head. The element stays in the arena.
    pub fn pop_front(&mut self, arena: &mut SlotArena<T>) -> Option<SlotId> {
        let id = self.head?;
        self.unlink(arena, id);
        Some(id)
    }

    /// Unlinks and returns the tail. The element stays in the arena.
    pub fn pop_back(&mut self, arena: &mut SlotArena<T>) -> Option<SlotId> {
        let id = self.tail?;
        self.unlink(arena, id);
        Some(id)
    }

    /// Splices `id` out using its own links.
    ///
    /// Returns `false` if `id` is not linked into this list; that case is a
    /// no-op.
    pub fn remove(&mut self, arena: &mut SlotArena<T>, id: SlotId) -> bool {
        if !self.is_linked_here(arena, id) {
            return false;
        }
        self.unlink(arena, id);
        true
    }

    /// Moves a linked element to the head. Returns `false` if `id` is not
    /// linked into this list.
    pub fn move_to_front(&mut self, arena: &mut SlotArena<T>, id: SlotId) -> bool {
        if !self.is_linked_here(arena, id) {
            return false;
        }
        if self.head != Some(id) {
            self.unlink(arena, id);
            self.link_first(arena, id);
        }
        true
    }

    /// Moves a linked element to the tail. Returns `false` if `id` is not
    /// linked into this list.
    pub fn move_to_back(&mut self, arena: &mut SlotArena<T>, id: SlotId) -> bool {
        if !self.is_linked_here(arena, id) {
            return false;
        }
        if self.tail != Some(id) {
            self.unlink(arena, id);
            self.link_last(arena, id);
        }
        true
    }

    /// Unlinks every element, resetting each element's own links so it can be
    /// reused in another list. Elements stay in the arena.
    pub fn clear(&mut self, arena: &mut SlotArena<T>) {
        let mut current = self.head;
        while let Some(id) = current {
            current = match arena.get_mut(id) {
                Some(element) => {
                    let links = element.links_mut();
                    let next = links.next;
                    links.reset();
                    next
                },
                None => None,
            };
        }
        self.head = None;
        self.tail = None;
    }

    /// Iterates `(SlotId, &T)` from head to tail. Call `.rev()` (or use
    /// [`iter_rev`](Self::iter_rev)) to walk from tail to head.
    pub fn iter<'a>(&self, arena: &'a SlotArena<T>) -> Iter<'a, T> {
        Iter {
            arena,
            front: self.head,
            back: self.tail,
        }
    }

    /// Iterates `(SlotId, &T)` from tail to head.
    pub fn iter_rev<'a>(&self, arena: &'a SlotArena<T>) -> std::iter::Rev<Iter<'a, T>> {
        self.iter(arena).rev()
    }

    /// Validates head/tail symmetry and that every forward link is mirrored
    /// by the matching backward link.
    pub fn check_invariants(&self, arena: &SlotArena<T>) -> Result<(), InvariantError> {
        match (self.head, self.tail) {
            (None, None) => return Ok(()),
            (Some(_), Some(_)) => {},
            _ => return Err(InvariantError::new("head and tail disagree on emptiness")),
        }

        let mut prev = None;
        let mut current = self.head;
        let mut count = 0usize;
        while let Some(id) = current {
            let element = arena
                .get(id)
                .ok_or_else(|| InvariantError::new(format!("slot {} is linked but vacant", id.index())))?;
            let links = element.links();
            if links.prev != prev {
                return Err(InvariantError::new(format!(
                    "slot {} has prev {:?}, expected {:?}",
                    id.index(),
                    links.prev,
                    prev
                )));
            }
            if links.next.is_none() && self.tail != Some(id) {
                return Err(InvariantError::new("last reachable element is not the tail"));
            }
            count += 1;
            if count > arena.len() {
                return Err(InvariantError::new("cycle detected"));
            }
            prev = Some(id);
            current = links.next;
        }
        Ok(())
    }

    /// `is_linked`, tightened with the head/tail checks that distinguish this
    /// list from another list sharing the arena.
    fn is_linked_here(&self, arena: &SlotArena<T>, id: SlotId) -> bool {
        let Some(element) = arena.get(id) else {
            return false;
        };
        let links = element.links();
        let head_ok = links.prev.is_some() || self.head == Some(id);
        let tail_ok = links.next.is_some() || self.tail == Some(id);
        head_ok && tail_ok
    }

    fn unlink(&mut self, arena: &mut SlotArena<T>, id: SlotId) {
        let links = match arena.get(id) {
            Some(element) => *element.links(),
            None => return,
        };

        match links.prev {
            Some(prev) => {
                if let Some(element) = arena.get_mut(prev) {
                    element.links_mut().next = links.next;
                }
            },
            None => self.head = links.next,
        }

        match links.next {
            Some(next) => {
                if let Some(element) = arena.get_mut(next) {
                    element.links_mut().prev = links.prev;
                }
            },
            None => self.tail = links.prev,
        }

        if let Some(element) = arena.get_mut(id) {
            element.links_mut().reset();
        }
    }

    fn link_first(&mut self, arena: &mut SlotArena<T>, id: SlotId) {
        let old_head = self.head;
        if let Some(element) = arena.get_mut(id) {
            let links = element.links_mut();
            links.prev = None;
            links.next = old_head;
        }
        match old_head {
            Some(head) => {
                if let Some(element) = arena.get_mut(head) {
                    element.links_mut().prev = Some(id);
                }
            },
            None => self.tail = Some(id),
        }
        self.head = Some(id);
    }

    fn link_last(&mut self, arena: &mut SlotArena<T>, id: SlotId) {
        let old_tail = self.tail;
        if let Some(element) = arena.get_mut(id) {
            let links = element.links_mut();
            links.next = None;
            links.prev = old_tail;
        }
        match old_tail {
            Some(tail) => {
                if let Some(element) = arena.get_mut(tail) {
                    element.links_mut().next = Some(id);
                }
            },
            None => self.head = Some(id),
        }
        self.tail = Some(id);
    }
}

impl<T: Linked> Default for IntrusiveList<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Double-ended traversal over an [`IntrusiveList`].
pub struct Iter<'a, T> {
    arena: &'a SlotArena<T>,
    front: Option<SlotId>,
    back: Option<SlotId>,
}

impl<'a, T: Linked> Iterator for Iter<'a, T> {
    type Item = (SlotId, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.front?;
        let element = self.arena.get(id)?;
        if self.back == Some(id) {
            self.front = None;
            self.back = None;
        } else {
            self.front = element.links().next;
        }
        Some((id, element))
    }
}

impl<'a, T: Linked> DoubleEndedIterator for Iter<'a, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        let id = self.back?;
        let element = self.arena.get(id)?;
        if self.front == Some(id) {
            self.front = None;
            self.back = None;
        } else {
            self.back = element.links().prev;
        }
        Some((id, element))
    }
}
