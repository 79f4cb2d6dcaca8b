//! Round-robin selection in insertion order.
//!
//! ```text
//!   items:  [A, B, C]      cursor starts at 0
//!
//!   select: cursor >= len? reset to 0
//!           return items[cursor]; cursor += 1
//!
//!   calls:  A  B  C  A  B  C ...
//! ```
//!
//! The bounds check runs before the read, so a pool that shrinks below the
//! cursor simply restarts at the first item.

use crate::traits::Selector;

/// Cycles through items in insertion order.
#[derive(Debug, Clone)]
pub struct RoundRobinSelector<T> {
    items: Vec<T>,
    cursor: usize,
}

impl<T> RoundRobinSelector<T> {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            cursor: 0,
        }
    }

    pub fn add(&mut self, item: T) {
        self.items.push(item);
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Index the next `select` will read (before wrapping).
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Removes the first item equal to `item`.
    ///
    /// Items after the removed one shift down; the cursor is adjusted so the
    /// rotation continues with the item that would have come next.
    pub fn remove(&mut self, item: &T) -> bool
    where
        T: PartialEq,
    {
        match self.items.iter().position(|candidate| candidate == item) {
            Some(index) => {
                self.items.remove(index);
                if index < self.cursor {
                    self.cursor -= 1;
                }
                true
            },
            None => false,
        }
    }
}

impl<T> Default for RoundRobinSelector<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Selector<T> for RoundRobinSelector<T> {
    fn select(&mut self) -> Option<&T> {
        if self.items.is_empty() {
            return None;
        }
        if self.cursor >= self.items.len() {
            self.cursor = 0;
        }
        let index = self.cursor;
        self.cursor += 1;
        self.items.get(index)
    }

    fn len(&self) -> usize {
        self.items.len()
    }
}

impl<T> FromIterator<T> for RoundRobinSelector<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
            cursor: 0,
        }
    }
}
