use std::iter::Chain;
use std::slice::Iter;

use crate::error::ScopeError;

/// Oldest-to-newest view over a [`RingBuffer`].
pub type Chronological<'a, T> = Chain<Iter<'a, T>, Iter<'a, T>>;

/// Fixed-capacity history that overwrites its oldest entry once full.
///
/// Slots are filled in order until `capacity` is reached; after that each
/// push replaces the slot under the cursor and advances it. Callers only
/// see the chronological view, never the raw slot layout.
#[derive(Debug, Clone)]
pub struct RingBuffer<T> {
    slots: Vec<T>,
    capacity: usize,
    cursor: usize,
}

impl<T> RingBuffer<T> {
    pub fn new(capacity: usize) -> Result<Self, ScopeError> {
        if capacity == 0 {
            return Err(ScopeError::InvalidCapacity);
        }
        Ok(Self {
            slots: Vec::with_capacity(capacity),
            capacity,
            cursor: 0,
        })
    }

    pub fn push(&mut self, value: T) {
        if self.slots.len() < self.capacity {
            self.slots.push(value);
        } else {
            self.slots[self.cursor] = value;
            self.cursor = (self.cursor + 1) % self.capacity;
        }
    }

    pub fn chronological(&self) -> Chronological<'_, T> {
        // cursor stays 0 until the buffer is full, so this split is a no-op while filling
        let (newer, older) = self.slots.split_at(self.cursor);
        older.iter().chain(newer.iter())
    }

    pub fn latest(&self) -> Option<&T> {
        if self.slots.is_empty() {
            return None;
        }
        if self.slots.len() < self.capacity {
            return self.slots.last();
        }
        let idx = (self.cursor + self.capacity - 1) % self.capacity;
        self.slots.get(idx)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.slots.len() == self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.cursor = 0;
    }
}
