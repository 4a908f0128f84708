use std::fmt;

use thiserror::Error;

/// Allocation failure: the request does not fit in the remaining capacity.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("arena exhausted: requested {requested} bytes at offset {cursor} of {capacity}")]
pub struct ArenaError {
    pub requested: usize,
    pub cursor: usize,
    pub capacity: usize,
}

/// Fixed-capacity linear allocator.
///
/// Each allocation is carved off the front of the unused tail, so every
/// returned region is disjoint from all earlier ones and stays valid for the
/// lifetime of the backing storage. There is no `free`.
///
/// Invariant: `0 <= cursor <= capacity`. A failed allocation leaves the cursor
/// untouched.
pub struct Arena<'a> {
    free: &'a mut [u8],
    capacity: usize,
    cursor: usize,
}

impl fmt::Debug for Arena<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Arena")
            .field("capacity", &self.capacity)
            .field("cursor", &self.cursor)
            .finish_non_exhaustive()
    }
}

impl Arena<'static> {
    /// Creates an arena over a zeroed heap block that lives until process exit.
    ///
    /// The block is intentionally leaked; the OS reclaims it on exit.
    pub fn with_capacity(capacity: usize) -> Self {
        let storage: &'static mut [u8] = Box::leak(vec![0u8; capacity].into_boxed_slice());
        Self::new(storage)
    }
}

impl<'a> Arena<'a> {
    /// Creates an arena over caller-owned storage.
    pub fn new(storage: &'a mut [u8]) -> Self {
        let capacity = storage.len();
        Self {
            free: storage,
            capacity,
            cursor: 0,
        }
    }

    /// Reserves `size` bytes and returns them.
    ///
    /// The region is borrowed for `'a`, not for the duration of this call, so
    /// any number of allocations may be held at once.
    pub fn allocate(&mut self, size: usize) -> Result<&'a mut [u8], ArenaError> {
        if size > self.free.len() {
            return Err(ArenaError {
                requested: size,
                cursor: self.cursor,
                capacity: self.capacity,
            });
        }

        let free = std::mem::take(&mut self.free);
        let (block, rest) = free.split_at_mut(size);
        self.free = rest;
        self.cursor += size;

        log::trace!("arena: +{size} bytes (cursor {}/{})", self.cursor, self.capacity);
        Ok(block)
    }

    /// Total bytes the arena was created with.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Bytes handed out so far.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Bytes still available.
    pub fn remaining(&self) -> usize {
        self.capacity - self.cursor
    }
}
