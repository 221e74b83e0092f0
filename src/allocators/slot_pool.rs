use std::collections::TryReserveError;

use super::SlotKey;

/// Payload storage: chunks of fixed-size slots plus a stack of free slots.
///
/// Chunks are append-only. A slot is bound while it holds `Some`, and its key
/// sits on the free stack while it holds `None`.
#[derive(Debug)]
pub(crate) struct SlotPool<T> {
    chunks: Vec<Chunk<T>>,
    free_list: Vec<SlotKey>,
}

/// A chunk allocated but not yet linked into a pool.
#[derive(Debug)]
pub(crate) struct Chunk<T> {
    slots: Vec<Option<T>>,
}

impl<T> Chunk<T> {
    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }
}

impl<T> SlotPool<T> {
    pub(crate) fn new() -> Self {
        Self {
            chunks: Vec::new(),
            free_list: Vec::new(),
        }
    }

    /// Allocates a chunk of `len` slots and reserves room to link it.
    ///
    /// The free stack is reserved for every slot the pool will own, bound or
    /// not, so [`SlotPool::take`] never reallocates. Only capacities change
    /// here, so a failure leaves the pool as it was.
    pub(crate) fn prepare_chunk(&mut self, len: usize) -> Result<Chunk<T>, TryReserveError> {
        let mut slots = Vec::new();
        slots.try_reserve_exact(len)?;
        slots.resize_with(len, || None);

        let slots_after = self.slot_count() + len;
        self.free_list
            .try_reserve(slots_after.saturating_sub(self.free_list.len()))?;
        self.chunks.try_reserve(1)?;

        Ok(Chunk { slots })
    }

    /// Links a prepared chunk and seeds the free stack with its slots.
    pub(crate) fn adopt(&mut self, chunk: Chunk<T>) {
        let chunk_no = self.chunks.len() as u32;
        let len = chunk.len() as u32;

        // Reversed so the lowest offset is popped first.
        self.free_list
            .extend((0..len).rev().map(|offset| SlotKey::new(chunk_no, offset)));
        self.chunks.push(chunk);
    }

    /// Pops a free slot. It stays unbound until [`SlotPool::fill`].
    pub(crate) fn pop_free(&mut self) -> Option<SlotKey> {
        self.free_list.pop()
    }

    pub(crate) fn fill(&mut self, key: SlotKey, value: T) -> &mut T {
        self.chunks[key.chunk()].slots[key.offset()].insert(value)
    }

    pub(crate) fn get(&self, key: SlotKey) -> Option<&T> {
        self.chunks.get(key.chunk())?.slots.get(key.offset())?.as_ref()
    }

    pub(crate) fn get_mut(&mut self, key: SlotKey) -> Option<&mut T> {
        self.chunks
            .get_mut(key.chunk())?
            .slots
            .get_mut(key.offset())?
            .as_mut()
    }

    /// Unbinds the slot and returns its key to the free stack.
    pub(crate) fn take(&mut self, key: SlotKey) -> Option<T> {
        let value = self
            .chunks
            .get_mut(key.chunk())?
            .slots
            .get_mut(key.offset())?
            .take()?;

        // Room for every slot was reserved when its chunk was prepared.
        self.free_list.push(key);

        Some(value)
    }

    pub(crate) fn free_slots(&self) -> usize {
        self.free_list.len()
    }

    pub(crate) fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    pub(crate) fn slot_count(&self) -> usize {
        self.chunks.iter().map(Chunk::len).sum()
    }
}
