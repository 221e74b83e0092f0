use crate::utils::non_max::NonMaxU64;

use super::{CHUNK_SHIFT, OFFSET_MASK};

/// Packed reference to one payload slot: chunk number in the high half,
/// offset within that chunk in the low half.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct SlotKey(NonMaxU64);

impl SlotKey {
    #[inline]
    pub(crate) fn new(chunk: u32, offset: u32) -> Self {
        let raw = ((chunk as u64) << CHUNK_SHIFT) | offset as u64;

        // chunk == offset == u32::MAX would need 2^32 chunks first.
        match NonMaxU64::new(raw) {
            Some(raw) => Self(raw),
            None => unreachable!("slot key space exhausted"),
        }
    }

    #[inline]
    pub(crate) fn chunk(&self) -> usize {
        (self.0.get() >> CHUNK_SHIFT) as usize
    }

    #[inline]
    pub(crate) fn offset(&self) -> usize {
        (self.0.get() & OFFSET_MASK) as usize
    }
}

impl std::fmt::Debug for SlotKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlotKey")
            .field("chunk", &self.chunk())
            .field("offset", &self.offset())
            .finish()
    }
}
