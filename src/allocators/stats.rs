use std::ops::Range;

use super::Id;

/// Snapshot of an [`IdTable`](super::IdTable)'s internal bookkeeping.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IdTableStats {
    pub live: usize,
    /// Index positions, equal to the number of payload slots.
    pub index_len: usize,
    pub hole: Range<usize>,
    pub head_dead: usize,
    pub tail_dead: usize,
    pub chunks: usize,
    pub free_slots: usize,
    /// Slots the next chunk will hold.
    pub growth: usize,
    pub growths: u64,
    pub compactions: u64,
    pub rewinds: u64,
    pub next: Id,
}
