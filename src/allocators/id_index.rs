use std::{collections::TryReserveError, mem::size_of, ops::Range};

use static_assertions::const_assert_eq;
use tracing::trace;

use super::{Id, SlotKey};

const_assert_eq!(size_of::<IndexEntry>(), 16);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct IndexEntry {
    pub(crate) id: Id,
    /// `None` once the id was freed but its position not yet compacted away.
    pub(crate) slot: Option<SlotKey>,
}

impl IndexEntry {
    const VACANT: Self = Self { id: 0, slot: None };

    #[inline]
    pub(crate) fn live(id: Id, slot: SlotKey) -> Self {
        Self {
            id,
            slot: Some(slot),
        }
    }

    #[inline]
    pub(crate) fn is_live(&self) -> bool {
        self.slot.is_some()
    }
}

/// Id-sorted index split into a head run and a tail run by the hole.
///
/// ```text
/// [ head run ........ | hole ....... | tail run ........ ]
/// 0              hole_start      hole_end        entries.len()
/// ```
///
/// Ids strictly ascend within each run and every head id is below every tail
/// id. Positions inside the hole carry no meaning. The last head entry and the
/// first tail entry are always live; dead entries only linger inside a run
/// until the next compaction.
#[derive(Debug)]
pub(crate) struct IdIndex {
    entries: Vec<IndexEntry>,
    hole_start: usize,
    hole_end: usize,
    head_dead: usize,
    tail_dead: usize,
    compactions: u64,
}

impl IdIndex {
    pub(crate) fn new() -> Self {
        Self {
            entries: Vec::new(),
            hole_start: 0,
            hole_end: 0,
            head_dead: 0,
            tail_dead: 0,
            compactions: 0,
        }
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub(crate) fn hole(&self) -> Range<usize> {
        self.hole_start..self.hole_end
    }

    #[inline]
    pub(crate) fn head(&self) -> &[IndexEntry] {
        &self.entries[..self.hole_start]
    }

    #[inline]
    pub(crate) fn tail(&self) -> &[IndexEntry] {
        &self.entries[self.hole_end..]
    }

    pub(crate) fn dead_counts(&self) -> (usize, usize) {
        (self.head_dead, self.tail_dead)
    }

    pub(crate) fn compactions(&self) -> u64 {
        self.compactions
    }

    /// Absolute position of `id`, live or dead.
    pub(crate) fn find(&self, id: Id) -> Option<usize> {
        if let Ok(pos) = self.head().binary_search_by_key(&id, |e| e.id) {
            return Some(pos);
        }

        self.tail()
            .binary_search_by_key(&id, |e| e.id)
            .ok()
            .map(|pos| self.hole_end + pos)
    }

    pub(crate) fn slot(&self, id: Id) -> Option<SlotKey> {
        self.find(id).and_then(|pos| self.entries[pos].slot)
    }

    /// Marks the live entry for `id` dead.
    ///
    /// Returns its slot and whether the head run lost its last entry, in which
    /// case the head boundary was pulled back over every trailing dead entry.
    pub(crate) fn release(&mut self, id: Id) -> Option<(SlotKey, bool)> {
        let pos = self.find(id)?;
        let slot = self.entries[pos].slot.take()?;

        if pos < self.hole_start {
            self.head_dead += 1;
            if pos + 1 == self.hole_start {
                self.shrink_head();
                return Some((slot, true));
            }
        } else {
            self.tail_dead += 1;
            if pos == self.hole_end {
                self.shrink_tail();
            }
        }

        Some((slot, false))
    }

    pub(crate) fn shrink_head(&mut self) {
        while self.hole_start > 0 && !self.entries[self.hole_start - 1].is_live() {
            self.hole_start -= 1;
            self.head_dead -= 1;
        }
    }

    pub(crate) fn shrink_tail(&mut self) {
        while self.hole_end < self.entries.len() && !self.entries[self.hole_end].is_live() {
            self.hole_end += 1;
            self.tail_dead -= 1;
        }
    }

    /// Slides live head entries down over dead ones. Returns whether the hole
    /// grew.
    pub(crate) fn compact_head(&mut self) -> bool {
        if self.head_dead == 0 {
            return false;
        }

        let mut write = 0;
        for read in 0..self.hole_start {
            if self.entries[read].is_live() {
                self.entries[write] = self.entries[read];
                write += 1;
            }
        }

        let reclaimed = self.hole_start - write;
        trace!("compacted head run: {} entries reclaimed", reclaimed);

        self.hole_start = write;
        self.head_dead = 0;
        self.compactions += 1;

        reclaimed > 0
    }

    /// Slides live tail entries up over dead ones. Returns whether the hole
    /// grew.
    pub(crate) fn compact_tail(&mut self) -> bool {
        if self.tail_dead == 0 {
            return false;
        }

        let mut write = self.entries.len();
        for read in (self.hole_end..self.entries.len()).rev() {
            if self.entries[read].is_live() {
                write -= 1;
                self.entries[write] = self.entries[read];
            }
        }

        let reclaimed = write - self.hole_end;
        trace!("compacted tail run: {} entries reclaimed", reclaimed);

        self.hole_end = write;
        self.tail_dead = 0;
        self.compactions += 1;

        reclaimed > 0
    }

    /// Appends to the head run. The hole must be non-empty and `entry.id` must
    /// sit strictly between the two runs.
    pub(crate) fn push_head(&mut self, entry: IndexEntry) {
        debug_assert!(self.hole_start < self.hole_end);
        debug_assert!(self.head().last().map_or(true, |e| e.id < entry.id));
        debug_assert!(self.tail().first().map_or(true, |e| entry.id < e.id));

        self.entries[self.hole_start] = entry;
        self.hole_start += 1;
    }

    pub(crate) fn try_reserve(&mut self, additional: usize) -> Result<(), TryReserveError> {
        self.entries.try_reserve(additional)
    }

    /// Opens `additional` positions at the hole, shifting the tail run up.
    ///
    /// Call [`IdIndex::try_reserve`] first so this never reallocates.
    pub(crate) fn widen_hole(&mut self, additional: usize) {
        let old_len = self.entries.len();
        self.entries.resize(old_len + additional, IndexEntry::VACANT);
        self.entries
            .copy_within(self.hole_end..old_len, self.hole_end + additional);
        self.hole_end += additional;
    }

    /// Moves head entries `[pos, hole_start)` to the front of the tail run.
    pub(crate) fn move_to_tail(&mut self, pos: usize) {
        let moved = self.hole_start - pos;
        let dead = count_dead(&self.entries[pos..self.hole_start]);

        self.entries
            .copy_within(pos..self.hole_start, self.hole_end - moved);
        self.hole_start = pos;
        self.hole_end -= moved;
        self.head_dead -= dead;
        self.tail_dead += dead;
    }

    /// Moves tail entries `[hole_end, pos)` to the end of the head run.
    pub(crate) fn move_to_head(&mut self, pos: usize) {
        let moved = pos - self.hole_end;
        let dead = count_dead(&self.entries[self.hole_end..pos]);

        self.entries.copy_within(self.hole_end..pos, self.hole_start);
        self.hole_start += moved;
        self.hole_end = pos;
        self.tail_dead -= dead;
        self.head_dead += dead;
    }

    /// Live `(id, slot)` pairs, head run first.
    pub(crate) fn live(&self) -> impl Iterator<Item = (Id, SlotKey)> + '_ {
        self.head()
            .iter()
            .chain(self.tail())
            .filter_map(|e| e.slot.map(|slot| (e.id, slot)))
    }
}

fn count_dead(entries: &[IndexEntry]) -> usize {
    entries.iter().filter(|e| !e.is_live()).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(n: u32) -> SlotKey {
        SlotKey::new(0, n)
    }

    /// Builds an index whose head holds `head`, tail holds `tail` and hole has
    /// `hole` positions. Negative ids are dead entries.
    fn index_of(head: &[i64], hole: usize, tail: &[i64]) -> IdIndex {
        let to_entry = |(n, &id): (usize, &i64)| IndexEntry {
            id: id.unsigned_abs() as Id,
            slot: (id > 0).then(|| key(n as u32)),
        };

        let mut index = IdIndex::new();
        index.entries.extend(head.iter().enumerate().map(to_entry));
        index
            .entries
            .extend(std::iter::repeat(IndexEntry::VACANT).take(hole));
        index.entries.extend(
            tail.iter()
                .enumerate()
                .map(|(n, id)| to_entry((n + head.len(), id))),
        );
        index.hole_start = head.len();
        index.hole_end = head.len() + hole;
        index.head_dead = head.iter().filter(|&&id| id < 0).count();
        index.tail_dead = tail.iter().filter(|&&id| id < 0).count();
        index
    }

    fn ids(entries: &[IndexEntry]) -> Vec<i64> {
        entries
            .iter()
            .map(|e| if e.is_live() { e.id as i64 } else { -(e.id as i64) })
            .collect()
    }

    #[test]
    fn find_searches_both_runs() {
        let index = index_of(&[1, 2, -3, 4], 2, &[8, 9]);

        assert_eq!(index.find(2), Some(1));
        assert_eq!(index.find(3), Some(2));
        assert_eq!(index.slot(3), None);
        assert_eq!(index.find(9), Some(7));
        assert_eq!(index.find(5), None);
        assert!(index.slot(8).is_some());
    }

    #[test]
    fn release_at_boundaries_shrinks_runs() {
        let mut index = index_of(&[1, -2, 3], 1, &[5, -6, 7]);

        let (_, shrank) = index.release(3).expect("live");
        assert!(shrank);
        assert_eq!(ids(index.head()), vec![1]);
        assert_eq!(index.dead_counts(), (0, 1));

        let (_, shrank) = index.release(5).expect("live");
        assert!(!shrank);
        assert_eq!(ids(index.tail()), vec![7]);
        assert_eq!(index.dead_counts(), (0, 0));

        assert!(index.release(5).is_none());
        assert!(index.release(42).is_none());
    }

    #[test]
    fn release_inside_a_run_leaves_dead_entry() {
        let mut index = index_of(&[1, 2, 3], 0, &[]);

        let (_, shrank) = index.release(2).expect("live");
        assert!(!shrank);
        assert_eq!(ids(index.head()), vec![1, -2, 3]);
        assert_eq!(index.dead_counts(), (1, 0));
        assert!(index.release(2).is_none(), "already dead");
    }

    #[test]
    fn compaction_keeps_order() {
        let mut index = index_of(&[1, -2, 3, -4, 5], 0, &[7, -8, -9, 10]);

        assert!(index.compact_head());
        assert_eq!(ids(index.head()), vec![1, 3, 5]);
        assert_eq!(index.hole(), 3..5);

        assert!(index.compact_tail());
        assert_eq!(ids(index.tail()), vec![7, 10]);
        assert_eq!(index.hole(), 3..7);

        assert_eq!(index.dead_counts(), (0, 0));
        assert_eq!(index.compactions(), 2);
        assert!(!index.compact_head());
        assert_eq!(index.compactions(), 2);
    }

    #[test]
    fn widen_hole_preserves_tail() {
        let mut index = index_of(&[1, 2], 0, &[5, 6]);
        index.try_reserve(3).expect("reserve");
        index.widen_hole(3);

        assert_eq!(index.len(), 7);
        assert_eq!(index.hole(), 2..5);
        assert_eq!(ids(index.head()), vec![1, 2]);
        assert_eq!(ids(index.tail()), vec![5, 6]);
    }

    #[test]
    fn moves_across_the_hole() {
        let mut index = index_of(&[1, 2, -3, 4], 1, &[6, -7, 8]);

        index.move_to_tail(2);
        assert_eq!(ids(index.head()), vec![1, 2]);
        assert_eq!(ids(index.tail()), vec![-3, 4, 6, -7, 8]);
        assert_eq!(index.dead_counts(), (0, 2));

        index.move_to_head(index.hole().end + 4);
        assert_eq!(ids(index.head()), vec![1, 2, -3, 4, 6, -7]);
        assert_eq!(ids(index.tail()), vec![8]);
        assert_eq!(index.dead_counts(), (2, 0));
        assert_eq!(index.hole().len(), 1);
    }

    #[test]
    fn live_skips_dead_entries() {
        let index = index_of(&[1, -2], 3, &[-9, 10]);
        let live: Vec<Id> = index.live().map(|(id, _)| id).collect();
        assert_eq!(live, vec![1, 10]);
    }
}
