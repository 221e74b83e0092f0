use tracing::debug;

use super::{
    Cursor, Id, IdIndex, IdTableConfig, IdTableError, IdTableStats, IndexEntry, Result, SlotKey,
    SlotPool,
};

/// Dense id allocator binding small integer handles to payloads.
///
/// Ids are drawn from `[base, limit)` and reused once freed. Lookup is two
/// binary searches; allocation is amortized O(1) in the ascending case and
/// falls back to compaction, then to growing the storage by a whole chunk.
///
/// The table is not synchronized. Put it behind one lock, or use
/// [`SharedIdTable`](super::SharedIdTable).
#[derive(Debug)]
pub struct IdTable<T> {
    index: IdIndex,
    pool: SlotPool<T>,
    cursor: Cursor,
    growth: usize,
    growths: u64,
    live: usize,
}

impl<T> Default for IdTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> IdTable<T> {
    pub fn new() -> Self {
        Self::from_valid_config(IdTableConfig::default())
    }

    pub fn with_config(config: IdTableConfig) -> Result<Self> {
        config.validate()?;

        Ok(Self::from_valid_config(config))
    }

    fn from_valid_config(config: IdTableConfig) -> Self {
        Self {
            index: IdIndex::new(),
            pool: SlotPool::new(),
            cursor: Cursor::new(config.base, config.limit),
            growth: config.initial_growth,
            growths: 0,
            live: 0,
        }
    }

    pub fn base(&self) -> Id {
        self.cursor.base
    }

    pub fn limit(&self) -> Id {
        self.cursor.limit
    }

    /// Raises or lowers the smallest id issued from now on. Live ids below the
    /// new base stay valid.
    pub fn set_base(&mut self, base: Id) {
        self.cursor.base = base;
        if self.cursor.next < base {
            // Park; the next alloc rewinds from the new base.
            self.cursor.next = self.cursor.limit;
        }
    }

    /// Live ids at or above the new limit stay valid until freed.
    pub fn set_limit(&mut self, limit: Id) {
        if self.cursor.is_exhausted() {
            self.cursor.next = limit;
        }
        self.cursor.limit = limit;
    }

    /// Slots in the next chunk. Later chunks keep growing geometrically.
    pub fn set_growth(&mut self, growth: usize) {
        self.growth = growth.clamp(1, u32::MAX as usize);
    }

    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Ids the table can hold before it needs another chunk.
    pub fn capacity(&self) -> usize {
        self.index.len()
    }

    /// Issues the next free id and binds `value` to it.
    pub fn alloc(&mut self, value: T) -> Result<(Id, &mut T)> {
        self.alloc_with(|_| value)
    }

    /// Like [`IdTable::alloc`], building the payload from the issued id.
    pub fn alloc_with<F>(&mut self, f: F) -> Result<(Id, &mut T)>
    where
        F: FnOnce(Id) -> T,
    {
        if self.cursor.is_exhausted() && !self.cursor.rewind(&mut self.index) {
            debug!(
                "id table alloc: no more id space {}/{}",
                self.cursor.next, self.cursor.limit
            );
            return Err(IdTableError::OutOfIds {
                next: self.cursor.next,
                limit: self.cursor.limit,
            });
        }
        self.ensure_room()?;

        let id = self.cursor.next;
        let value = f(id);
        let slot = self.take_slot()?;

        self.index.push_head(IndexEntry::live(id, slot));
        self.live += 1;
        self.cursor.advance(&mut self.index);

        Ok((id, self.pool.fill(slot, value)))
    }

    /// Binds `value` to the caller-chosen `id`, e.g. one recovered from a
    /// peer's message.
    pub fn alloc_at(&mut self, id: Id, value: T) -> Result<&mut T> {
        if self.contains(id) {
            return Err(IdTableError::AlreadyInUse(id));
        }
        if id < self.cursor.base || id >= self.cursor.limit {
            return Err(IdTableError::IdMismatch {
                requested: id,
                issued: None,
            });
        }

        self.cursor.seek(&mut self.index, id);
        let (issued, _) = self.alloc(value)?;
        if issued != id {
            self.free(issued);
            return Err(IdTableError::IdMismatch {
                requested: id,
                issued: Some(issued),
            });
        }

        self.lookup_mut(id).ok_or(IdTableError::IdMismatch {
            requested: id,
            issued: Some(issued),
        })
    }

    pub fn lookup(&self, id: Id) -> Option<&T> {
        self.pool.get(self.index.slot(id)?)
    }

    pub fn lookup_mut(&mut self, id: Id) -> Option<&mut T> {
        self.pool.get_mut(self.index.slot(id)?)
    }

    pub fn contains(&self, id: Id) -> bool {
        self.index.slot(id).is_some()
    }

    /// Frees `id`. Returns `false` when it was not live, including a second
    /// free of the same id.
    pub fn free(&mut self, id: Id) -> bool {
        self.remove(id).is_some()
    }

    /// Frees `id` and hands back its payload.
    pub fn remove(&mut self, id: Id) -> Option<T> {
        let (slot, head_shrank) = self.index.release(id)?;
        self.live -= 1;
        if head_shrank {
            self.cursor.retreat(&self.index);
        }

        self.pool.take(slot)
    }

    /// Live `(id, payload)` pairs. Ids ascend within each run, not overall.
    pub fn iter(&self) -> impl Iterator<Item = (Id, &T)> + '_ {
        self.index
            .live()
            .filter_map(move |(id, slot)| self.pool.get(slot).map(|value| (id, value)))
    }

    /// Tears the table down, handing every live payload to `finalizer` once.
    pub fn destroy<F>(self, mut finalizer: F)
    where
        F: FnMut(Id, T),
    {
        let Self {
            index, mut pool, ..
        } = self;

        for (id, slot) in index.live() {
            if let Some(value) = pool.take(slot) {
                finalizer(id, value);
            }
        }
    }

    pub fn stats(&self) -> IdTableStats {
        let (head_dead, tail_dead) = self.index.dead_counts();

        IdTableStats {
            live: self.live,
            index_len: self.index.len(),
            hole: self.index.hole(),
            head_dead,
            tail_dead,
            chunks: self.pool.chunk_count(),
            free_slots: self.pool.free_slots(),
            growth: self.growth,
            growths: self.growths,
            compactions: self.index.compactions(),
            rewinds: self.cursor.rewinds,
            next: self.cursor.next,
        }
    }

    /// Makes the hole non-empty: compact the head run, then the tail run, and
    /// only if neither reclaims anything grow by one chunk.
    fn ensure_room(&mut self) -> Result<()> {
        if !self.index.hole().is_empty() {
            return Ok(());
        }
        if self.index.compact_head() || self.index.compact_tail() {
            return Ok(());
        }

        self.grow()
    }

    /// Pops the slot backing the next head entry. Every hole position has a
    /// free slot behind it, so the grow below only runs if that slipped.
    fn take_slot(&mut self) -> Result<SlotKey> {
        debug_assert!(self.pool.free_slots() > 0, "index hole without a free slot");
        loop {
            match self.pool.pop_free() {
                Some(slot) => return Ok(slot),
                None => self.grow()?,
            }
        }
    }

    fn grow(&mut self) -> Result<()> {
        let growth = self.growth;
        let out_of_memory = |source| {
            debug!("id table alloc: no memory for {} more entries", growth);
            IdTableError::OutOfMemory { growth, source }
        };

        // Every reservation happens before anything observable changes.
        let chunk = self.pool.prepare_chunk(growth).map_err(out_of_memory)?;
        self.index.try_reserve(growth).map_err(out_of_memory)?;

        self.pool.adopt(chunk);
        self.index.widen_hole(growth);
        self.growths += 1;
        self.growth = growth.max(self.index.len()).min(u32::MAX as usize);

        debug!(
            "id table grew by {}: {} entries in {} chunks",
            growth,
            self.index.len(),
            self.pool.chunk_count()
        );

        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn assert_invariants(&self) {
        let head = self.index.head();
        let tail = self.index.tail();

        assert!(head.windows(2).all(|w| w[0].id < w[1].id), "head unsorted");
        assert!(tail.windows(2).all(|w| w[0].id < w[1].id), "tail unsorted");
        if let (Some(h), Some(t)) = (head.last(), tail.first()) {
            assert!(h.id < t.id, "runs overlap");
        }
        assert!(head.last().map_or(true, IndexEntry::is_live), "dead head end");
        assert!(tail.first().map_or(true, IndexEntry::is_live), "dead tail front");

        let dead = |run: &[IndexEntry]| run.iter().filter(|e| !e.is_live()).count();
        assert_eq!(self.index.dead_counts(), (dead(head), dead(tail)));

        if !self.cursor.is_exhausted() {
            let next = self.cursor.next;
            assert!(next >= self.cursor.base);
            assert!(head.last().map_or(true, |e| e.id < next), "head above cursor");
            assert!(tail.first().map_or(true, |e| e.id > next), "tail at cursor");
        }

        assert_eq!(self.index.live().count(), self.live);
        assert_eq!(self.pool.slot_count(), self.index.len());
        assert_eq!(self.pool.free_slots(), self.index.len() - self.live);
    }
}
