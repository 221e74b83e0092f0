use tracing::debug;

use super::{Id, IdIndex};

/// Decides which id is issued next.
///
/// Outside the exhausted state (`next >= limit`) every head id is below
/// `next`, every tail id is above it, and `next` itself is not live.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Cursor {
    pub(crate) base: Id,
    pub(crate) limit: Id,
    pub(crate) next: Id,
    pub(crate) rewinds: u64,
}

impl Cursor {
    pub(crate) fn new(base: Id, limit: Id) -> Self {
        Self {
            base,
            limit,
            next: base,
            rewinds: 0,
        }
    }

    #[inline]
    pub(crate) fn is_exhausted(&self) -> bool {
        self.next >= self.limit
    }

    /// Steps past the id just pushed onto the head run, pulling any run of
    /// consecutive live ids at the front of the tail over into the head.
    pub(crate) fn advance(&mut self, index: &mut IdIndex) {
        let mut next = self.next + 1;
        let mut skipped = 0;

        for entry in index.tail() {
            if entry.id != next || !entry.is_live() {
                break;
            }
            next += 1;
            skipped += 1;
        }

        if skipped > 0 {
            index.move_to_head(index.hole().end + skipped);
        }
        index.shrink_head();
        index.shrink_tail();

        self.next = next;
        if self.is_exhausted() {
            self.rewind(index);
        }
    }

    /// Searches `[base, limit)` for a reusable id and moves the hole there.
    ///
    /// Returns `false` and parks the cursor at `limit` when every id is live.
    pub(crate) fn rewind(&mut self, index: &mut IdIndex) -> bool {
        self.rewinds += 1;

        match first_free(index, self.base, self.limit) {
            Some(id) => {
                debug!("id table rewound to {}", id);
                self.seek(index, id);
                true
            }
            None => {
                debug!("id table rewind found no free id in {}..{}", self.base, self.limit);
                self.next = self.limit;
                false
            }
        }
    }

    /// Repositions the hole so that `id` is the next id issued. `id` must not
    /// be live.
    pub(crate) fn seek(&mut self, index: &mut IdIndex, id: Id) {
        let head = index.head();
        let pos = head.partition_point(|e| e.id < id);

        if pos < head.len() {
            index.move_to_tail(pos);
        } else {
            let pos = index.tail().partition_point(|e| e.id < id);
            if pos > 0 {
                index.move_to_head(index.hole().end + pos);
            }
        }

        // Drops a dead entry still carrying `id` along with its neighbours.
        index.shrink_head();
        index.shrink_tail();

        self.next = id;
    }

    /// Pulls the cursor back after the head run lost its last entries, so the
    /// freed ids are reissued first.
    pub(crate) fn retreat(&mut self, index: &IdIndex) {
        if self.is_exhausted() {
            return;
        }

        let floor = index
            .head()
            .last()
            .map_or(self.base, |e| e.id + 1)
            .max(self.base);
        self.next = self.next.min(floor);
    }
}

/// Smallest id in `[base, limit)` that is absent from both runs or present
/// but dead.
fn first_free(index: &IdIndex, base: Id, limit: Id) -> Option<Id> {
    let mut candidate = base;

    for run in [index.head(), index.tail()] {
        let start = run.partition_point(|e| e.id < candidate);
        for entry in &run[start..] {
            if entry.id != candidate || !entry.is_live() {
                return (candidate < limit).then_some(candidate);
            }
            candidate = entry.id + 1;
        }
    }

    (candidate < limit).then_some(candidate)
}
