//! Dense integer handle tables.
//!
//! An [`IdTable`] hands out small integer ids from a bounded range, binds each
//! to a payload, and reuses ids once they are freed. Storage grows a chunk at
//! a time and freed positions are reclaimed by compaction only when the table
//! needs room.

pub mod allocators;
pub mod utils;

pub use allocators::{
    Id, IdTable, IdTableConfig, IdTableError, IdTableStats, SharedIdTable, DEFAULT_ID_BASE,
    DEFAULT_ID_LIMIT, DEFAULT_INITIAL_GROWTH,
};
