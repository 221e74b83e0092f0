pub mod config;
pub mod error;
pub mod id_table;
pub mod shared;
pub mod stats;

mod cursor;
mod id_index;
mod slot_key;
mod slot_pool;

pub use config::*;
pub use error::*;
pub use id_table::*;
pub use shared::*;
pub use stats::*;

pub(crate) use cursor::Cursor;
pub(crate) use id_index::{IdIndex, IndexEntry};
pub(crate) use slot_key::SlotKey;
pub(crate) use slot_pool::SlotPool;

/// Handle value as carried in a 32-bit wire field.
pub type Id = u32;

const CHUNK_SHIFT: u32 = u64::BITS / 2;
const OFFSET_MASK: u64 = (1 << CHUNK_SHIFT) - 1;
