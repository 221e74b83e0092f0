use std::collections::TryReserveError;

use thiserror::Error;

use super::Id;

pub type Result<T> = std::result::Result<T, IdTableError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdTableError {
    /// Every id in `[base, limit)` is live. A capacity signal, not a fault.
    #[error("no more id space {next}/{limit}")]
    OutOfIds { next: Id, limit: Id },

    /// Growing the slot pool or the index failed. The table is unchanged.
    #[error("no memory to grow id table by {growth} entries")]
    OutOfMemory {
        growth: usize,
        #[source]
        source: TryReserveError,
    },

    #[error("id {0} is already in use")]
    AlreadyInUse(Id),

    #[error("requested id {requested} but the table issued {issued:?}")]
    IdMismatch { requested: Id, issued: Option<Id> },

    #[error("invalid id table configuration: {0}")]
    InvalidConfig(&'static str),
}
