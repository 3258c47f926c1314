use thiserror::Error;

/// Store failures the API layer must tell apart: missing rows, uniqueness
/// conflicts, and concurrent-update races each map to a distinct response.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(&'static str),

    /// UNIQUE constraint hit at write time; names the duplicated field.
    #[error("{0} already exists")]
    Duplicate(&'static str),

    /// The row was modified by another request since it was read. The
    /// caller may re-fetch and retry.
    #[error("record was modified concurrently")]
    Conflict,

    #[error("store lock poisoned")]
    LockPoisoned,

    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;
