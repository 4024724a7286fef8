use thiserror::Error;

/// Failures of the record store that callers must see.
///
/// A missing, empty or malformed data file is not an error: the store
/// recovers by starting from a fresh state.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing the data file failed (permissions, disk full, ...)
    #[error("Store I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The in-memory store could not be serialized
    #[error("Store serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;
