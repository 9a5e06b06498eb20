//! Error taxonomy for the chronicle engine.
//!
//! `MediumError` covers raw persistence-medium failures, `StorageError`
//! the storage-adapter boundary, and `StoreError` session-store
//! operations. Everything at the persistence boundary is caught and
//! converted; nothing propagates as a panic into calling code.

use thiserror::Error;
use uuid::Uuid;

/// Errors raised by a raw storage medium.
#[derive(Debug, Error)]
pub enum MediumError {
    /// The platform rejected the write because the namespace is out of
    /// space.
    #[error("storage quota exceeded")]
    QuotaExceeded,

    /// The medium exists but cannot be used in this execution context.
    #[error("storage medium unavailable")]
    Unavailable,

    /// Any other underlying I/O failure.
    #[error("storage I/O error: {0}")]
    Io(String),
}

/// Errors from the storage adapter (load/save of the full history state).
#[derive(Debug, Error)]
pub enum StorageError {
    /// Persisted data failed the validating decode. Recovered locally by
    /// substituting the empty state.
    #[error("corrupt persisted history: {0}")]
    Corrupt(String),

    #[error("serialization failed: {0}")]
    Serialize(String),

    /// The optimized payload exceeds the hard size budget. Nothing was
    /// written.
    #[error("history of {estimated_bytes} bytes exceeds the {budget_bytes} byte budget")]
    StorageFull {
        estimated_bytes: usize,
        budget_bytes: usize,
    },

    /// The platform-level quota rejected the write.
    #[error("storage quota exceeded")]
    QuotaExceeded,

    /// Generic write failure from the underlying medium.
    #[error("storage medium error: {0}")]
    Medium(String),
}

impl From<MediumError> for StorageError {
    fn from(err: MediumError) -> Self {
        match err {
            MediumError::QuotaExceeded => StorageError::QuotaExceeded,
            MediumError::Unavailable => StorageError::Medium("medium unavailable".to_string()),
            MediumError::Io(msg) => StorageError::Medium(msg),
        }
    }
}

/// Errors from session-store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Switch/delete/update against an id not present in the store.
    /// Non-fatal; the state is left unchanged.
    #[error("session {0} not found")]
    SessionNotFound(Uuid),

    #[error(transparent)]
    Storage(#[from] StorageError),
}
