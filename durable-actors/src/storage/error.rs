//! Storage error types.

/// Errors that can occur during storage operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    /// Storage backend is unavailable.
    #[error("storage unavailable")]
    Unavailable,

    /// A write (put, delete, alarm change) was rejected by the backend.
    #[error("write failed for key {key:?}: {reason}")]
    WriteFailed {
        /// Key the write targeted (`None` for whole-store operations).
        key: Option<String>,
        /// Backend-provided reason.
        reason: String,
    },

    /// The transaction was already committed.
    #[error("transaction already closed")]
    TransactionClosed,

    /// A transaction was opened from within another transaction.
    #[error("nested transactions are not supported")]
    NestedTransaction,
}
