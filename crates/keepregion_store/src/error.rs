//! Store error types.

use std::path::PathBuf;

/// Errors that can occur while writing the region document.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Failed to encode the region document.
    #[error("failed to encode region document: {0}")]
    Encode(#[from] serde_json::Error),

    /// A filesystem operation failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// The file or directory being accessed.
        path: PathBuf,
        /// The underlying error.
        source: std::io::Error,
    },
}

/// Reasons a single persisted record is rejected during load.
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    /// The list element is not a key/value record.
    #[error("entry is not a record")]
    NotARecord,

    /// The record has no `id`.
    #[error("missing id")]
    MissingId,

    /// The `id` is not a valid UUID.
    #[error("invalid id: {0}")]
    InvalidId(#[source] uuid::Error),

    /// The record has no (or an empty) `world`.
    #[error("missing world")]
    MissingPartition,

    /// The `worldUuid` is present but not a valid UUID.
    #[error("invalid worldUuid: {0}")]
    InvalidPartitionId(#[source] uuid::Error),

    /// The `radius` is negative or larger than the widest enumerable region.
    #[error("radius {0} out of range")]
    RadiusOutOfRange(i64),

    /// The `createdAt` is present but not an ISO-8601 instant.
    #[error("invalid createdAt: {0}")]
    InvalidTimestamp(#[source] chrono::ParseError),
}
