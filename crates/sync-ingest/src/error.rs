use thiserror::Error;
use sync_core::UserId;

/// Errors surfaced by the ingestion core (spec.md §7). Every variant is
/// surfaced to the caller unchanged; none are retried internally.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum IngestError {
    #[error("Too many operations")]
    TooManyOperations,

    #[error("sequence allocation failed for user {user_id}")]
    SequenceAllocationFailed { user_id: UserId },

    #[error("unknown operation type: {0}")]
    UnknownOperationType(String),

    #[error(transparent)]
    Storage(#[from] sync_storage::StorageError),
}
