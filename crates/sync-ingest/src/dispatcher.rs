use sync_core::{EnrichedOperation, SeqNo};
use sync_storage::{Store, StorageError};
use tracing::{instrument, warn};

use crate::error::IngestError;
use crate::handlers;

/// Reserves a sequence number for an operation's owner and routes it to its
/// handler (spec.md §4.4). The discriminator match in [`handlers::apply_operation`]
/// is exhaustive over [`sync_core::OperationKind`] at compile time; there is
/// no dynamic "unknown kind" branch left to reach once an operation has
/// parsed into an [`sync_core::OperationPayload`] at all.
pub struct Dispatcher<'a> {
    store: &'a dyn Store,
}

impl<'a> Dispatcher<'a> {
    #[must_use]
    pub fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// # Errors
    ///
    /// Returns `IngestError::SequenceAllocationFailed` if the user row is
    /// missing, or propagates any other storage error from the reservation
    /// or the merge.
    #[instrument(skip(self, op), fields(kind = ?op.kind()))]
    pub async fn apply(&self, op: EnrichedOperation) -> Result<SeqNo, IngestError> {
        let seq_no = match self.store.reserve_seq(&op.user_id, 1).await {
            Ok(seq_no) => seq_no,
            Err(StorageError::NotFound) => {
                warn!(user_id = %op.user_id, "sequence allocation failed: unknown user");
                return Err(IngestError::SequenceAllocationFailed {
                    user_id: op.user_id.clone(),
                });
            }
            Err(other) => return Err(IngestError::Storage(other)),
        };

        handlers::apply_operation(self.store, &op, seq_no).await?;
        Ok(seq_no)
    }
}
