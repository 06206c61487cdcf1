//! Repository contract the ingestion core is built against (spec.md §4).
//!
//! One trait, [`Store`], carries all three merge primitives plus the
//! sequence allocator. Each LWW table is addressed by its
//! [`schema::LwwTable`] descriptor rather than by a dedicated method, which
//! is what lets `sync-ingest`'s handlers share one merge routine across all
//! seven LWW tables (spec.md §9).

use std::sync::Arc;

use async_trait::async_trait;
use sync_core::{ClientId, SeqNo, UserId};

use crate::error::StorageError;
use crate::schema::LwwTable;
use crate::value::Value;

/// A stored LWW-register row, as read back for tests and diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredLwwRow {
    pub user_id: UserId,
    pub payload: Vec<(String, Value)>,
    pub last_modified: i64,
    pub last_modified_client: ClientId,
    pub seq_no: SeqNo,
}

/// A stored grow-only-set row.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredReviewLogRow {
    pub user_id: UserId,
    pub payload: Vec<(String, Value)>,
    pub last_modified: i64,
    pub last_modified_client: ClientId,
    pub seq_no: SeqNo,
}

/// A stored counter-backed-set row.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredCardDeckRow {
    pub user_id: UserId,
    pub cl_count: i64,
    pub last_modified: i64,
    pub last_modified_client: ClientId,
    pub seq_no: SeqNo,
}

#[async_trait]
pub trait Store: Send + Sync {
    /// Provisions a user row with `next_seq_no = 1` if one does not already
    /// exist. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on connection failure.
    async fn ensure_user(&self, user_id: &UserId) -> Result<(), StorageError>;

    /// Atomically reserves a contiguous run of `n` sequence numbers for
    /// `user_id`, returning the first (spec.md §4.1).
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the user row does not exist or
    /// the update affects zero rows.
    async fn reserve_seq(&self, user_id: &UserId, n: i64) -> Result<SeqNo, StorageError>;

    /// Installs `payload` at `key` in `table` iff it dominates the stored
    /// row under `(stamp.timestamp, stamp.client_id)` (spec.md §4.2.1).
    /// Returns whether the write was applied.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on connection or serialization failure.
    async fn lww_upsert(
        &self,
        table: LwwTable,
        user_id: &UserId,
        key: &[Value],
        payload: &[(&'static str, Value)],
        timestamp: i64,
        client_id: &ClientId,
        seq_no: SeqNo,
    ) -> Result<bool, StorageError>;

    /// Fetches the stored row at `key` in `table`, if any.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on connection or serialization failure.
    async fn lww_get(
        &self,
        table: LwwTable,
        key: &[Value],
    ) -> Result<Option<StoredLwwRow>, StorageError>;

    /// Inserts a review log row if its id is unused; a no-op on collision
    /// (spec.md §4.2.2). Returns whether the row was newly inserted.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on connection or serialization failure.
    async fn review_log_insert(
        &self,
        id: &sync_core::ReviewLogId,
        user_id: &UserId,
        payload: &[(&'static str, Value)],
        timestamp: i64,
        client_id: &ClientId,
        seq_no: SeqNo,
    ) -> Result<bool, StorageError>;

    /// Fetches a stored review log row by id, if any.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on connection or serialization failure.
    async fn review_log_get(
        &self,
        id: &sync_core::ReviewLogId,
    ) -> Result<Option<StoredReviewLogRow>, StorageError>;

    /// Installs `cl_count` at `(card_id, deck_id)` iff it strictly exceeds
    /// the stored counter (spec.md §4.2.3). Returns whether the write was
    /// applied.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on connection or serialization failure.
    async fn card_deck_upsert(
        &self,
        user_id: &UserId,
        card_id: &sync_core::CardId,
        deck_id: &sync_core::DeckId,
        cl_count: i64,
        timestamp: i64,
        client_id: &ClientId,
        seq_no: SeqNo,
    ) -> Result<bool, StorageError>;

    /// Fetches the stored `(card_id, deck_id)` counter row, if any.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on connection or serialization failure.
    async fn card_deck_get(
        &self,
        card_id: &sync_core::CardId,
        deck_id: &sync_core::DeckId,
    ) -> Result<Option<StoredCardDeckRow>, StorageError>;
}

/// Thin handle over a `Store` implementation, mirroring the aggregate
/// `Storage` facade pattern used to swap backends without touching callers.
#[derive(Clone)]
pub struct Storage {
    pub store: Arc<dyn Store>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            store: Arc::new(crate::memory::InMemoryStore::new()),
        }
    }
}
