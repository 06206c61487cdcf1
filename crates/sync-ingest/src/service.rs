//! The ingestion core's only public surface (spec.md §6.3): validate a
//! batch, then apply each operation in order.

use std::sync::Arc;

use sync_core::{ClientId, EnrichedOperation, Operation, OperationKind, SeqNo, UserId};
use sync_storage::{SqliteInitError, Storage, Store};
use tracing::{info, instrument};

use crate::config::IngestConfig;
use crate::dispatcher::Dispatcher;
use crate::error::IngestError;
use crate::validate::BatchValidator;

/// Resolves one wire-level operation (`{"type", "timestamp", "payload"}`,
/// spec.md §6.1) into its typed form.
///
/// The discriminator is checked against the closed set before the full
/// shape is deserialized, so an unknown `type` is reported as
/// `UnknownOperationType` with the offending string rather than a generic
/// `serde` parse error.
///
/// # Errors
///
/// Returns `IngestError::UnknownOperationType` if `raw["type"]` is missing,
/// not a string, outside the closed discriminator set, or if the payload
/// does not match the shape the resolved kind expects.
pub fn parse_operation(raw: serde_json::Value) -> Result<Operation, IngestError> {
    let kind_str = raw
        .get("type")
        .and_then(serde_json::Value::as_str)
        .unwrap_or_default()
        .to_string();
    OperationKind::parse(&kind_str).map_err(|unknown| IngestError::UnknownOperationType(unknown.to_string()))?;
    serde_json::from_value(raw).map_err(|_| IngestError::UnknownOperationType(kind_str))
}

/// Facade over a `Storage` backend exposing the ingestion core's contract:
/// validate, then apply (spec.md §6.3). Mirrors the teacher's `AppServices`
/// aggregate-of-services pattern.
#[derive(Clone)]
pub struct IngestService {
    storage: Storage,
    validator: BatchValidator,
}

impl IngestService {
    #[must_use]
    pub fn new(storage: Storage, config: &IngestConfig) -> Self {
        Self {
            storage,
            validator: BatchValidator::new(config.max_ops as usize),
        }
    }

    /// Builds a service over an in-process store, for tests and local runs.
    #[must_use]
    pub fn in_memory(config: &IngestConfig) -> Self {
        Self::new(Storage::in_memory(), config)
    }

    /// Builds a service over a `SQLite` database, applying the configured
    /// pool shape and migrations first.
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError` if connection or migration fails.
    pub async fn connect_sqlite(config: &IngestConfig) -> Result<Self, SqliteInitError> {
        let storage = Storage::sqlite_with(&config.database_url, config.pool_max_connections, config.busy_timeout).await?;
        Ok(Self::new(storage, config))
    }

    fn store(&self) -> &Arc<dyn Store> {
        &self.storage.store
    }

    /// Exposes the underlying storage handle, e.g. for tests that need to
    /// read a stored row back directly.
    #[must_use]
    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// Validates, then applies, a batch of operations already enriched with
    /// `user_id` and `client_id` (spec.md §6.3). Returns the sequence number
    /// assigned to each operation, in order.
    ///
    /// # Errors
    ///
    /// Returns `IngestError::TooManyOperations` without reserving any
    /// sequence numbers if the batch exceeds the configured cap. Otherwise
    /// propagates the first per-operation failure; operations applied
    /// before that failure remain applied (spec.md §7).
    #[instrument(skip(self, ops), fields(user_id = %user_id, client_id = %client_id, batch_len = ops.len()))]
    pub async fn apply_batch(
        &self,
        user_id: UserId,
        client_id: ClientId,
        ops: Vec<Operation>,
    ) -> Result<Vec<SeqNo>, IngestError> {
        let enriched: Vec<EnrichedOperation> = ops
            .into_iter()
            .map(|operation| EnrichedOperation::new(user_id.clone(), client_id.clone(), operation))
            .collect();
        self.validator.validate(&enriched)?;

        self.store().ensure_user(&user_id).await?;

        let dispatcher = Dispatcher::new(self.store().as_ref());
        let mut seq_nos = Vec::with_capacity(enriched.len());
        for op in enriched {
            seq_nos.push(dispatcher.apply(op).await?);
        }
        info!(applied = seq_nos.len(), "batch applied");
        Ok(seq_nos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sync_core::{CardId, CardPayload, OperationPayload};

    fn card_op(id: &str, timestamp: i64, stability: f64) -> Operation {
        Operation {
            timestamp,
            payload: OperationPayload::Card(CardPayload {
                id: CardId::new(id).unwrap(),
                due: 0,
                stability,
                difficulty: 0.0,
                elapsed_days: 0.0,
                scheduled_days: 0.0,
                reps: 0,
                lapses: 0,
                state: 0,
                last_review: None,
            }),
        }
    }

    #[tokio::test]
    async fn sequence_numbers_are_strictly_increasing_within_a_batch() {
        let service = IngestService::in_memory(&IngestConfig::default());
        let user = UserId::new("u1").unwrap();
        let client = ClientId::new("c1").unwrap();
        let ops = vec![card_op("a", 1, 1.0), card_op("b", 2, 1.0), card_op("c", 3, 1.0)];
        let seq_nos = service.apply_batch(user, client, ops).await.unwrap();
        assert!(seq_nos.windows(2).all(|w| w[1].value() > w[0].value()));
    }

    #[tokio::test]
    async fn rejects_oversized_batch_without_reserving_sequence_numbers() {
        let config = IngestConfig { max_ops: 2, ..IngestConfig::default() };
        let service = IngestService::in_memory(&config);
        let user = UserId::new("u1").unwrap();
        let client = ClientId::new("c1").unwrap();
        let ops = vec![card_op("a", 1, 1.0), card_op("b", 2, 1.0), card_op("c", 3, 1.0)];
        let err = service.apply_batch(user.clone(), client.clone(), ops).await.unwrap_err();
        assert_eq!(err.to_string(), "Too many operations");

        let ok = service.apply_batch(user, client, vec![card_op("a", 1, 1.0)]).await.unwrap();
        assert_eq!(ok[0].value(), 1);
    }

    #[test]
    fn unknown_operation_type_is_rejected() {
        let raw = serde_json::json!({
            "type": "bogus",
            "timestamp": 0,
            "payload": {},
        });
        let err = parse_operation(raw).unwrap_err();
        assert!(matches!(err, IngestError::UnknownOperationType(ref kind) if kind == "bogus"));
    }

    #[test]
    fn parses_a_well_formed_wire_operation() {
        let raw = serde_json::json!({
            "type": "cardSuspended",
            "timestamp": 1700000000,
            "payload": { "cardId": "c1", "suspended": true },
        });
        let op = parse_operation(raw).unwrap();
        assert_eq!(op.timestamp, 1_700_000_000);
        assert!(matches!(op.payload, OperationPayload::CardSuspended(_)));
    }
}
