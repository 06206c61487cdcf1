//! One handler per operation kind (spec.md §4.3). Every LWW-table handler
//! is a thin binding from a payload to [`apply_lww`]; only the grow-only and
//! counter-backed tables need their own primitive call, since there is only
//! one of each (spec.md §9's table-driven registry).

use sync_core::{ClientId, EnrichedOperation, OperationPayload, SeqNo, UserId};
use sync_storage::{LwwTable, Store, Value};

use crate::error::IngestError;

async fn apply_lww(
    store: &dyn Store,
    table: LwwTable,
    user_id: &UserId,
    key: &[Value],
    payload: &[(&'static str, Value)],
    timestamp: i64,
    client_id: &ClientId,
    seq_no: SeqNo,
) -> Result<(), IngestError> {
    store
        .lww_upsert(table, user_id, key, payload, timestamp, client_id, seq_no)
        .await?;
    Ok(())
}

/// Applies one enriched operation to `store` using the already-reserved
/// `seq_no`, dispatching on the payload's kind (spec.md §4.4).
///
/// # Errors
///
/// Propagates any `StorageError` from the underlying merge.
pub async fn apply_operation(
    store: &dyn Store,
    op: &EnrichedOperation,
    seq_no: SeqNo,
) -> Result<(), IngestError> {
    let user_id = &op.user_id;
    let client_id = &op.client_id;
    let timestamp = op.operation.timestamp;

    match &op.operation.payload {
        OperationPayload::Card(p) => {
            apply_lww(
                store,
                LwwTable::CARDS,
                user_id,
                &[Value::Text(p.id.as_str().to_string())],
                &[
                    ("due", Value::Int(p.due)),
                    ("stability", Value::Real(p.stability)),
                    ("difficulty", Value::Real(p.difficulty)),
                    ("elapsed_days", Value::Real(p.elapsed_days)),
                    ("scheduled_days", Value::Real(p.scheduled_days)),
                    ("reps", Value::Int(p.reps)),
                    ("lapses", Value::Int(p.lapses)),
                    ("state", Value::Int(p.state)),
                    ("last_review", Value::OptInt(p.last_review)),
                ],
                timestamp,
                client_id,
                seq_no,
            )
            .await
        }
        OperationPayload::CardContent(p) => {
            apply_lww(
                store,
                LwwTable::CARD_CONTENTS,
                user_id,
                &[Value::Text(p.card_id.as_str().to_string())],
                &[
                    ("front", Value::Text(p.front.clone())),
                    ("back", Value::Text(p.back.clone())),
                ],
                timestamp,
                client_id,
                seq_no,
            )
            .await
        }
        OperationPayload::CardDeleted(p) => {
            apply_lww(
                store,
                LwwTable::CARD_DELETED,
                user_id,
                &[Value::Text(p.card_id.as_str().to_string())],
                &[("deleted", Value::Bool(p.deleted))],
                timestamp,
                client_id,
                seq_no,
            )
            .await
        }
        OperationPayload::CardBookmarked(p) => {
            apply_lww(
                store,
                LwwTable::CARD_BOOKMARKED,
                user_id,
                &[Value::Text(p.card_id.as_str().to_string())],
                &[("bookmarked", Value::Bool(p.bookmarked))],
                timestamp,
                client_id,
                seq_no,
            )
            .await
        }
        OperationPayload::CardSuspended(p) => {
            apply_lww(
                store,
                LwwTable::CARD_SUSPENDED,
                user_id,
                &[Value::Text(p.card_id.as_str().to_string())],
                &[("suspended", Value::Bool(p.suspended))],
                timestamp,
                client_id,
                seq_no,
            )
            .await
        }
        OperationPayload::Deck(p) => {
            apply_lww(
                store,
                LwwTable::DECKS,
                user_id,
                &[Value::Text(p.id.as_str().to_string())],
                &[
                    ("name", Value::Text(p.name.clone())),
                    ("description", Value::OptText(p.description.clone())),
                    ("deleted", Value::Bool(p.deleted)),
                ],
                timestamp,
                client_id,
                seq_no,
            )
            .await
        }
        OperationPayload::ReviewLogDeleted(p) => {
            apply_lww(
                store,
                LwwTable::REVIEW_LOG_DELETED,
                user_id,
                &[Value::Text(p.review_log_id.as_str().to_string())],
                &[("deleted", Value::Bool(p.deleted))],
                timestamp,
                client_id,
                seq_no,
            )
            .await
        }
        OperationPayload::ReviewLog(p) => {
            store
                .review_log_insert(
                    &p.id,
                    user_id,
                    &[
                        ("card_id", Value::Text(p.card_id.as_str().to_string())),
                        ("grade", Value::Int(p.grade)),
                        ("state", Value::Int(p.state)),
                        ("due", Value::Int(p.due)),
                        ("stability", Value::Real(p.stability)),
                        ("difficulty", Value::Real(p.difficulty)),
                        ("elapsed_days", Value::Real(p.elapsed_days)),
                        ("last_elapsed_days", Value::Real(p.last_elapsed_days)),
                        ("scheduled_days", Value::Real(p.scheduled_days)),
                        ("review", Value::Int(p.review)),
                        ("duration", Value::Int(p.duration)),
                    ],
                    timestamp,
                    client_id,
                    seq_no,
                )
                .await?;
            Ok(())
        }
        OperationPayload::UpdateDeckCard(p) => {
            store
                .card_deck_upsert(
                    user_id,
                    &p.card_id,
                    &p.deck_id,
                    p.cl_count,
                    timestamp,
                    client_id,
                    seq_no,
                )
                .await?;
            Ok(())
        }
    }
}

