//! In-memory `Store` implementation, used for fast deterministic unit tests
//! of the merge primitives and dispatcher without standing up SQLite
//! (mirrors the teacher's `InMemoryRepository`).

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use sync_core::{CardId, ClientId, DeckId, ReviewLogId, SeqNo, UserId};

use crate::error::StorageError;
use crate::repository::{Store, StoredCardDeckRow, StoredLwwRow, StoredReviewLogRow};
use crate::schema::LwwTable;
use crate::value::Value;

fn key_repr(key: &[Value]) -> String {
    key.iter()
        .map(|v| v.as_text().unwrap_or_default())
        .collect::<Vec<_>>()
        .join("\u{1}")
}

#[derive(Default)]
struct State {
    users: HashMap<UserId, i64>,
    lww: HashMap<&'static str, HashMap<String, StoredLwwRow>>,
    review_logs: HashMap<String, StoredReviewLogRow>,
    card_decks: HashMap<String, StoredCardDeckRow>,
}

/// In-memory backing store. Cheap to clone (shares state via `Arc`).
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<State>>,
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn ensure_user(&self, user_id: &UserId) -> Result<(), StorageError> {
        let mut guard = self.lock();
        guard.users.entry(user_id.clone()).or_insert(1);
        Ok(())
    }

    async fn reserve_seq(&self, user_id: &UserId, n: i64) -> Result<SeqNo, StorageError> {
        let mut guard = self.lock();
        let next = guard.users.get_mut(user_id).ok_or(StorageError::NotFound)?;
        let first = *next;
        *next += n;
        Ok(SeqNo::new(first))
    }

    async fn lww_upsert(
        &self,
        table: LwwTable,
        user_id: &UserId,
        key: &[Value],
        payload: &[(&'static str, Value)],
        timestamp: i64,
        client_id: &ClientId,
        seq_no: SeqNo,
    ) -> Result<bool, StorageError> {
        let mut guard = self.lock();
        let rows = guard.lww.entry(table.table).or_default();
        let repr = key_repr(key);

        let dominates = match rows.get(&repr) {
            None => true,
            Some(existing) => {
                (timestamp, client_id.as_str())
                    > (existing.last_modified, existing.last_modified_client.as_str())
            }
        };

        if dominates {
            rows.insert(
                repr,
                StoredLwwRow {
                    user_id: user_id.clone(),
                    payload: payload.iter().map(|(k, v)| ((*k).to_string(), v.clone())).collect(),
                    last_modified: timestamp,
                    last_modified_client: client_id.clone(),
                    seq_no,
                },
            );
        }
        Ok(dominates)
    }

    async fn lww_get(
        &self,
        table: LwwTable,
        key: &[Value],
    ) -> Result<Option<StoredLwwRow>, StorageError> {
        let guard = self.lock();
        Ok(guard
            .lww
            .get(table.table)
            .and_then(|rows| rows.get(&key_repr(key)))
            .cloned())
    }

    async fn review_log_insert(
        &self,
        id: &ReviewLogId,
        user_id: &UserId,
        payload: &[(&'static str, Value)],
        timestamp: i64,
        client_id: &ClientId,
        seq_no: SeqNo,
    ) -> Result<bool, StorageError> {
        let mut guard = self.lock();
        if guard.review_logs.contains_key(id.as_str()) {
            return Ok(false);
        }
        guard.review_logs.insert(
            id.as_str().to_string(),
            StoredReviewLogRow {
                user_id: user_id.clone(),
                payload: payload.iter().map(|(k, v)| ((*k).to_string(), v.clone())).collect(),
                last_modified: timestamp,
                last_modified_client: client_id.clone(),
                seq_no,
            },
        );
        Ok(true)
    }

    async fn review_log_get(
        &self,
        id: &ReviewLogId,
    ) -> Result<Option<StoredReviewLogRow>, StorageError> {
        Ok(self.lock().review_logs.get(id.as_str()).cloned())
    }

    async fn card_deck_upsert(
        &self,
        user_id: &UserId,
        card_id: &CardId,
        deck_id: &DeckId,
        cl_count: i64,
        timestamp: i64,
        client_id: &ClientId,
        seq_no: SeqNo,
    ) -> Result<bool, StorageError> {
        let mut guard = self.lock();
        let repr = format!("{}\u{1}{}", card_id.as_str(), deck_id.as_str());
        let dominates = match guard.card_decks.get(&repr) {
            None => true,
            Some(existing) => cl_count > existing.cl_count,
        };
        if dominates {
            guard.card_decks.insert(
                repr,
                StoredCardDeckRow {
                    user_id: user_id.clone(),
                    cl_count,
                    last_modified: timestamp,
                    last_modified_client: client_id.clone(),
                    seq_no,
                },
            );
        }
        Ok(dominates)
    }

    async fn card_deck_get(
        &self,
        card_id: &CardId,
        deck_id: &DeckId,
    ) -> Result<Option<StoredCardDeckRow>, StorageError> {
        let repr = format!("{}\u{1}{}", card_id.as_str(), deck_id.as_str());
        Ok(self.lock().card_decks.get(&repr).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uid(s: &str) -> UserId {
        UserId::new(s).unwrap()
    }

    fn cid(s: &str) -> ClientId {
        ClientId::new(s).unwrap()
    }

    #[tokio::test]
    async fn reserve_fails_for_unknown_user() {
        let store = InMemoryStore::new();
        let err = store.reserve_seq(&uid("u1"), 1).await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound));
    }

    #[tokio::test]
    async fn reserve_allocates_contiguous_range() {
        let store = InMemoryStore::new();
        store.ensure_user(&uid("u1")).await.unwrap();
        // simulate nextSeqNo already at 5
        store.reserve_seq(&uid("u1"), 4).await.unwrap();
        let first = store.reserve_seq(&uid("u1"), 3).await.unwrap();
        assert_eq!(first.value(), 5);
    }

    #[tokio::test]
    async fn lww_upsert_prefers_dominant_client_on_tie() {
        let store = InMemoryStore::new();
        let key = [Value::Text("card-1".into())];
        store
            .lww_upsert(
                LwwTable::CARDS,
                &uid("u1"),
                &key,
                &[("stability", Value::Real(1.0))],
                100,
                &cid("A"),
                SeqNo::new(1),
            )
            .await
            .unwrap();
        let applied = store
            .lww_upsert(
                LwwTable::CARDS,
                &uid("u1"),
                &key,
                &[("stability", Value::Real(2.0))],
                100,
                &cid("B"),
                SeqNo::new(2),
            )
            .await
            .unwrap();
        assert!(applied);
        let row = store.lww_get(LwwTable::CARDS, &key).await.unwrap().unwrap();
        assert_eq!(row.payload[0].1.as_real(), Some(2.0));
    }

    #[tokio::test]
    async fn card_deck_upsert_ignores_late_replay() {
        let store = InMemoryStore::new();
        let card = CardId::new("c1").unwrap();
        let deck = DeckId::new("d1").unwrap();
        store
            .card_deck_upsert(&uid("u1"), &card, &deck, 1, 10, &cid("A"), SeqNo::new(1))
            .await
            .unwrap();
        store
            .card_deck_upsert(&uid("u1"), &card, &deck, 2, 11, &cid("A"), SeqNo::new(2))
            .await
            .unwrap();
        let applied = store
            .card_deck_upsert(&uid("u1"), &card, &deck, 1, 12, &cid("A"), SeqNo::new(3))
            .await
            .unwrap();
        assert!(!applied);
        let row = store.card_deck_get(&card, &deck).await.unwrap().unwrap();
        assert_eq!(row.cl_count, 2);
    }
}
