//! Scenario tests straight from the testable-properties list: monotone
//! sequencing, LWW convergence and tie-breaking, grow-only idempotence,
//! counter monotonicity under replay, order independence, and the batch
//! cap's exact rejection behavior.

use sync_core::{
    CardContentPayload, CardId, CardPayload, ClientId, DeckId, Operation, OperationPayload,
    ReviewLogId, ReviewLogPayload, UpdateDeckCardPayload, UserId,
};
use sync_storage::{LwwTable, Value};
use sync_ingest::{IngestConfig, IngestService};

fn user(id: &str) -> UserId {
    UserId::new(id).unwrap()
}

fn client(id: &str) -> ClientId {
    ClientId::new(id).unwrap()
}

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

fn card_content_op(card_id: &str, timestamp: i64, front: &str) -> Operation {
    Operation {
        timestamp,
        payload: OperationPayload::CardContent(CardContentPayload {
            card_id: CardId::new(card_id).unwrap(),
            front: front.to_string(),
            back: "back".to_string(),
        }),
    }
}

fn review_log_op(id: &str, card_id: &str) -> Operation {
    Operation {
        timestamp: 1,
        payload: OperationPayload::ReviewLog(ReviewLogPayload {
            id: ReviewLogId::new(id).unwrap(),
            card_id: CardId::new(card_id).unwrap(),
            grade: 2,
            state: 1,
            due: 0,
            stability: 1.0,
            difficulty: 1.0,
            elapsed_days: 0.0,
            last_elapsed_days: 0.0,
            scheduled_days: 1.0,
            review: 1,
            duration: 1000,
        }),
    }
}

fn update_deck_card_op(card_id: &str, deck_id: &str, cl_count: i64, timestamp: i64) -> Operation {
    Operation {
        timestamp,
        payload: OperationPayload::UpdateDeckCard(UpdateDeckCardPayload {
            card_id: CardId::new(card_id).unwrap(),
            deck_id: DeckId::new(deck_id).unwrap(),
            cl_count,
        }),
    }
}

// Scenario A: reserve(n=3) starting from nextSeqNo=5 returns 5 and advances to 8.
#[tokio::test]
async fn scenario_a_reserve_returns_first_of_contiguous_run() {
    let service = IngestService::in_memory(&IngestConfig::default());
    let u = user("u1");
    let c = client("c1");

    // Burn seq numbers 1..=4 so nextSeqNo is 5 before the probe batch.
    let warmup: Vec<Operation> = (0..4).map(|i| card_op(&format!("warm-{i}"), i, 1.0)).collect();
    service.apply_batch(u.clone(), c.clone(), warmup).await.unwrap();

    let probe = vec![card_op("p1", 10, 1.0), card_op("p2", 11, 1.0), card_op("p3", 12, 1.0)];
    let seq_nos = service.apply_batch(u, c, probe).await.unwrap();
    assert_eq!(seq_nos.iter().map(|s| s.value()).collect::<Vec<_>>(), vec![5, 6, 7]);
}

// Scenario B: same card id, identical timestamp, higher clientId wins lexicographically.
#[tokio::test]
async fn scenario_b_lww_tiebreaks_on_client_id() {
    let service = IngestService::in_memory(&IngestConfig::default());
    let u = user("u1");

    service
        .apply_batch(u.clone(), client("A"), vec![card_op("shared", 100, 1.0)])
        .await
        .unwrap();
    service
        .apply_batch(u, client("B"), vec![card_op("shared", 100, 2.0)])
        .await
        .unwrap();

    let key = [Value::Text("shared".to_string())];
    let row = service
        .storage()
        .store
        .lww_get(LwwTable::CARDS, &key)
        .await
        .unwrap()
        .unwrap();
    let stability = row.payload.iter().find(|(name, _)| name == "stability").unwrap();
    assert_eq!(stability.1.as_real(), Some(2.0));
}

// Scenario C: an earlier-looking write from the same client on an older
// timestamp must not overwrite a later one.
#[tokio::test]
async fn scenario_c_older_timestamp_same_client_does_not_overwrite() {
    let service = IngestService::in_memory(&IngestConfig::default());
    let u = user("u1");
    let c = client("Z");

    service
        .apply_batch(u.clone(), c.clone(), vec![card_content_op("cc1", 100, "first")])
        .await
        .unwrap();
    service
        .apply_batch(u, c, vec![card_content_op("cc1", 99, "stale")])
        .await
        .unwrap();

    let key = [Value::Text("cc1".to_string())];
    let row = service
        .storage()
        .store
        .lww_get(LwwTable::CARD_CONTENTS, &key)
        .await
        .unwrap()
        .unwrap();
    let front = row.payload.iter().find(|(name, _)| name == "front").unwrap();
    assert_eq!(front.1.as_text(), Some("first"));
}

// Scenario D: replaying the same reviewLog id twice yields no error and
// exactly one row, identical to the first application.
#[tokio::test]
async fn scenario_d_review_log_replay_is_idempotent() {
    let service = IngestService::in_memory(&IngestConfig::default());
    let u = user("u1");
    let c = client("c1");

    service
        .apply_batch(u.clone(), c.clone(), vec![review_log_op("r1", "card-1")])
        .await
        .unwrap();
    let first = service
        .storage()
        .store
        .review_log_get(&ReviewLogId::new("r1").unwrap())
        .await
        .unwrap()
        .unwrap();

    let result = service.apply_batch(u, c, vec![review_log_op("r1", "card-1")]).await;
    assert!(result.is_ok());

    let second = service
        .storage()
        .store
        .review_log_get(&ReviewLogId::new("r1").unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(first, second);
}

// Scenario E: clCount 1, then 2, then a late replay of 1; final value is 2,
// and 2 is even so the card is a member of the deck.
#[tokio::test]
async fn scenario_e_counter_ignores_late_replay() {
    let service = IngestService::in_memory(&IngestConfig::default());
    let u = user("u1");
    let c = client("c1");

    service
        .apply_batch(u.clone(), c.clone(), vec![update_deck_card_op("card-1", "deck-1", 1, 10)])
        .await
        .unwrap();
    service
        .apply_batch(u.clone(), c.clone(), vec![update_deck_card_op("card-1", "deck-1", 2, 11)])
        .await
        .unwrap();
    service
        .apply_batch(u, c, vec![update_deck_card_op("card-1", "deck-1", 1, 12)])
        .await
        .unwrap();

    let row = service
        .storage()
        .store
        .card_deck_get(&CardId::new("card-1").unwrap(), &DeckId::new("deck-1").unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.cl_count, 2);
    assert_eq!(row.cl_count % 2, 0, "even clCount means card is a deck member");
}

// Scenario F: a batch of 10001 operations is rejected with the exact
// message and reserves no sequence numbers.
#[tokio::test]
async fn scenario_f_batch_cap_rejects_with_literal_message_and_burns_no_sequence() {
    let service = IngestService::in_memory(&IngestConfig::default());
    let u = user("u1");
    let c = client("c1");

    let oversized: Vec<Operation> = (0..10_001).map(|i| card_op(&format!("c{i}"), i, 1.0)).collect();
    let err = service.apply_batch(u.clone(), c.clone(), oversized).await.unwrap_err();
    assert_eq!(err.to_string(), "Too many operations");

    let seq_nos = service.apply_batch(u, c, vec![card_op("first", 0, 1.0)]).await.unwrap();
    assert_eq!(seq_nos[0].value(), 1);
}

// Order independence: applying the same two LWW writes in either order on a
// fresh key converges to the same winner.
#[tokio::test]
async fn lww_convergence_is_order_independent() {
    let op_a = card_op("race", 100, 1.0);
    let op_b = card_op("race", 100, 2.0);

    let forward = IngestService::in_memory(&IngestConfig::default());
    forward.apply_batch(user("u1"), client("A"), vec![op_a.clone()]).await.unwrap();
    forward.apply_batch(user("u1"), client("B"), vec![op_b.clone()]).await.unwrap();

    let reversed = IngestService::in_memory(&IngestConfig::default());
    reversed.apply_batch(user("u1"), client("B"), vec![op_b]).await.unwrap();
    reversed.apply_batch(user("u1"), client("A"), vec![op_a]).await.unwrap();

    let key = [Value::Text("race".to_string())];
    let forward_row = forward.storage().store.lww_get(LwwTable::CARDS, &key).await.unwrap().unwrap();
    let reversed_row = reversed.storage().store.lww_get(LwwTable::CARDS, &key).await.unwrap().unwrap();
    assert_eq!(forward_row.payload, reversed_row.payload);
}

// Replay safety: re-applying an identical winning write a second time does
// not change the stored metadata.
#[tokio::test]
async fn replay_of_the_winning_write_is_a_no_op() {
    let service = IngestService::in_memory(&IngestConfig::default());
    let u = user("u1");
    let c = client("A");

    service.apply_batch(u.clone(), c.clone(), vec![card_op("stable", 50, 9.0)]).await.unwrap();
    let key = [Value::Text("stable".to_string())];
    let before = service.storage().store.lww_get(LwwTable::CARDS, &key).await.unwrap().unwrap();

    service.apply_batch(u, c, vec![card_op("stable", 50, 9.0)]).await.unwrap();
    let after = service.storage().store.lww_get(LwwTable::CARDS, &key).await.unwrap().unwrap();

    assert_eq!(before.last_modified, after.last_modified);
    assert_eq!(before.last_modified_client, after.last_modified_client);
    assert_eq!(before.payload, after.payload);
}
