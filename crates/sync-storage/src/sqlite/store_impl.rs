use async_trait::async_trait;
use sqlx::Row;
use sync_core::{CardId, ClientId, DeckId, ReviewLogId, SeqNo, UserId};

use super::SqliteRepository;
use super::binding::{bind_value, get_value};
use crate::error::StorageError;
use crate::repository::{Store, StoredCardDeckRow, StoredLwwRow, StoredReviewLogRow};
use crate::schema::{self, LwwTable};
use crate::value::Value;

fn conn_err(e: sqlx::Error) -> StorageError {
    StorageError::Connection(e.to_string())
}

fn ser_err(e: sqlx::Error) -> StorageError {
    StorageError::Serialization(e.to_string())
}

/// Builds the `INSERT ... ON CONFLICT ... DO UPDATE ... WHERE <dominance>`
/// statement for one LWW table, parameterized by its key and payload columns
/// so every table shares this one routine (spec.md §9).
fn lww_upsert_sql(table: LwwTable) -> String {
    let mut columns = vec!["user_id"];
    columns.extend(table.key.iter().map(|c| c.name));
    columns.extend(table.payload.iter().map(|c| c.name));
    columns.push("last_modified");
    columns.push("last_modified_client");
    columns.push("seq_no");

    let placeholders = (1..=columns.len())
        .map(|i| format!("?{i}"))
        .collect::<Vec<_>>()
        .join(", ");
    let conflict_cols = table.key.iter().map(|c| c.name).collect::<Vec<_>>().join(", ");

    let mut sets = vec!["user_id = excluded.user_id".to_string()];
    sets.extend(table.payload.iter().map(|c| format!("{0} = excluded.{0}", c.name)));
    sets.push("last_modified = excluded.last_modified".to_string());
    sets.push("last_modified_client = excluded.last_modified_client".to_string());
    sets.push("seq_no = excluded.seq_no".to_string());

    format!(
        "INSERT INTO {table} ({cols}) VALUES ({placeholders}) \
         ON CONFLICT({conflict_cols}) DO UPDATE SET {sets} \
         WHERE (last_modified, last_modified_client) < (excluded.last_modified, excluded.last_modified_client)",
        table = table.table,
        cols = columns.join(", "),
        sets = sets.join(", "),
    )
}

fn lww_select_sql(table: LwwTable) -> String {
    let mut columns = vec!["user_id"];
    columns.extend(table.key.iter().map(|c| c.name));
    columns.extend(table.payload.iter().map(|c| c.name));
    columns.push("last_modified");
    columns.push("last_modified_client");
    columns.push("seq_no");

    let predicate = table
        .key
        .iter()
        .enumerate()
        .map(|(i, c)| format!("{} = ?{}", c.name, i + 1))
        .collect::<Vec<_>>()
        .join(" AND ");

    format!(
        "SELECT {cols} FROM {table} WHERE {predicate}",
        cols = columns.join(", "),
        table = table.table,
    )
}

#[async_trait]
impl Store for SqliteRepository {
    async fn ensure_user(&self, user_id: &UserId) -> Result<(), StorageError> {
        sqlx::query(
            "INSERT INTO users (user_id, next_seq_no) VALUES (?1, 1) ON CONFLICT(user_id) DO NOTHING",
        )
        .bind(user_id.as_str())
        .execute(self.pool())
        .await
        .map_err(conn_err)?;
        Ok(())
    }

    async fn reserve_seq(&self, user_id: &UserId, n: i64) -> Result<SeqNo, StorageError> {
        let row = sqlx::query(
            "UPDATE users SET next_seq_no = next_seq_no + ?2 \
             WHERE user_id = ?1 \
             RETURNING next_seq_no - ?2 AS first_seq_no",
        )
        .bind(user_id.as_str())
        .bind(n)
        .fetch_optional(self.pool())
        .await
        .map_err(conn_err)?
        .ok_or(StorageError::NotFound)?;
        let first: i64 = row.try_get("first_seq_no").map_err(ser_err)?;
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
        let sql = lww_upsert_sql(table);
        let mut q = sqlx::query(&sql);
        q = q.bind(user_id.as_str());
        for v in key {
            q = bind_value(q, v);
        }
        for (_, v) in payload {
            q = bind_value(q, v);
        }
        q = q.bind(timestamp);
        q = q.bind(client_id.as_str());
        q = q.bind(seq_no.value());
        let result = q.execute(self.pool()).await.map_err(conn_err)?;
        Ok(result.rows_affected() == 1)
    }

    async fn lww_get(
        &self,
        table: LwwTable,
        key: &[Value],
    ) -> Result<Option<StoredLwwRow>, StorageError> {
        let sql = lww_select_sql(table);
        let mut q = sqlx::query(&sql);
        for v in key {
            q = bind_value(q, v);
        }
        let Some(row) = q.fetch_optional(self.pool()).await.map_err(conn_err)? else {
            return Ok(None);
        };

        let user_id = UserId::new(row.try_get::<String, _>("user_id").map_err(ser_err)?)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        let last_modified: i64 = row.try_get("last_modified").map_err(ser_err)?;
        let last_modified_client =
            ClientId::new(row.try_get::<String, _>("last_modified_client").map_err(ser_err)?)
                .map_err(|e| StorageError::Serialization(e.to_string()))?;
        let seq_no = SeqNo::new(row.try_get::<i64, _>("seq_no").map_err(ser_err)?);
        let payload = table
            .payload
            .iter()
            .map(|c| get_value(&row, c).map(|v| (c.name.to_string(), v)))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(StoredLwwRow {
            user_id,
            payload,
            last_modified,
            last_modified_client,
            seq_no,
        }))
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
        let mut columns = vec!["review_log_id", "user_id"];
        columns.extend(payload.iter().map(|(name, _)| *name));
        columns.push("last_modified");
        columns.push("last_modified_client");
        columns.push("seq_no");
        let placeholders = (1..=columns.len())
            .map(|i| format!("?{i}"))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "INSERT INTO {table} ({cols}) VALUES ({placeholders}) \
             ON CONFLICT({key}) DO NOTHING",
            table = schema::REVIEW_LOGS_TABLE,
            cols = columns.join(", "),
            key = schema::REVIEW_LOGS_KEY.name,
        );

        let mut q = sqlx::query(&sql);
        q = q.bind(id.as_str());
        q = q.bind(user_id.as_str());
        for (_, v) in payload {
            q = bind_value(q, v);
        }
        q = q.bind(timestamp);
        q = q.bind(client_id.as_str());
        q = q.bind(seq_no.value());
        let result = q.execute(self.pool()).await.map_err(conn_err)?;
        Ok(result.rows_affected() == 1)
    }

    async fn review_log_get(
        &self,
        id: &ReviewLogId,
    ) -> Result<Option<StoredReviewLogRow>, StorageError> {
        let mut columns = vec!["user_id"];
        columns.extend(schema::REVIEW_LOGS_PAYLOAD.iter().map(|c| c.name));
        columns.push("last_modified");
        columns.push("last_modified_client");
        columns.push("seq_no");
        let sql = format!(
            "SELECT {cols} FROM {table} WHERE {key} = ?1",
            cols = columns.join(", "),
            table = schema::REVIEW_LOGS_TABLE,
            key = schema::REVIEW_LOGS_KEY.name,
        );

        let Some(row) = sqlx::query(&sql)
            .bind(id.as_str())
            .fetch_optional(self.pool())
            .await
            .map_err(conn_err)?
        else {
            return Ok(None);
        };

        let user_id = UserId::new(row.try_get::<String, _>("user_id").map_err(ser_err)?)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        let last_modified: i64 = row.try_get("last_modified").map_err(ser_err)?;
        let last_modified_client =
            ClientId::new(row.try_get::<String, _>("last_modified_client").map_err(ser_err)?)
                .map_err(|e| StorageError::Serialization(e.to_string()))?;
        let seq_no = SeqNo::new(row.try_get::<i64, _>("seq_no").map_err(ser_err)?);
        let payload = schema::REVIEW_LOGS_PAYLOAD
            .iter()
            .map(|c| get_value(&row, c).map(|v| (c.name.to_string(), v)))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(StoredReviewLogRow {
            user_id,
            payload,
            last_modified,
            last_modified_client,
            seq_no,
        }))
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
        let sql = format!(
            "INSERT INTO {table} (card_id, deck_id, user_id, cl_count, last_modified, last_modified_client, seq_no) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7) \
             ON CONFLICT(card_id, deck_id) DO UPDATE SET \
                user_id = excluded.user_id, \
                cl_count = excluded.cl_count, \
                last_modified = excluded.last_modified, \
                last_modified_client = excluded.last_modified_client, \
                seq_no = excluded.seq_no \
             WHERE cl_count < excluded.cl_count",
            table = schema::CARD_DECKS_TABLE,
        );
        let result = sqlx::query(&sql)
            .bind(card_id.as_str())
            .bind(deck_id.as_str())
            .bind(user_id.as_str())
            .bind(cl_count)
            .bind(timestamp)
            .bind(client_id.as_str())
            .bind(seq_no.value())
            .execute(self.pool())
            .await
            .map_err(conn_err)?;
        Ok(result.rows_affected() == 1)
    }

    async fn card_deck_get(
        &self,
        card_id: &CardId,
        deck_id: &DeckId,
    ) -> Result<Option<StoredCardDeckRow>, StorageError> {
        let sql = format!(
            "SELECT user_id, cl_count, last_modified, last_modified_client, seq_no \
             FROM {table} WHERE card_id = ?1 AND deck_id = ?2",
            table = schema::CARD_DECKS_TABLE,
        );
        let Some(row) = sqlx::query(&sql)
            .bind(card_id.as_str())
            .bind(deck_id.as_str())
            .fetch_optional(self.pool())
            .await
            .map_err(conn_err)?
        else {
            return Ok(None);
        };

        let user_id = UserId::new(row.try_get::<String, _>("user_id").map_err(ser_err)?)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        let cl_count: i64 = row.try_get("cl_count").map_err(ser_err)?;
        let last_modified: i64 = row.try_get("last_modified").map_err(ser_err)?;
        let last_modified_client =
            ClientId::new(row.try_get::<String, _>("last_modified_client").map_err(ser_err)?)
                .map_err(|e| StorageError::Serialization(e.to_string()))?;
        let seq_no = SeqNo::new(row.try_get::<i64, _>("seq_no").map_err(ser_err)?);

        Ok(Some(StoredCardDeckRow {
            user_id,
            cl_count,
            last_modified,
            last_modified_client,
            seq_no,
        }))
    }
}
