use chrono::Utc;
use sqlx::SqlitePool;

use super::SqliteInitError;

/// Runs a single, consolidated migration for the current schema.
///
/// Creates the `users` table, all seven LWW-register tables, the
/// `review_logs` grow-only-set table, and the `card_decks` counter-backed-set
/// table (spec.md §3).
#[allow(clippy::too_many_lines)]
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), SqliteInitError> {
    async fn is_applied(pool: &SqlitePool, version: i64) -> Result<bool, sqlx::Error> {
        let row = sqlx::query("SELECT 1 FROM schema_migrations WHERE version = ?1")
            .bind(version)
            .fetch_optional(pool)
            .await?;
        Ok(row.is_some())
    }

    sqlx::query(
        r"
            CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            );
            ",
    )
    .execute(pool)
    .await?;

    if !is_applied(pool, 1).await? {
        let mut tx = pool.begin().await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS users (
                    user_id TEXT PRIMARY KEY,
                    next_seq_no INTEGER NOT NULL CHECK (next_seq_no >= 1)
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS cards (
                    card_id TEXT PRIMARY KEY,
                    user_id TEXT NOT NULL,
                    due INTEGER NOT NULL,
                    stability REAL NOT NULL,
                    difficulty REAL NOT NULL,
                    elapsed_days REAL NOT NULL,
                    scheduled_days REAL NOT NULL,
                    reps INTEGER NOT NULL,
                    lapses INTEGER NOT NULL,
                    state INTEGER NOT NULL,
                    last_review INTEGER,
                    last_modified INTEGER NOT NULL,
                    last_modified_client TEXT NOT NULL,
                    seq_no INTEGER NOT NULL
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS card_contents (
                    card_id TEXT PRIMARY KEY,
                    user_id TEXT NOT NULL,
                    front TEXT NOT NULL,
                    back TEXT NOT NULL,
                    last_modified INTEGER NOT NULL,
                    last_modified_client TEXT NOT NULL,
                    seq_no INTEGER NOT NULL
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS card_deleted (
                    card_id TEXT PRIMARY KEY,
                    user_id TEXT NOT NULL,
                    deleted INTEGER NOT NULL,
                    last_modified INTEGER NOT NULL,
                    last_modified_client TEXT NOT NULL,
                    seq_no INTEGER NOT NULL
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS card_bookmarked (
                    card_id TEXT PRIMARY KEY,
                    user_id TEXT NOT NULL,
                    bookmarked INTEGER NOT NULL,
                    last_modified INTEGER NOT NULL,
                    last_modified_client TEXT NOT NULL,
                    seq_no INTEGER NOT NULL
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS card_suspended (
                    card_id TEXT PRIMARY KEY,
                    user_id TEXT NOT NULL,
                    suspended INTEGER NOT NULL,
                    last_modified INTEGER NOT NULL,
                    last_modified_client TEXT NOT NULL,
                    seq_no INTEGER NOT NULL
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS decks (
                    deck_id TEXT PRIMARY KEY,
                    user_id TEXT NOT NULL,
                    name TEXT NOT NULL,
                    description TEXT,
                    deleted INTEGER NOT NULL,
                    last_modified INTEGER NOT NULL,
                    last_modified_client TEXT NOT NULL,
                    seq_no INTEGER NOT NULL
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS review_log_deleted (
                    review_log_id TEXT PRIMARY KEY,
                    user_id TEXT NOT NULL,
                    deleted INTEGER NOT NULL,
                    last_modified INTEGER NOT NULL,
                    last_modified_client TEXT NOT NULL,
                    seq_no INTEGER NOT NULL
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS review_logs (
                    review_log_id TEXT PRIMARY KEY,
                    user_id TEXT NOT NULL,
                    card_id TEXT NOT NULL,
                    grade INTEGER NOT NULL,
                    state INTEGER NOT NULL,
                    due INTEGER NOT NULL,
                    stability REAL NOT NULL,
                    difficulty REAL NOT NULL,
                    elapsed_days REAL NOT NULL,
                    last_elapsed_days REAL NOT NULL,
                    scheduled_days REAL NOT NULL,
                    review INTEGER NOT NULL,
                    duration INTEGER NOT NULL,
                    last_modified INTEGER NOT NULL,
                    last_modified_client TEXT NOT NULL,
                    seq_no INTEGER NOT NULL
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS card_decks (
                    card_id TEXT NOT NULL,
                    deck_id TEXT NOT NULL,
                    user_id TEXT NOT NULL,
                    cl_count INTEGER NOT NULL,
                    last_modified INTEGER NOT NULL,
                    last_modified_client TEXT NOT NULL,
                    seq_no INTEGER NOT NULL,
                    PRIMARY KEY (card_id, deck_id)
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE INDEX IF NOT EXISTS idx_review_logs_card
                    ON review_logs(card_id);
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE INDEX IF NOT EXISTS idx_card_decks_deck
                    ON card_decks(deck_id);
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                INSERT INTO schema_migrations (version, applied_at)
                VALUES (?1, ?2)
                ON CONFLICT(version) DO NOTHING
            ",
        )
        .bind(1_i64)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
    }

    Ok(())
}
