//! The fixed set of tables and columns the merge primitives operate on
//! (spec.md §6). Each [`LwwTable`] describes one LWW-register table so that
//! a single upsert routine (`sqlite::conditional_upsert`) can serve all
//! seven of them, per the table-driven registry called for in spec.md §9.

use crate::value::{Column, ColumnKind};

/// Describes one LWW-register table: its name, key columns, and payload
/// columns. Every such table additionally carries `user_id`,
/// `last_modified`, `last_modified_client`, and `seq_no`, added implicitly
/// by `sqlite::conditional_upsert`.
#[derive(Debug, Clone, Copy)]
pub struct LwwTable {
    pub table: &'static str,
    pub key: &'static [Column],
    pub payload: &'static [Column],
}

impl LwwTable {
    pub const CARDS: LwwTable = LwwTable {
        table: "cards",
        key: &[Column::new("card_id", ColumnKind::Text)],
        payload: &[
            Column::new("due", ColumnKind::Int),
            Column::new("stability", ColumnKind::Real),
            Column::new("difficulty", ColumnKind::Real),
            Column::new("elapsed_days", ColumnKind::Real),
            Column::new("scheduled_days", ColumnKind::Real),
            Column::new("reps", ColumnKind::Int),
            Column::new("lapses", ColumnKind::Int),
            Column::new("state", ColumnKind::Int),
            Column::new("last_review", ColumnKind::OptInt),
        ],
    };
    pub const CARD_CONTENTS: LwwTable = LwwTable {
        table: "card_contents",
        key: &[Column::new("card_id", ColumnKind::Text)],
        payload: &[
            Column::new("front", ColumnKind::Text),
            Column::new("back", ColumnKind::Text),
        ],
    };
    pub const CARD_DELETED: LwwTable = LwwTable {
        table: "card_deleted",
        key: &[Column::new("card_id", ColumnKind::Text)],
        payload: &[Column::new("deleted", ColumnKind::Bool)],
    };
    pub const CARD_BOOKMARKED: LwwTable = LwwTable {
        table: "card_bookmarked",
        key: &[Column::new("card_id", ColumnKind::Text)],
        payload: &[Column::new("bookmarked", ColumnKind::Bool)],
    };
    pub const CARD_SUSPENDED: LwwTable = LwwTable {
        table: "card_suspended",
        key: &[Column::new("card_id", ColumnKind::Text)],
        payload: &[Column::new("suspended", ColumnKind::Bool)],
    };
    pub const DECKS: LwwTable = LwwTable {
        table: "decks",
        key: &[Column::new("deck_id", ColumnKind::Text)],
        payload: &[
            Column::new("name", ColumnKind::Text),
            Column::new("description", ColumnKind::OptText),
            Column::new("deleted", ColumnKind::Bool),
        ],
    };
    pub const REVIEW_LOG_DELETED: LwwTable = LwwTable {
        table: "review_log_deleted",
        key: &[Column::new("review_log_id", ColumnKind::Text)],
        payload: &[Column::new("deleted", ColumnKind::Bool)],
    };

    /// All seven LWW tables, for anything that needs to walk the registry
    /// generically (diagnostics, schema consistency tests).
    pub const ALL: &'static [LwwTable] = &[
        LwwTable::CARDS,
        LwwTable::CARD_CONTENTS,
        LwwTable::CARD_DELETED,
        LwwTable::CARD_BOOKMARKED,
        LwwTable::CARD_SUSPENDED,
        LwwTable::DECKS,
        LwwTable::REVIEW_LOG_DELETED,
    ];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_covers_all_seven_lww_tables_with_unique_names() {
        assert_eq!(LwwTable::ALL.len(), 7);
        let mut names: Vec<_> = LwwTable::ALL.iter().map(|t| t.table).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), 7);
    }

    #[test]
    fn every_lww_table_has_at_least_one_key_column() {
        for table in LwwTable::ALL {
            assert!(!table.key.is_empty(), "{} has no key column", table.table);
        }
    }
}

/// Columns for the `review_logs` grow-only-set table (spec.md §4.2.2).
pub const REVIEW_LOGS_TABLE: &str = "review_logs";
pub const REVIEW_LOGS_KEY: Column = Column::new("review_log_id", ColumnKind::Text);
pub const REVIEW_LOGS_PAYLOAD: &[Column] = &[
    Column::new("card_id", ColumnKind::Text),
    Column::new("grade", ColumnKind::Int),
    Column::new("state", ColumnKind::Int),
    Column::new("due", ColumnKind::Int),
    Column::new("stability", ColumnKind::Real),
    Column::new("difficulty", ColumnKind::Real),
    Column::new("elapsed_days", ColumnKind::Real),
    Column::new("last_elapsed_days", ColumnKind::Real),
    Column::new("scheduled_days", ColumnKind::Real),
    Column::new("review", ColumnKind::Int),
    Column::new("duration", ColumnKind::Int),
];

/// Columns for the `card_decks` counter-backed-set table (spec.md §4.2.3).
pub const CARD_DECKS_TABLE: &str = "card_decks";
pub const CARD_DECKS_KEY: &[Column] = &[
    Column::new("card_id", ColumnKind::Text),
    Column::new("deck_id", ColumnKind::Text),
];
pub const CARD_DECKS_COUNTER: Column = Column::new("cl_count", ColumnKind::Int);
