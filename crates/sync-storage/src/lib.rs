#![forbid(unsafe_code)]

pub mod error;
pub mod memory;
pub mod repository;
pub mod schema;
pub mod sqlite;
pub mod value;

pub use error::StorageError;
pub use repository::{Storage, Store, StoredCardDeckRow, StoredLwwRow, StoredReviewLogRow};
pub use schema::LwwTable;
pub use sqlite::{SqliteInitError, SqliteRepository};
pub use value::{Column, ColumnKind, Value};
