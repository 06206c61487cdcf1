//! Match-based bind/read helpers for the dynamically-assembled queries in
//! [`super::store_impl`]. Kept deliberately dumb — plain matches over sqlx's
//! native primitive bindings — rather than a custom `sqlx::Encode`/`Decode`
//! for `Value`, since that native support is already exercised elsewhere in
//! the pack.

use sqlx::Row;
use sqlx::query::Query;
use sqlx::sqlite::{Sqlite, SqliteArguments, SqliteRow};

use crate::error::StorageError;
use crate::value::{Column, ColumnKind, Value};

pub type SqliteQuery<'q> = Query<'q, Sqlite, SqliteArguments<'q>>;

/// Binds one dynamic `Value` onto a query in column order.
pub fn bind_value<'q>(query: SqliteQuery<'q>, value: &'q Value) -> SqliteQuery<'q> {
    match value {
        Value::Text(v) => query.bind(v.as_str()),
        Value::OptText(v) => query.bind(v.as_deref()),
        Value::Int(v) => query.bind(*v),
        Value::OptInt(v) => query.bind(*v),
        Value::Real(v) => query.bind(*v),
        Value::OptReal(v) => query.bind(*v),
        Value::Bool(v) => query.bind(*v),
    }
}

/// Reads one declared column back out of a row, per its [`ColumnKind`].
pub fn get_value(row: &SqliteRow, column: &Column) -> Result<Value, StorageError> {
    let result = match column.kind {
        ColumnKind::Text => row.try_get::<String, _>(column.name).map(Value::Text),
        ColumnKind::OptText => row.try_get::<Option<String>, _>(column.name).map(Value::OptText),
        ColumnKind::Int => row.try_get::<i64, _>(column.name).map(Value::Int),
        ColumnKind::OptInt => row.try_get::<Option<i64>, _>(column.name).map(Value::OptInt),
        ColumnKind::Real => row.try_get::<f64, _>(column.name).map(Value::Real),
        ColumnKind::OptReal => row.try_get::<Option<f64>, _>(column.name).map(Value::OptReal),
        ColumnKind::Bool => row.try_get::<bool, _>(column.name).map(Value::Bool),
    };
    result.map_err(|e| StorageError::Serialization(e.to_string()))
}
