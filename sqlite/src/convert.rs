//! Conversion between [`Value`] and SQLite's storage classes.
//!
//! SQLite stores five classes (NULL, INTEGER, REAL, TEXT, BLOB). Booleans
//! are written as `0`/`1` and timestamps as text in
//! [`TIMESTAMP_TEXT_FORMAT`]; reading a cell always yields the storage
//! class, and the materializer converts it to the field's kind.

use dynamic_db_core::{TIMESTAMP_TEXT_FORMAT, Value, ValueKind};
use rusqlite::ToSql;
use rusqlite::types::{ToSqlOutput, Value as Stored, ValueRef};

/// Binds a [`Value`] as a statement parameter.
pub(crate) struct SqlParam<'a>(pub(crate) &'a Value);

impl ToSql for SqlParam<'_> {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self.0 {
            Value::Null => ToSqlOutput::Owned(Stored::Null),
            Value::Bool(b) => ToSqlOutput::Owned(Stored::Integer(i64::from(*b))),
            Value::Integer(i) => ToSqlOutput::Owned(Stored::Integer(*i)),
            Value::Real(r) => ToSqlOutput::Owned(Stored::Real(*r)),
            Value::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            Value::Blob(b) => ToSqlOutput::Borrowed(ValueRef::Blob(b)),
            Value::Timestamp(ts) => {
                ToSqlOutput::Owned(Stored::Text(ts.format(TIMESTAMP_TEXT_FORMAT).to_string()))
            }
        })
    }
}

/// Reads one cell in its storage class.
pub(crate) fn value_from_ref(cell: ValueRef<'_>) -> Value {
    match cell {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Integer(i),
        ValueRef::Real(r) => Value::Real(r),
        ValueRef::Text(t) => Value::Text(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Value::Blob(b.to_vec()),
    }
}

/// Maps a declared column type to a runtime kind.
///
/// Follows SQLite's affinity rules (first match wins), with `BOOL`/`BIT`
/// and `DATE`/`TIME` recognized ahead of them. A column without a declared
/// type (an expression) is [`ValueKind::Any`].
pub(crate) fn kind_from_declared(declared: Option<&str>) -> ValueKind {
    let Some(declared) = declared else {
        return ValueKind::Any;
    };
    let declared = declared.to_uppercase();
    let has = |needle: &str| declared.contains(needle);

    if has("BOOL") || declared == "BIT" {
        ValueKind::Bool
    } else if has("DATE") || has("TIME") {
        ValueKind::Timestamp
    } else if has("INT") {
        ValueKind::Integer
    } else if has("CHAR") || has("CLOB") || has("TEXT") {
        ValueKind::Text
    } else if has("BLOB") {
        ValueKind::Blob
    } else if has("REAL") || has("FLOA") || has("DOUB") || has("NUMERIC") || has("DECIMAL") {
        ValueKind::Real
    } else {
        ValueKind::Any
    }
}
