//! SQL dialects.
//!
//! A [`Dialect`] owns everything about statement text that differs between
//! engines: identifier quoting, parameter placeholders, how the catalog is
//! asked for a table's columns, and how a write statement hands back the
//! rows it touched in the same round trip.

use std::fmt;

use dynamic_db_core::{ColumnDefinition, Statement, TableName, TableSchema, Value};

use crate::error::{DynamicDbError, Result};

mod sql_server;
mod sqlite;

pub use sql_server::SqlServerDialect;
pub use sqlite::SqliteDialect;

/// The write statements that return their affected rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteKind {
    Insert,
    Update,
    Delete,
}

/// Text fragments wrapped around a write statement so it returns the
/// affected rows.
///
/// The statement builder lays them out as:
///
/// ```text
/// <declare>
///
/// INSERT INTO t (...) | UPDATE t SET ... | DELETE FROM t
/// <output>
/// VALUES ... | WHERE ...
/// <returning>
///
/// <select>
/// ```
///
/// Absent fragments (and the blank lines around them) are left out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoundTrip {
    /// Scratch storage declared before the write.
    pub declare: Option<String>,
    /// Clause placed between the write target and its `VALUES`/`WHERE`.
    pub output: Option<String>,
    /// Clause appended to the end of the write.
    pub returning: Option<String>,
    /// Statement that reads the affected rows back.
    pub select: Option<String>,
}

/// Engine-specific statement text.
pub trait Dialect: Send + Sync + fmt::Debug {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Quotes a column identifier, escaping the quote character.
    fn quote_identifier(&self, name: &str) -> String;

    /// How a bound parameter named `parameter` appears in statement text.
    fn placeholder(&self, parameter: &str) -> String {
        format!("@{parameter}")
    }

    /// The catalog query listing a table's columns in physical order.
    fn discovery_statement(&self, table: &TableName) -> Statement;

    /// Decodes one row of the [`discovery_statement`](Self::discovery_statement)
    /// result.
    ///
    /// # Errors
    ///
    /// [`DynamicDbError::CatalogDecode`] when the row does not have the
    /// layout the discovery statement selects.
    fn decode_column(&self, row: &[Value]) -> Result<ColumnDefinition>;

    /// The fragments that make a write statement return its affected rows.
    ///
    /// # Errors
    ///
    /// [`DynamicDbError::UnsupportedColumnType`] when scratch storage must be
    /// declared for a column type the dialect cannot express.
    fn round_trip(
        &self,
        table: &TableName,
        schema: &TableSchema,
        write: WriteKind,
    ) -> Result<RoundTrip>;
}

fn cell<'a>(row: &'a [Value], index: usize, what: &str) -> Result<&'a Value> {
    row.get(index).ok_or_else(|| {
        DynamicDbError::CatalogDecode(format!(
            "missing {what} at position {index} (row has {} cells)",
            row.len()
        ))
    })
}

pub(crate) fn text_cell(row: &[Value], index: usize, what: &str) -> Result<String> {
    match cell(row, index, what)? {
        Value::Text(text) => Ok(text.clone()),
        other => Err(DynamicDbError::CatalogDecode(format!(
            "expected text for {what}, found {other}"
        ))),
    }
}

pub(crate) fn optional_int_cell(row: &[Value], index: usize, what: &str) -> Result<Option<i64>> {
    match cell(row, index, what)? {
        Value::Null => Ok(None),
        Value::Integer(i) => Ok(Some(*i)),
        other => Err(DynamicDbError::CatalogDecode(format!(
            "expected an integer for {what}, found {other}"
        ))),
    }
}

pub(crate) fn bool_cell(row: &[Value], index: usize, what: &str) -> Result<bool> {
    match cell(row, index, what)? {
        Value::Bool(b) => Ok(*b),
        Value::Integer(i) => Ok(*i != 0),
        other => Err(DynamicDbError::CatalogDecode(format!(
            "expected a flag for {what}, found {other}"
        ))),
    }
}

pub(crate) fn narrow<T: TryFrom<i64>>(value: Option<i64>, what: &str) -> Result<Option<T>> {
    value
        .map(|v| {
            T::try_from(v)
                .map_err(|_| DynamicDbError::CatalogDecode(format!("{what} {v} is out of range")))
        })
        .transpose()
}
