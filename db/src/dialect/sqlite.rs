//! SQLite (3.35 or newer).
//!
//! Columns come from `pragma_table_info`; writes return their rows with
//! `RETURNING *`, which yields the post-write row including defaulted
//! columns, so no scratch storage or second select is needed.

use std::sync::OnceLock;

use dynamic_db_core::{
    ColumnDefinition, Parameter, Statement, StatementKind, TableName, TableSchema, Value,
};
use regex::Regex;

use super::{Dialect, RoundTrip, WriteKind, optional_int_cell, text_cell};
use crate::error::Result;

/// SQLite: `"double quote"` quoting, `@name` parameters, `RETURNING *` for
/// round trips.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteDialect;

fn declared_type_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^\s*(.*?)\s*(?:\(\s*(\d+)\s*(?:,\s*(\d+)\s*)?\))?\s*$")
            .expect("static pattern is valid")
    })
}

/// Splits a declared type such as `NVARCHAR(50)` or `DECIMAL(10, 2)` into
/// its base name and size arguments.
fn parse_declared_type(declared: &str) -> (String, Option<i64>, Option<i64>) {
    match declared_type_pattern().captures(declared) {
        Some(captures) => {
            let arg = |i: usize| captures.get(i).and_then(|m| m.as_str().parse().ok());
            (captures[1].to_string(), arg(2), arg(3))
        }
        None => (declared.trim().to_string(), None, None),
    }
}

/// SQLite ignores size arguments, so one that does not fit the metadata
/// field is dropped.
fn fit<T: TryFrom<i64>>(value: Option<i64>) -> Option<T> {
    value.and_then(|v| T::try_from(v).ok())
}

fn is_sized_by_length(base: &str) -> bool {
    let base = base.to_uppercase();
    ["CHAR", "CLOB", "TEXT", "BINARY", "BLOB"]
        .iter()
        .any(|affinity| base.contains(affinity))
}

impl Dialect for SqliteDialect {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn quote_identifier(&self, name: &str) -> String {
        format!("\"{}\"", name.replace('"', "\"\""))
    }

    fn discovery_statement(&self, table: &TableName) -> Statement {
        let mut parameters = vec![Parameter::new("Table", table.name())];
        let source = match table.schema() {
            Some(schema) => {
                parameters.push(Parameter::new("Schema", schema));
                "pragma_table_info(@Table, @Schema)"
            }
            None => "pragma_table_info(@Table)",
        };
        Statement::new(
            format!("SELECT name, type, \"notnull\", pk\nFROM {source}\nORDER BY cid"),
            StatementKind::Text,
            parameters,
        )
    }

    fn decode_column(&self, row: &[Value]) -> Result<ColumnDefinition> {
        let name = text_cell(row, 0, "name")?;
        let declared = text_cell(row, 1, "type")?;
        let not_null = optional_int_cell(row, 2, "notnull")?.unwrap_or(0) != 0;
        let is_primary_key = optional_int_cell(row, 3, "pk")?.unwrap_or(0) != 0;

        let (sql_type, first, second) = parse_declared_type(&declared);
        let (max_length, precision, scale) = match (first, second) {
            (Some(p), Some(s)) => (None, Some(p), Some(s)),
            (Some(n), None) if is_sized_by_length(&sql_type) => (Some(n), None, None),
            (Some(p), None) => (None, Some(p), None),
            _ => (None, None, None),
        };

        Ok(ColumnDefinition {
            name,
            sql_type,
            max_length: fit(max_length),
            precision: fit(precision),
            scale: fit(scale),
            // A primary key column never accepts NULL, even when SQLite does
            // not report NOT NULL for it.
            is_nullable: !not_null && !is_primary_key,
            is_primary_key,
        })
    }

    fn round_trip(
        &self,
        _table: &TableName,
        _schema: &TableSchema,
        _write: WriteKind,
    ) -> Result<RoundTrip> {
        Ok(RoundTrip {
            returning: Some("RETURNING *".to_string()),
            ..RoundTrip::default()
        })
    }
}
