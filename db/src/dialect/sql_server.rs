//! Transact-SQL for Microsoft SQL Server.
//!
//! Writes return their rows through a table variable: the write `OUTPUT`s the
//! primary key (or, for deletes and key-less tables, every column) into
//! `@Record`, and a trailing `SELECT` reads the rows back, joining to the
//! table on the key so defaulted and computed columns come back too.

use dynamic_db_core::{
    ColumnDefinition, Parameter, Statement, StatementKind, TableName, TableSchema, Value,
};

use super::{Dialect, RoundTrip, WriteKind, bool_cell, narrow, optional_int_cell, text_cell};
use crate::error::{DynamicDbError, Result};

const SCRATCH_TABLE: &str = "@Record";

const DISCOVERY_SQL: &str = "\
SELECT c.COLUMN_NAME,
    c.DATA_TYPE,
    c.CHARACTER_MAXIMUM_LENGTH,
    c.NUMERIC_PRECISION,
    ISNULL(c.NUMERIC_SCALE, c.DATETIME_PRECISION),
    CAST(CASE WHEN c.IS_NULLABLE = 'YES' THEN 1 ELSE 0 END AS BIT),
    CAST(MAX(CASE WHEN OBJECTPROPERTY(OBJECT_ID(QUOTENAME(kcu.CONSTRAINT_SCHEMA) + '.' + QUOTENAME(kcu.CONSTRAINT_NAME)), 'IsPrimaryKey') = 1 THEN 1 ELSE 0 END) AS BIT)
FROM INFORMATION_SCHEMA.COLUMNS c
LEFT JOIN INFORMATION_SCHEMA.KEY_COLUMN_USAGE kcu ON c.TABLE_SCHEMA = kcu.TABLE_SCHEMA
    AND c.TABLE_NAME = kcu.TABLE_NAME
    AND c.COLUMN_NAME = kcu.COLUMN_NAME
WHERE c.TABLE_SCHEMA = ISNULL(@Schema, SCHEMA_NAME())
    AND c.TABLE_NAME = @Table
GROUP BY c.COLUMN_NAME,
    c.DATA_TYPE,
    c.CHARACTER_MAXIMUM_LENGTH,
    c.NUMERIC_PRECISION,
    c.NUMERIC_SCALE,
    c.DATETIME_PRECISION,
    c.IS_NULLABLE,
    c.ORDINAL_POSITION
ORDER BY c.ORDINAL_POSITION";

/// SQL Server: `[bracket]` quoting, `@name` parameters, `OUTPUT ... INTO`
/// a table variable for round trips.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlServerDialect;

impl SqlServerDialect {
    /// Renders `[name] TYPE(args)` for one scratch-table column.
    fn scratch_column(&self, column: &ColumnDefinition) -> Result<String> {
        let data_type = column.sql_type.to_uppercase();
        let args = match data_type.as_str() {
            "BIGINT" | "BIT" | "DATE" | "DATETIME" | "IMAGE" | "INT" | "MONEY" | "NTEXT"
            | "ROWVERSION" | "SMALLDATETIME" | "SMALLINT" | "SMALLMONEY" | "SQL_VARIANT"
            | "TEXT" | "TINYINT" | "UNIQUEIDENTIFIER" | "XML" => None,
            "DECIMAL" | "NUMERIC" => match (column.precision, column.scale) {
                (Some(precision), Some(scale)) => Some(format!("{precision}, {scale}")),
                (Some(precision), None) => Some(precision.to_string()),
                _ => None,
            },
            "DATETIME2" | "DATETIMEOFFSET" => column
                .precision
                .map(i32::from)
                .or(column.scale)
                .map(|p| p.to_string()),
            "FLOAT" | "REAL" => column.precision.map(|p| p.to_string()),
            "TIME" => column.scale.map(|s| s.to_string()),
            "BINARY" | "CHAR" | "NCHAR" | "NVARCHAR" | "VARBINARY" | "VARCHAR" => {
                column.max_length.map(|len| match len {
                    -1 => "MAX".to_string(),
                    len => len.to_string(),
                })
            }
            _ => {
                return Err(DynamicDbError::UnsupportedColumnType {
                    column: column.name.clone(),
                    data_type,
                });
            }
        };

        let name = self.quote_identifier(&column.name);
        Ok(match args {
            Some(args) => format!("{name} {data_type}({args})"),
            None => format!("{name} {data_type}"),
        })
    }
}

impl Dialect for SqlServerDialect {
    fn name(&self) -> &'static str {
        "sqlserver"
    }

    fn quote_identifier(&self, name: &str) -> String {
        format!("[{}]", name.replace(']', "]]"))
    }

    fn discovery_statement(&self, table: &TableName) -> Statement {
        Statement::new(
            DISCOVERY_SQL,
            StatementKind::Text,
            vec![
                Parameter::new("Schema", table.schema()),
                Parameter::new("Table", table.name()),
            ],
        )
    }

    fn decode_column(&self, row: &[Value]) -> Result<ColumnDefinition> {
        Ok(ColumnDefinition {
            name: text_cell(row, 0, "COLUMN_NAME")?,
            sql_type: text_cell(row, 1, "DATA_TYPE")?,
            max_length: narrow(
                optional_int_cell(row, 2, "CHARACTER_MAXIMUM_LENGTH")?,
                "CHARACTER_MAXIMUM_LENGTH",
            )?,
            precision: narrow(
                optional_int_cell(row, 3, "NUMERIC_PRECISION")?,
                "NUMERIC_PRECISION",
            )?,
            scale: narrow(optional_int_cell(row, 4, "NUMERIC_SCALE")?, "NUMERIC_SCALE")?,
            is_nullable: bool_cell(row, 5, "IS_NULLABLE")?,
            is_primary_key: bool_cell(row, 6, "IsPrimaryKey")?,
        })
    }

    fn round_trip(
        &self,
        table: &TableName,
        schema: &TableSchema,
        write: WriteKind,
    ) -> Result<RoundTrip> {
        let rejoin = write != WriteKind::Delete && schema.has_primary_key();
        let captured: Vec<&ColumnDefinition> = if rejoin {
            schema.primary_key().collect()
        } else {
            schema.columns().iter().collect()
        };

        let declared = captured
            .iter()
            .map(|column| self.scratch_column(column))
            .collect::<Result<Vec<_>>>()?;

        let pseudo_table = match write {
            WriteKind::Delete => "DELETED",
            WriteKind::Insert | WriteKind::Update => "INSERTED",
        };
        let outputs: Vec<String> = captured
            .iter()
            .map(|column| format!("{pseudo_table}.{}", self.quote_identifier(&column.name)))
            .collect();

        let select = if rejoin {
            let join: Vec<String> = captured
                .iter()
                .map(|column| {
                    let name = self.quote_identifier(&column.name);
                    format!("[{SCRATCH_TABLE}].{name} = {table}.{name}")
                })
                .collect();
            format!(
                "SELECT {table}.*\nFROM {SCRATCH_TABLE}\nJOIN {table} ON {}",
                join.join(" AND ")
            )
        } else {
            format!("SELECT *\nFROM {SCRATCH_TABLE}")
        };

        Ok(RoundTrip {
            declare: Some(format!("DECLARE {SCRATCH_TABLE} TABLE ({})", declared.join(", "))),
            output: Some(format!("OUTPUT {} INTO {SCRATCH_TABLE}", outputs.join(", "))),
            returning: None,
            select: Some(select),
        })
    }
}
