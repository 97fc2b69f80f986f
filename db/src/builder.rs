//! Statement generation.
//!
//! [`StatementBuilder`] turns a table name plus property bags into
//! parameterized statement text. Values are always bound as parameters,
//! except nulls, which are written as `NULL` / `IS NULL` so no engine's
//! null-comparison rules come into play.
//!
//! Parameter names are derived from column names: `{column}_{index}` for
//! insert rows and criteria items, `set_{column}` for update values. Any
//! character that is not a letter, digit, or underscore becomes `_`. When
//! two columns reduce to the same name, later ones get an ordinal suffix
//! (`a_b_0`, `a_b_0_2`).

use std::collections::HashSet;

use dynamic_db_core::{
    Parameter, Record, Statement, StatementKind, TableName, ValidationError, Value,
    validate_command_text, validate_criteria, validate_records, validate_values,
};

use crate::catalog::SchemaSource;
use crate::dialect::{Dialect, RoundTrip, WriteKind};
use crate::error::{DynamicDbError, Result};

/// Builds insert, select, update, delete, and raw statements.
///
/// Write statements consult the [`SchemaSource`] for the table's columns so
/// the dialect can make them return the affected rows. Selects and raw
/// statements never touch the catalog.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use dynamic_db::{Result, SchemaSource, SqlServerDialect, StatementBuilder};
/// use dynamic_db_core::{ColumnDefinition, TableName, TableSchema, record};
///
/// struct People;
///
/// impl SchemaSource for People {
///     fn table_schema(&self, _table: &TableName) -> Result<Arc<TableSchema>> {
///         Ok(Arc::new(
///             TableSchema::new(vec![ColumnDefinition::new("Id", "int").primary_key()]).unwrap(),
///         ))
///     }
/// }
///
/// let builder = StatementBuilder::new(&People, &SqlServerDialect);
/// let table = TableName::parse("People").unwrap();
/// let statement = builder
///     .select(&table, &[record! { "LastName" => "Smith" }, record! { "Age" => 40 }])
///     .unwrap();
///
/// assert_eq!(
///     statement.text,
///     "SELECT *\nFROM People\nWHERE ([LastName] = @LastName_0) OR ([Age] = @Age_1)"
/// );
/// assert_eq!(statement.parameters.len(), 2);
/// ```
pub struct StatementBuilder<'a> {
    schemas: &'a dyn SchemaSource,
    dialect: &'a dyn Dialect,
}

impl<'a> StatementBuilder<'a> {
    pub fn new(schemas: &'a dyn SchemaSource, dialect: &'a dyn Dialect) -> Self {
        Self { schemas, dialect }
    }

    /// Multi-row insert returning the inserted rows in insertion order.
    ///
    /// # Errors
    ///
    /// - [`ValidationError::NoRecords`] / [`ValidationError::EmptyRecord`]
    /// - [`DynamicDbError::InconsistentRecordShape`] when a record's column
    ///   set differs from the first record's. Checked before the catalog is
    ///   consulted.
    /// - Schema errors from the catalog.
    pub fn insert(&self, table: &TableName, records: &[Record]) -> Result<Statement> {
        validate_records(records)?;
        let first = &records[0];
        if let Some((index, record)) = records
            .iter()
            .enumerate()
            .find(|(_, record)| !record.same_names(first))
        {
            return Err(DynamicDbError::InconsistentRecordShape {
                index,
                expected: first.names().collect::<Vec<_>>().join(", "),
                found: record.names().collect::<Vec<_>>().join(", "),
            });
        }

        let round_trip = self.round_trip(table, WriteKind::Insert)?;

        let columns: Vec<&str> = first.names().collect();
        let mut parameters = Bindings::default();
        let rows: Vec<String> = records
            .iter()
            .enumerate()
            .map(|(index, record)| {
                let cells: Vec<String> = columns
                    .iter()
                    .map(|column| match record.get(column) {
                        Some(value) if !value.is_null() => {
                            let name = parameters.bind(parameter_name(column, index), value);
                            self.dialect.placeholder(&name)
                        }
                        _ => "NULL".to_string(),
                    })
                    .collect();
                format!("({})", cells.join(", "))
            })
            .collect();

        let quoted: Vec<String> = columns
            .iter()
            .map(|column| self.dialect.quote_identifier(column))
            .collect();

        let text = assemble(
            round_trip,
            format!("INSERT INTO {table} ({})", quoted.join(", ")),
            Some(format!("VALUES {}", rows.join(", "))),
        );
        Ok(Statement::new(text, StatementKind::Text, parameters.into_parameters()))
    }

    /// `SELECT *` with an optional OR-of-ANDs filter; no criteria selects
    /// every row.
    pub fn select(&self, table: &TableName, criteria: &[Record]) -> Result<Statement> {
        validate_criteria(criteria)?;
        let mut parameters = Bindings::default();
        let mut text = format!("SELECT *\nFROM {table}");
        if let Some(conditions) = self.where_conditions(criteria, &mut parameters) {
            text.push_str(&format!("\nWHERE {conditions}"));
        }
        Ok(Statement::new(text, StatementKind::Text, parameters.into_parameters()))
    }

    /// Update returning the post-update rows. Null values are assigned as
    /// `NULL`.
    pub fn update(
        &self,
        table: &TableName,
        values: &Record,
        criteria: &[Record],
    ) -> Result<Statement> {
        validate_values(values)?;
        validate_criteria(criteria)?;
        let round_trip = self.round_trip(table, WriteKind::Update)?;

        let mut parameters = Bindings::default();
        let assignments: Vec<String> = values
            .iter()
            .map(|(column, value)| {
                let target = self.dialect.quote_identifier(column);
                if value.is_null() {
                    format!("{target} = NULL")
                } else {
                    let name = parameters.bind(format!("set_{}", sanitize(column)), value);
                    let placeholder = self.dialect.placeholder(&name);
                    format!("{target} = {placeholder}")
                }
            })
            .collect();

        let conditions = self.where_conditions(criteria, &mut parameters);
        let text = assemble(
            round_trip,
            format!("UPDATE {table}\nSET {}", assignments.join(", ")),
            conditions.map(|c| format!("WHERE {c}")),
        );
        Ok(Statement::new(text, StatementKind::Text, parameters.into_parameters()))
    }

    /// Delete returning the deleted rows; no criteria deletes every row.
    pub fn delete(&self, table: &TableName, criteria: &[Record]) -> Result<Statement> {
        validate_criteria(criteria)?;
        let mut parameters = Bindings::default();
        let conditions = self.where_conditions(criteria, &mut parameters);
        self.delete_where(table, conditions, parameters)
    }

    /// Deletes exactly the rows identified by each record's primary key.
    ///
    /// A single key column renders as `key IN (...)`; a composite key as an
    /// OR of per-record key equalities. For a table without a primary key
    /// each row is matched on the fields its record carries (nulls as
    /// `IS NULL`), not on the table's full column set; pass complete rows,
    /// such as those returned by insert, to identify rows exactly.
    ///
    /// # Errors
    ///
    /// [`ValidationError::MissingKeyValue`] when a record lacks a key column
    /// or holds null for it.
    pub fn delete_by_keys(&self, table: &TableName, records: &[Record]) -> Result<Statement> {
        validate_records(records)?;
        let schema = self.schemas.table_schema(table)?;
        let keys: Vec<&str> = schema.primary_key().map(|c| c.name.as_str()).collect();

        let mut parameters = Bindings::default();
        let conditions = match keys.as_slice() {
            [] => self.where_conditions(records, &mut parameters),
            [key] => {
                let placeholders = records
                    .iter()
                    .enumerate()
                    .map(|(index, record)| -> Result<String> {
                        let value = key_value(record, index, key)?;
                        let name = parameters.bind(parameter_name(key, index), value);
                        Ok(self.dialect.placeholder(&name))
                    })
                    .collect::<Result<Vec<_>>>()?;
                Some(format!(
                    "{} IN ({})",
                    self.dialect.quote_identifier(key),
                    placeholders.join(", ")
                ))
            }
            composite => {
                let keyed = records
                    .iter()
                    .enumerate()
                    .map(|(index, record)| {
                        composite
                            .iter()
                            .map(|key| -> Result<(&str, Value)> {
                                Ok((*key, key_value(record, index, key)?.clone()))
                            })
                            .collect::<Result<Record>>()
                    })
                    .collect::<Result<Vec<_>>>()?;
                self.where_conditions(&keyed, &mut parameters)
            }
        };

        self.delete_where(table, conditions, parameters)
    }

    /// Wraps caller-supplied text (or a routine name) with one bound
    /// parameter per field. The text is passed through untouched; parameter
    /// names are used as given.
    pub fn raw(&self, text: &str, parameters: &Record, kind: StatementKind) -> Result<Statement> {
        validate_command_text(text)?;
        let parameters = parameters
            .iter()
            .map(|(name, value)| Parameter::new(name, value.clone()))
            .collect();
        Ok(Statement::new(text, kind, parameters))
    }

    fn round_trip(&self, table: &TableName, write: WriteKind) -> Result<RoundTrip> {
        let schema = self.schemas.table_schema(table)?;
        self.dialect.round_trip(table, &schema, write)
    }

    fn delete_where(
        &self,
        table: &TableName,
        conditions: Option<String>,
        parameters: Bindings,
    ) -> Result<Statement> {
        let round_trip = self.round_trip(table, WriteKind::Delete)?;
        let text = assemble(
            round_trip,
            format!("DELETE FROM {table}"),
            conditions.map(|c| format!("WHERE {c}")),
        );
        Ok(Statement::new(text, StatementKind::Text, parameters.into_parameters()))
    }

    /// `(a = @a_0 AND b IS NULL) OR (a = @a_1)`; `None` for no criteria.
    fn where_conditions(
        &self,
        criteria: &[Record],
        parameters: &mut Bindings,
    ) -> Option<String> {
        if criteria.is_empty() {
            return None;
        }
        let disjuncts: Vec<String> = criteria
            .iter()
            .enumerate()
            .map(|(index, item)| {
                let conjuncts: Vec<String> = item
                    .iter()
                    .map(|(column, value)| {
                        let target = self.dialect.quote_identifier(column);
                        if value.is_null() {
                            format!("{target} IS NULL")
                        } else {
                            let name = parameters.bind(parameter_name(column, index), value);
                            let placeholder = self.dialect.placeholder(&name);
                            format!("{target} = {placeholder}")
                        }
                    })
                    .collect();
                format!("({})", conjuncts.join(" AND "))
            })
            .collect();
        Some(disjuncts.join(" OR "))
    }
}

fn key_value<'r>(record: &'r Record, index: usize, key: &str) -> Result<&'r Value> {
    match record.get(key) {
        Some(value) if !value.is_null() => Ok(value),
        _ => Err(ValidationError::MissingKeyValue {
            record: index,
            column: key.to_string(),
        }
        .into()),
    }
}

/// Parameters of one statement, with names unique within it.
#[derive(Default)]
struct Bindings {
    parameters: Vec<Parameter>,
    names: HashSet<String>,
}

impl Bindings {
    /// Binds `value` as `name`, or as `name_2`, `name_3`, ... when another
    /// column already produced that name. Returns the name bound.
    fn bind(&mut self, name: String, value: &Value) -> String {
        let mut unique = name.clone();
        let mut ordinal = 2;
        while !self.names.insert(unique.clone()) {
            unique = format!("{name}_{ordinal}");
            ordinal += 1;
        }
        self.parameters.push(Parameter::new(unique.clone(), value.clone()));
        unique
    }

    fn into_parameters(self) -> Vec<Parameter> {
        self.parameters
    }
}

fn sanitize(column: &str) -> String {
    column
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

fn parameter_name(column: &str, index: usize) -> String {
    format!("{}_{index}", sanitize(column))
}

fn assemble(round_trip: RoundTrip, head: String, body: Option<String>) -> String {
    let mut lines = Vec::new();
    if let Some(declare) = round_trip.declare {
        lines.push(declare);
        lines.push(String::new());
    }
    lines.push(head);
    lines.extend(round_trip.output);
    lines.extend(body);
    lines.extend(round_trip.returning);
    if let Some(select) = round_trip.select {
        lines.push(String::new());
        lines.push(select);
    }
    lines.join("\n")
}
