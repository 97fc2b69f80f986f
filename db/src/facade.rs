//! The data-access facade.

use std::sync::Arc;

use dynamic_db_core::{Record, Statement, StatementKind, TableName};
use tracing::debug;

use crate::builder::StatementBuilder;
use crate::caches::Caches;
use crate::error::Result;
use crate::executor::StatementExecutor;
use crate::materialize::RowMaterializer;
use crate::row::Row;
use crate::row_cache::RowTypeKey;

/// Insert, select, update, delete, and raw statements against one
/// connection, with results materialized as [`Row`]s.
///
/// Every operation validates its input, builds one statement, runs it, and
/// drains the whole cursor before returning. Nothing is retried and nothing
/// is compensated on failure; transactions belong to the connection.
///
/// Criteria are OR-ed property bags whose fields are AND-ed equality (or
/// `IS NULL`) tests. An empty criteria slice matches every row.
pub struct DynamicDb<E> {
    executor: E,
    caches: Arc<Caches>,
}

impl<E: StatementExecutor> DynamicDb<E> {
    /// Uses the process-wide [`Caches`].
    pub fn new(executor: E) -> Self {
        Self::with_caches(executor, Caches::process())
    }

    pub fn with_caches(executor: E, caches: Arc<Caches>) -> Self {
        Self { executor, caches }
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub fn caches(&self) -> &Arc<Caches> {
        &self.caches
    }

    /// Hands the connection back.
    pub fn into_executor(self) -> E {
        self.executor
    }

    /// Inserts `records` and returns the inserted rows in insertion order,
    /// including generated and defaulted columns.
    ///
    /// # Errors
    ///
    /// Fails without running anything when `records` is empty, holds an
    /// empty record, or mixes column sets.
    pub fn insert(&self, table: &str, records: &[Record]) -> Result<Vec<Row>> {
        let table = TableName::parse(table)?;
        let statement = self.build(|builder| builder.insert(&table, records))?;
        self.fetch(&statement, RowTypeKey::Table(&table))
    }

    /// Returns the rows matching any criteria item, or every row.
    pub fn select(&self, table: &str, criteria: &[Record]) -> Result<Vec<Row>> {
        let table = TableName::parse(table)?;
        let statement = self.build(|builder| builder.select(&table, criteria))?;
        self.fetch(&statement, RowTypeKey::Table(&table))
    }

    /// Assigns `values` to the matching rows and returns them as updated.
    pub fn update(&self, table: &str, values: &Record, criteria: &[Record]) -> Result<Vec<Row>> {
        let table = TableName::parse(table)?;
        let statement = self.build(|builder| builder.update(&table, values, criteria))?;
        self.fetch(&statement, RowTypeKey::Table(&table))
    }

    /// Deletes the matching rows and returns them as they were.
    pub fn delete(&self, table: &str, criteria: &[Record]) -> Result<Vec<Row>> {
        let table = TableName::parse(table)?;
        let statement = self.build(|builder| builder.delete(&table, criteria))?;
        self.fetch(&statement, RowTypeKey::Table(&table))
    }

    /// Deletes exactly the rows whose primary key matches one of `records`
    /// (every field, for a table without a key). Rows returned by
    /// [`insert`](Self::insert) can be passed back directly after
    /// [`to_record`](dynamic_db_core::PropertyBag::to_record).
    pub fn delete_by_keys(&self, table: &str, records: &[Record]) -> Result<Vec<Row>> {
        let table = TableName::parse(table)?;
        let statement = self.build(|builder| builder.delete_by_keys(&table, records))?;
        self.fetch(&statement, RowTypeKey::Table(&table))
    }

    /// Runs caller-supplied text or a routine and returns the affected-row
    /// count.
    pub fn execute(&self, text: &str, parameters: &Record, kind: StatementKind) -> Result<usize> {
        let statement = self.build(|builder| builder.raw(text, parameters, kind))?;
        debug!(
            connection = self.executor.connection_identity(),
            statement = %statement.text,
            parameters = statement.parameters.len(),
            "Executing statement"
        );
        self.executor.execute(&statement)
    }

    /// Runs caller-supplied text or a routine and returns its rows.
    ///
    /// Routine results share a cached row type per routine name; free-text
    /// results get a new row type on every call.
    pub fn query(&self, text: &str, parameters: &Record, kind: StatementKind) -> Result<Vec<Row>> {
        let statement = self.build(|builder| builder.raw(text, parameters, kind))?;
        self.fetch(&statement, RowTypeKey::Statement(&statement))
    }

    fn build(
        &self,
        generate: impl FnOnce(&StatementBuilder<'_>) -> Result<Statement>,
    ) -> Result<Statement> {
        let catalog = self.caches.schemas.bind(&self.executor);
        let builder = StatementBuilder::new(&catalog, self.executor.dialect());
        generate(&builder)
    }

    fn fetch(&self, statement: &Statement, key: RowTypeKey<'_>) -> Result<Vec<Row>> {
        let identity = self.executor.connection_identity();
        debug!(
            connection = identity,
            statement = %statement.text,
            parameters = statement.parameters.len(),
            "Querying"
        );
        let mut materializer = RowMaterializer::new(&self.caches.row_types, identity, key);
        self.executor.query(statement, &mut materializer)?;
        let rows = materializer.into_rows();
        debug!(connection = identity, rows = rows.len(), "Materialized rows");
        Ok(rows)
    }
}
