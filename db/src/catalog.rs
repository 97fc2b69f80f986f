//! Table schema discovery and caching.
//!
//! [`SchemaCatalog`] runs the dialect's catalog query the first time a table
//! is seen on a given database and keeps the resulting [`TableSchema`] for
//! the life of the catalog. Entries are keyed by `(connection identity,
//! table)`, so databases reached through different connections never share
//! schemas. Schema changes made after discovery are not observed.

use std::sync::Arc;

use dynamic_db_core::{TableName, TableSchema};
use tracing::debug;

use crate::error::{DynamicDbError, Result};
use crate::executor::{CollectRows, StatementExecutor};
use crate::once_map::OnceMap;

/// Supplies table schemas to the statement builder.
pub trait SchemaSource {
    /// Returns the columns of `table` in physical order.
    ///
    /// # Errors
    ///
    /// [`DynamicDbError::SchemaNotFound`] when the table does not exist or
    /// its metadata is not readable.
    fn table_schema(&self, table: &TableName) -> Result<Arc<TableSchema>>;
}

/// Process-lifetime cache of discovered table schemas.
///
/// Concurrent first lookups of the same key run exactly one discovery query;
/// the other callers wait for it and share its result. A failed discovery is
/// not cached.
#[derive(Debug, Default)]
pub struct SchemaCatalog {
    entries: OnceMap<(String, String), TableSchema>,
}

impl SchemaCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the schema of `table` on the executor's database, discovering
    /// it on first use.
    pub fn columns(
        &self,
        executor: &dyn StatementExecutor,
        table: &TableName,
    ) -> Result<Arc<TableSchema>> {
        let key = (
            executor.connection_identity().to_string(),
            table.as_str().to_string(),
        );
        self.entries
            .get_or_try_init(key, || discover(executor, table))
    }

    /// Returns an already discovered schema without touching the database.
    pub fn cached(&self, connection_identity: &str, table: &str) -> Option<Arc<TableSchema>> {
        self.entries
            .get(&(connection_identity.to_string(), table.to_string()))
    }

    /// Number of cached table schemas across all databases.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Pairs the catalog with an executor so it can serve as a
    /// [`SchemaSource`].
    pub fn bind<'a>(&'a self, executor: &'a dyn StatementExecutor) -> BoundCatalog<'a> {
        BoundCatalog {
            catalog: self,
            executor,
        }
    }
}

/// A [`SchemaCatalog`] bound to the connection it discovers through.
pub struct BoundCatalog<'a> {
    catalog: &'a SchemaCatalog,
    executor: &'a dyn StatementExecutor,
}

impl SchemaSource for BoundCatalog<'_> {
    fn table_schema(&self, table: &TableName) -> Result<Arc<TableSchema>> {
        self.catalog.columns(self.executor, table)
    }
}

fn discover(executor: &dyn StatementExecutor, table: &TableName) -> Result<TableSchema> {
    let dialect = executor.dialect();
    let statement = dialect.discovery_statement(table);

    let mut collected = CollectRows::default();
    executor.query(&statement, &mut collected)?;

    let columns = collected
        .rows
        .iter()
        .map(|row| dialect.decode_column(row))
        .collect::<Result<Vec<_>>>()?;

    debug!(
        table = %table,
        dialect = dialect.name(),
        columns = columns.len(),
        "Discovered table schema"
    );

    TableSchema::new(columns).ok_or_else(|| DynamicDbError::SchemaNotFound(table.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::SqlServerDialect;
    use crate::testing::ScriptedExecutor;
    use dynamic_db_core::Value;

    fn people_catalog_rows() -> Vec<Vec<Value>> {
        vec![
            vec![
                Value::from("Id"),
                Value::from("int"),
                Value::Null,
                Value::from(10),
                Value::from(0),
                Value::Bool(false),
                Value::Bool(true),
            ],
            vec![
                Value::from("FirstName"),
                Value::from("nvarchar"),
                Value::from(50),
                Value::Null,
                Value::Null,
                Value::Bool(false),
                Value::Bool(false),
            ],
        ]
    }

    #[test]
    fn test_second_lookup_does_not_requery() {
        let executor = ScriptedExecutor::new("db-a", SqlServerDialect);
        executor.push_rows(people_catalog_rows());
        let catalog = SchemaCatalog::new();
        let table = TableName::parse("dbo.People").unwrap();

        let first = catalog.columns(&executor, &table).unwrap();
        let second = catalog.columns(&executor, &table).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(executor.statements().len(), 1);
        assert_eq!(first.len(), 2);
        assert!(first.column("Id").unwrap().is_primary_key);
        assert_eq!(first.column("FirstName").unwrap().max_length, Some(50));
    }

    #[test]
    fn test_discovery_binds_schema_and_table() {
        let executor = ScriptedExecutor::new("db-a", SqlServerDialect);
        executor.push_rows(people_catalog_rows());
        let catalog = SchemaCatalog::new();

        catalog
            .columns(&executor, &TableName::parse("[dbo].[People]").unwrap())
            .unwrap();

        let statements = executor.statements();
        assert_eq!(statements[0].parameter("Schema"), Some(&Value::from("dbo")));
        assert_eq!(statements[0].parameter("Table"), Some(&Value::from("People")));
    }

    #[test]
    fn test_empty_discovery_is_schema_not_found_and_not_cached() {
        let executor = ScriptedExecutor::new("db-a", SqlServerDialect);
        executor.push_rows(Vec::new());
        let catalog = SchemaCatalog::new();
        let table = TableName::parse("Missing").unwrap();

        let err = catalog.columns(&executor, &table).unwrap_err();
        assert!(matches!(err, DynamicDbError::SchemaNotFound(ref t) if t == "Missing"));
        assert!(catalog.is_empty());

        executor.push_rows(people_catalog_rows());
        assert!(catalog.columns(&executor, &table).is_ok());
        assert_eq!(executor.statements().len(), 2);
    }

    #[test]
    fn test_partitions_by_connection_identity() {
        let catalog = SchemaCatalog::new();
        let table = TableName::parse("People").unwrap();

        let a = ScriptedExecutor::new("db-a", SqlServerDialect);
        a.push_rows(people_catalog_rows());
        let b = ScriptedExecutor::new("db-b", SqlServerDialect);
        b.push_rows(people_catalog_rows()[..1].to_vec());

        assert_eq!(catalog.columns(&a, &table).unwrap().len(), 2);
        assert_eq!(catalog.columns(&b, &table).unwrap().len(), 1);
        assert_eq!(catalog.len(), 2);
        assert!(catalog.cached("db-a", "People").is_some());
        assert!(catalog.cached("db-c", "People").is_none());
    }
}
