//! Row type descriptors, created once per result shape and reused.
//!
//! Two key spaces are kept, both partitioned by connection identity:
//!
//! - **tables**: results of insert/select/update/delete, keyed by the table
//!   text. A table is assumed to keep one shape for the life of the cache.
//! - **routines**: results of stored-procedure queries, keyed by routine
//!   name.
//!
//! Free-text queries are not cached. Their text is not assumed stable, so
//! each execution gets a fresh descriptor named `QueryResult_<n>`.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dynamic_db_core::{RowShape, Statement, StatementKind, TableName};
use tracing::debug;

use crate::error::{DynamicDbError, Result};
use crate::once_map::OnceMap;
use crate::row::RowType;

/// What a result cursor is cached under.
#[derive(Debug, Clone, Copy)]
pub enum RowTypeKey<'a> {
    Table(&'a TableName),
    Statement(&'a Statement),
}

/// Process-lifetime cache of [`RowType`] descriptors.
#[derive(Debug, Default)]
pub struct RowTypeCache {
    tables: OnceMap<(String, String), RowType>,
    routines: OnceMap<(String, String), RowType>,
    anonymous: AtomicU64,
}

impl RowTypeCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the descriptor for `key`, creating it from `shape` on first
    /// sight.
    ///
    /// A cached descriptor is returned as-is even if `shape` differs; the
    /// materializer reports any column that does not fit it.
    ///
    /// # Errors
    ///
    /// [`DynamicDbError::FieldMapping`] when `shape` names a column twice.
    pub fn get_or_create(
        &self,
        connection_identity: &str,
        key: RowTypeKey<'_>,
        shape: &RowShape,
    ) -> Result<Arc<RowType>> {
        match key {
            RowTypeKey::Table(table) => {
                let text = table.as_str();
                self.tables.get_or_try_init(
                    (connection_identity.to_string(), text.to_string()),
                    || create(type_name(text), shape),
                )
            }
            RowTypeKey::Statement(statement) if statement.kind == StatementKind::Procedure => {
                self.routines.get_or_try_init(
                    (connection_identity.to_string(), statement.text.clone()),
                    || create(type_name(&statement.text), shape),
                )
            }
            RowTypeKey::Statement(_) => {
                let n = self.anonymous.fetch_add(1, Ordering::Relaxed);
                create(format!("QueryResult_{n}"), shape).map(Arc::new)
            }
        }
    }

    /// Number of cached table descriptors across all databases.
    pub fn table_types(&self) -> usize {
        self.tables.len()
    }

    /// Number of cached routine descriptors across all databases.
    pub fn routine_types(&self) -> usize {
        self.routines.len()
    }
}

fn create(name: String, shape: &RowShape) -> Result<RowType> {
    let row_type = RowType::from_shape(name.clone(), shape).map_err(|column| {
        DynamicDbError::field_mapping(
            &name,
            &column,
            "the result names this column more than once",
        )
    })?;
    debug!(row_type = %row_type, "Created row type");
    Ok(row_type)
}

/// `[dbo].[People]` becomes `dbo_People`.
fn type_name(text: &str) -> String {
    text.chars()
        .filter(|c| !matches!(c, '[' | ']'))
        .map(|c| if c == '.' { '_' } else { c })
        .collect()
}
