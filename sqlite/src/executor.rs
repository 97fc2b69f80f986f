//! A [`StatementExecutor`] over one rusqlite connection.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use dynamic_db::{Dialect, DynamicDbError, RowSink, SqliteDialect, StatementExecutor};
use dynamic_db_core::{ColumnShape, RowShape, Statement, StatementKind};
use rusqlite::{Connection, ToSql};
use tracing::debug;

use crate::config::SqliteConfig;
use crate::convert::{SqlParam, kind_from_declared, value_from_ref};
use crate::error::{Result, SqliteError};

static IN_MEMORY_DATABASES: AtomicU64 = AtomicU64::new(0);

/// Runs dynamic-db statements on a SQLite connection.
///
/// The connection identity is `sqlite:<canonical path>` for a file, so
/// executors opened on the same file share cached schemas and row types.
/// Every in-memory database is private to its connection and gets an
/// identity of its own.
///
/// # Examples
///
/// ```
/// use dynamic_db::DynamicDb;
/// use dynamic_db_core::record;
/// use dynamic_db_sqlite::SqliteExecutor;
///
/// let executor = SqliteExecutor::open_in_memory().unwrap();
/// executor
///     .execute_batch("CREATE TABLE Tags (Id INTEGER PRIMARY KEY, Label TEXT NOT NULL);")
///     .unwrap();
///
/// let db = DynamicDb::new(executor);
/// let rows = db.insert("Tags", &[record! { "Label" => "urgent" }]).unwrap();
/// assert_eq!(rows[0].get_i64("Id"), Some(1));
/// assert_eq!(rows[0].get_str("Label"), Some("urgent"));
/// ```
#[derive(Debug)]
pub struct SqliteExecutor {
    conn: Connection,
    identity: String,
}

impl SqliteExecutor {
    /// Opens (or creates) a database file with default settings.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError`](SqliteError::DatabaseError) if the file
    /// cannot be opened or configured.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_config(&SqliteConfig::file(path.as_ref()))
    }

    /// Opens a private in-memory database with default settings.
    pub fn open_in_memory() -> Result<Self> {
        Self::from_config(&SqliteConfig::default())
    }

    /// Opens the database described by `config` and applies its settings.
    pub fn from_config(config: &SqliteConfig) -> Result<Self> {
        let (conn, identity) = match &config.path {
            Some(path) => {
                let conn = Connection::open(path)?;
                let canonical = std::fs::canonicalize(path).unwrap_or_else(|_| path.clone());
                (conn, format!("sqlite:{}", canonical.display()))
            }
            None => {
                let n = IN_MEMORY_DATABASES.fetch_add(1, Ordering::Relaxed);
                (Connection::open_in_memory()?, format!("sqlite::memory:{n}"))
            }
        };

        conn.busy_timeout(config.busy_timeout())?;
        let foreign_keys = if config.foreign_keys { "ON" } else { "OFF" };
        conn.execute_batch(&format!("PRAGMA foreign_keys = {foreign_keys};"))?;

        debug!(
            connection = %identity,
            busy_timeout_ms = config.busy_timeout_ms,
            foreign_keys = config.foreign_keys,
            "Opened SQLite database"
        );
        Ok(Self::from_connection(conn, identity))
    }

    /// Wraps an already configured connection.
    ///
    /// `identity` must follow the [`StatementExecutor::connection_identity`]
    /// contract.
    pub fn from_connection(conn: Connection, identity: impl Into<String>) -> Self {
        Self {
            conn,
            identity: identity.into(),
        }
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn into_connection(self) -> Connection {
        self.conn
    }

    /// Runs semicolon-separated SQL without parameters, e.g. DDL.
    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        self.conn.execute_batch(sql)?;
        Ok(())
    }

    fn prepare(&self, statement: &Statement) -> dynamic_db::Result<rusqlite::Statement<'_>> {
        if statement.kind == StatementKind::Procedure {
            return Err(DynamicDbError::engine(SqliteError::UnsupportedStatementKind(
                statement.text.clone(),
            )));
        }
        self.conn
            .prepare(&statement.text)
            .map_err(DynamicDbError::engine)
    }
}

/// Parameter names carry no prefix unless the caller wrote one.
fn bind_name(name: &str) -> String {
    if name.starts_with(['@', ':', '$']) {
        name.to_string()
    } else {
        format!("@{name}")
    }
}

/// A statement's parameters in rusqlite's named form.
struct NamedParams<'a> {
    names: Vec<String>,
    values: Vec<SqlParam<'a>>,
}

impl<'a> NamedParams<'a> {
    fn new(statement: &'a Statement) -> Self {
        Self {
            names: statement.parameters.iter().map(|p| bind_name(&p.name)).collect(),
            values: statement.parameters.iter().map(|p| SqlParam(&p.value)).collect(),
        }
    }

    fn bound(&self) -> Vec<(&str, &dyn ToSql)> {
        self.names
            .iter()
            .zip(&self.values)
            .map(|(name, value)| (name.as_str(), value as &dyn ToSql))
            .collect()
    }
}

impl StatementExecutor for SqliteExecutor {
    fn connection_identity(&self) -> &str {
        &self.identity
    }

    fn dialect(&self) -> &dyn Dialect {
        &SqliteDialect
    }

    fn execute(&self, statement: &Statement) -> dynamic_db::Result<usize> {
        let mut stmt = self.prepare(statement)?;
        let params = NamedParams::new(statement);
        stmt.execute(params.bound().as_slice()).map_err(DynamicDbError::engine)
    }

    fn query(&self, statement: &Statement, sink: &mut dyn RowSink) -> dynamic_db::Result<()> {
        let mut stmt = self.prepare(statement)?;
        let shape = RowShape::new(
            stmt.columns()
                .iter()
                .map(|column| {
                    ColumnShape::new(column.name(), kind_from_declared(column.decl_type()), true)
                })
                .collect(),
        );
        let width = shape.len();
        sink.begin(&shape)?;

        let params = NamedParams::new(statement);
        let bound = params.bound();
        let mut rows = stmt.query(bound.as_slice()).map_err(DynamicDbError::engine)?;
        while let Some(row) = rows.next().map_err(DynamicDbError::engine)? {
            let values = (0..width)
                .map(|i| row.get_ref(i).map(value_from_ref))
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(DynamicDbError::engine)?;
            sink.row(values)?;
        }
        Ok(())
    }
}
