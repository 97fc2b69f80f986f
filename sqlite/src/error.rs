//! Error types for the SQLite executor.
//!
//! These cover opening and configuring a connection. Failures of a statement
//! run through [`SqliteExecutor`](crate::SqliteExecutor) reach callers as
//! [`DynamicDbError::Engine`](dynamic_db::DynamicDbError::Engine) wrapping
//! the native [`rusqlite::Error`] (or [`SqliteError`] for requests SQLite
//! cannot serve).

use thiserror::Error;

/// Errors that can occur while opening or configuring a SQLite database.
#[derive(Debug, Error)]
pub enum SqliteError {
    /// SQLite database operation failure.
    #[error("database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),

    /// Reading or writing a configuration file failed.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// A configuration file is not valid YAML for [`SqliteConfig`](crate::SqliteConfig).
    #[error("configuration error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// SQLite has no stored routines to invoke.
    #[error("SQLite cannot invoke stored routine '{0}'")]
    UnsupportedStatementKind(String),
}

/// Convenience alias for results with [`SqliteError`].
pub type Result<T> = std::result::Result<T, SqliteError>;
