//! SQLite executor for dynamic-db.
//!
//! [`SqliteExecutor`] runs the statements generated by
//! [`DynamicDb`](dynamic_db::DynamicDb) on a rusqlite connection. It speaks
//! the [`SqliteDialect`](dynamic_db::SqliteDialect): columns are discovered
//! through `pragma_table_info`, and writes return their rows with
//! `RETURNING *` in the same statement.
//!
//! Values travel in SQLite's storage classes. Booleans are stored as `0`/`1`
//! and timestamps as text; rows read back are converted to the kinds of the
//! table's declared column types.
//!
//! # Quick start
//!
//! ```no_run
//! use dynamic_db::DynamicDb;
//! use dynamic_db_core::record;
//! use dynamic_db_sqlite::{SqliteConfig, SqliteExecutor};
//!
//! let config = SqliteConfig::load("sqlite.yml").unwrap();
//! let db = DynamicDb::new(SqliteExecutor::from_config(&config).unwrap());
//!
//! let adults = db.select("People", &[record! { "Age" => 18 }]).unwrap();
//! for person in &adults {
//!     println!("{:?}", person.get_str("FirstName"));
//! }
//! ```
//!
//! Stored routines do not exist in SQLite; running a
//! [`StatementKind::Procedure`](dynamic_db_core::StatementKind::Procedure)
//! statement fails with [`SqliteError::UnsupportedStatementKind`] inside
//! the engine error.

mod config;
mod convert;
mod error;
mod executor;

pub use config::SqliteConfig;
pub use error::{Result, SqliteError};
pub use executor::SqliteExecutor;
