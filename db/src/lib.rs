//! Schema-driven data access without per-table mapping code.
//!
//! [`DynamicDb`] turns a table name plus property bags into parameterized
//! statements, runs them through a [`StatementExecutor`], and materializes
//! the results as [`Row`]s whose structure is discovered at first use:
//!
//! - [`SchemaCatalog`] discovers a table's columns and primary key once per
//!   database and caches them.
//! - [`StatementBuilder`] generates insert/select/update/delete/raw
//!   statements. Writes return their affected rows in the same round trip,
//!   using whatever mechanism the executor's [`Dialect`] provides.
//! - [`RowTypeCache`] keeps one [`RowType`] descriptor per table or routine;
//!   [`RowMaterializer`] converts a cursor into rows of that type.
//! - [`TestDb`] deletes the rows it inserted when dropped.
//!
//! Both caches live in a shared [`Caches`] service, partitioned by the
//! executor's connection identity. Concurrent first lookups of the same key
//! run one discovery and produce one descriptor.
//!
//! # Quick start
//!
//! ```no_run
//! use dynamic_db::{DynamicDb, StatementExecutor};
//! use dynamic_db_core::{StatementKind, record};
//!
//! fn seed(executor: impl StatementExecutor) -> dynamic_db::Result<()> {
//!     let db = DynamicDb::new(executor);
//!
//!     let inserted = db.insert(
//!         "dbo.People",
//!         &[record! { "FirstName" => "John", "Age" => 50 }],
//!     )?;
//!     println!("new id: {:?}", inserted[0].get_i64("Id"));
//!
//!     let smiths_or_forty = db.select(
//!         "dbo.People",
//!         &[record! { "LastName" => "Smith" }, record! { "Age" => 40 }],
//!     )?;
//!     println!("{} matches", smiths_or_forty.len());
//!
//!     db.update("dbo.People", &record! { "Age" => 51 }, &[record! { "FirstName" => "John" }])?;
//!     db.execute("TRUNCATE TABLE dbo.Audit", &record! {}, StatementKind::Text)?;
//!     Ok(())
//! }
//! ```

mod builder;
mod caches;
mod catalog;
mod dialect;
mod error;
mod executor;
mod facade;
mod harness;
mod materialize;
mod once_map;
mod row;
mod row_cache;

#[cfg(test)]
mod testing;

pub use builder::StatementBuilder;
pub use caches::Caches;
pub use catalog::{BoundCatalog, SchemaCatalog, SchemaSource};
pub use dialect::{Dialect, RoundTrip, SqlServerDialect, SqliteDialect, WriteKind};
pub use error::{DynamicDbError, Result};
pub use executor::{CollectRows, RowSink, StatementExecutor};
pub use facade::DynamicDb;
pub use harness::TestDb;
pub use materialize::RowMaterializer;
pub use row::{FieldDescriptor, Row, RowType};
pub use row_cache::{RowTypeCache, RowTypeKey};
