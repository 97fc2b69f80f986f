//! Engine-independent building blocks for schema-driven data access.
//!
//! This crate defines the data model shared by the statement generator, the
//! row materializer, and executors:
//!
//! - [`Value`] / [`ValueKind`] — cell values and runtime column types.
//! - [`ColumnDefinition`] / [`TableSchema`] — catalog metadata for a table.
//! - [`TableName`] — parsing of bracket- and schema-qualified identifiers.
//! - [`RowShape`] — the column signature of a result cursor.
//! - [`Statement`] — statement text with named parameters.
//! - [`PropertyBag`] / [`Record`] — named values enumerated in stable order,
//!   used for criteria items, update values, and insert records.
//!
//! Validation helpers ([`validate_records`], [`validate_criteria`], ...)
//! reject bad caller input before any statement is built.
//!
//! # Example
//!
//! ```
//! use dynamic_db_core::*;
//!
//! let criteria = vec![
//!     record! { "LastName" => "Smith" },
//!     record! { "LastName" => "Jones", "Age" => 40 },
//! ];
//! assert!(validate_criteria(&criteria).is_ok());
//!
//! let table = TableName::parse("[dbo].[People]").unwrap();
//! assert_eq!(table.name(), "People");
//! ```

mod bag;
mod statement;
mod types;
mod validate;
mod value;

pub use bag::{PropertyBag, Record};
pub use statement::{Parameter, Statement, StatementKind};
pub use types::{ColumnDefinition, ColumnShape, RowShape, TableName, TableSchema};
pub use validate::{
    ValidationError, validate_command_text, validate_criteria, validate_records, validate_values,
};
pub use value::{TIMESTAMP_TEXT_FORMAT, Value, ValueKind, parse_timestamp};
