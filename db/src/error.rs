//! Error types for data-access operations.
//!
//! Validation, schema, and shape-consistency failures are raised by this
//! crate. Engine failures are carried through untouched in
//! [`DynamicDbError::Engine`] so callers can inspect (or downcast to) the
//! executor's native error.

use dynamic_db_core::{ValidationError, ValueKind};
use thiserror::Error;

/// Errors that can occur while generating, executing, or materializing a
/// statement. All of them are terminal for the operation that raised them.
#[derive(Debug, Error)]
pub enum DynamicDbError {
    /// Caller input rejected before any statement was built.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Catalog discovery returned no columns for the table.
    #[error(
        "error retrieving schema information for table '{0}': the table may not exist or the user may not have permissions"
    )]
    SchemaNotFound(String),

    /// A batch insert mixed records with different column sets.
    #[error(
        "record {index} does not have the same columns as the first record (expected [{expected}], found [{found}])"
    )]
    InconsistentRecordShape {
        index: usize,
        expected: String,
        found: String,
    },

    /// An observed result column does not fit the cached row type.
    #[error("column '{column}' cannot be mapped onto row type '{row_type}': {reason}")]
    FieldMapping {
        row_type: String,
        column: String,
        reason: String,
    },

    /// The catalog reported a column type the scratch-table declaration
    /// cannot express.
    #[error("column type '{data_type}' of column '{column}' is not supported")]
    UnsupportedColumnType { column: String, data_type: String },

    /// A catalog discovery row had an unexpected layout.
    #[error("unexpected catalog row: {0}")]
    CatalogDecode(String),

    /// Failure reported by the statement executor, passed through verbatim.
    #[error(transparent)]
    Engine(Box<dyn std::error::Error + Send + Sync + 'static>),
}

impl DynamicDbError {
    /// Wraps an executor's native error.
    pub fn engine(error: impl std::error::Error + Send + Sync + 'static) -> Self {
        DynamicDbError::Engine(Box::new(error))
    }

    /// Returns the executor's native error, if this is an engine failure.
    pub fn engine_error(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        match self {
            DynamicDbError::Engine(inner) => Some(inner.as_ref()),
            _ => None,
        }
    }

    pub(crate) fn field_mapping(
        row_type: &str,
        column: &str,
        reason: impl Into<String>,
    ) -> Self {
        DynamicDbError::FieldMapping {
            row_type: row_type.to_string(),
            column: column.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn kind_mismatch(row_type: &str, column: &str, expected: ValueKind, found: ValueKind) -> Self {
        Self::field_mapping(
            row_type,
            column,
            format!("expected {expected}, found {found}"),
        )
    }
}

/// Convenience alias for results with [`DynamicDbError`].
pub type Result<T> = std::result::Result<T, DynamicDbError>;
