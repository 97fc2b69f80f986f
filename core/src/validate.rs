//! Argument validation.
//!
//! Every generation operation checks its inputs with these helpers before
//! any statement text is built, so bad input never reaches the database.
//!
//! # Examples
//!
//! ```
//! use dynamic_db_core::*;
//!
//! assert!(validate_records(&[record! { "Name" => "Ada" }]).is_ok());
//! assert_eq!(validate_records(&[]), Err(ValidationError::NoRecords));
//! assert_eq!(validate_command_text(" "), Err(ValidationError::EmptyCommandText));
//! ```

use thiserror::Error;

use crate::bag::Record;

/// Caller-input errors, raised before a statement is built.
///
/// Always recoverable by supplying correct input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Table name is empty or whitespace-only.
    #[error("table name was not provided")]
    EmptyTableName,
    /// Table name is not one or two dot-separated identifiers.
    #[error("invalid table name: {0}")]
    InvalidTableName(String),
    /// An operation that needs records received none.
    #[error("there were no records provided")]
    NoRecords,
    /// A record to insert has no fields.
    #[error("record {0} has no fields")]
    EmptyRecord(usize),
    /// An update received an empty values bag.
    #[error("there were no values provided")]
    NoValues,
    /// A criteria item has no fields (it would render as an empty condition).
    #[error("criteria item {0} has no fields")]
    EmptyCriteriaItem(usize),
    /// A record passed for key-based deletion lacks a key column.
    #[error("record {record} does not provide a value for key column '{column}'")]
    MissingKeyValue { record: usize, column: String },
    /// Raw statement text or routine name is empty.
    #[error("command text was not provided")]
    EmptyCommandText,
}

/// Requires at least one record, none of them empty.
pub fn validate_records(records: &[Record]) -> Result<(), ValidationError> {
    if records.is_empty() {
        return Err(ValidationError::NoRecords);
    }
    if let Some(index) = records.iter().position(Record::is_empty) {
        return Err(ValidationError::EmptyRecord(index));
    }
    Ok(())
}

/// Requires every criteria item to contribute at least one condition.
///
/// An empty slice is valid: it means "no filter".
pub fn validate_criteria(criteria: &[Record]) -> Result<(), ValidationError> {
    match criteria.iter().position(Record::is_empty) {
        Some(index) => Err(ValidationError::EmptyCriteriaItem(index)),
        None => Ok(()),
    }
}

pub fn validate_values(values: &Record) -> Result<(), ValidationError> {
    if values.is_empty() {
        Err(ValidationError::NoValues)
    } else {
        Ok(())
    }
}

pub fn validate_command_text(text: &str) -> Result<(), ValidationError> {
    if text.trim().is_empty() {
        Err(ValidationError::EmptyCommandText)
    } else {
        Ok(())
    }
}
