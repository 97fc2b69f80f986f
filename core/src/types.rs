//! Table metadata and result-shape types.
//!
//! [`ColumnDefinition`] and [`TableSchema`] describe a table as discovered
//! from the database catalog. [`RowShape`] describes the columns of an
//! executed statement's result cursor.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::validate::ValidationError;
use crate::value::ValueKind;

/// Catalog metadata for one table column.
///
/// Immutable once fetched. `sql_type` is the engine-reported type name
/// (e.g. `nvarchar`, `INTEGER`); `max_length` of `-1` means unbounded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDefinition {
    pub name: String,
    pub sql_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precision: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<i32>,
    pub is_nullable: bool,
    pub is_primary_key: bool,
}

impl ColumnDefinition {
    /// Creates a nullable, non-key column with no size metadata.
    pub fn new(name: impl Into<String>, sql_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql_type: sql_type.into(),
            max_length: None,
            precision: None,
            scale: None,
            is_nullable: true,
            is_primary_key: false,
        }
    }

    /// Marks the column as (part of) the primary key, which also makes it
    /// non-nullable.
    pub fn primary_key(mut self) -> Self {
        self.is_primary_key = true;
        self.is_nullable = false;
        self
    }

    pub fn not_null(mut self) -> Self {
        self.is_nullable = false;
        self
    }

    pub fn with_max_length(mut self, max_length: i32) -> Self {
        self.max_length = Some(max_length);
        self
    }

    pub fn with_precision(mut self, precision: u8, scale: Option<i32>) -> Self {
        self.precision = Some(precision);
        self.scale = scale;
        self
    }
}

/// The ordered columns of one table, in physical column order.
///
/// Never empty: an empty discovery result means the table is absent or its
/// metadata is unreadable, so [`TableSchema::new`] refuses it.
///
/// # Examples
///
/// ```
/// use dynamic_db_core::{ColumnDefinition, TableSchema};
///
/// let schema = TableSchema::new(vec![
///     ColumnDefinition::new("Id", "int").primary_key(),
///     ColumnDefinition::new("Name", "nvarchar").with_max_length(50),
/// ])
/// .unwrap();
/// assert_eq!(schema.primary_key().count(), 1);
/// assert!(TableSchema::new(Vec::new()).is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    columns: Vec<ColumnDefinition>,
}

impl TableSchema {
    /// Returns `None` when `columns` is empty.
    pub fn new(columns: Vec<ColumnDefinition>) -> Option<Self> {
        if columns.is_empty() {
            None
        } else {
            Some(Self { columns })
        }
    }

    pub fn columns(&self) -> &[ColumnDefinition] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&ColumnDefinition> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Primary-key columns in physical order.
    pub fn primary_key(&self) -> impl Iterator<Item = &ColumnDefinition> {
        self.columns.iter().filter(|c| c.is_primary_key)
    }

    pub fn has_primary_key(&self) -> bool {
        self.columns.iter().any(|c| c.is_primary_key)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Always `false`; present for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

fn table_name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(?:(\[[^\]]+\]|\w+)\.)?(\[[^\]]+\]|\w+)$").expect("static pattern is valid")
    })
}

fn strip_brackets(part: &str) -> &str {
    part.strip_prefix('[')
        .and_then(|p| p.strip_suffix(']'))
        .unwrap_or(part)
}

/// A possibly schema-qualified, possibly bracket-quoted table identifier.
///
/// `schema` is `None` when the caller did not qualify the name; the engine
/// then resolves its default schema. The original text is kept for
/// statement generation.
///
/// # Examples
///
/// ```
/// use dynamic_db_core::TableName;
///
/// let name = TableName::parse("[dbo].[People]").unwrap();
/// assert_eq!(name.schema(), Some("dbo"));
/// assert_eq!(name.name(), "People");
///
/// let bare = TableName::parse("People").unwrap();
/// assert_eq!(bare.schema(), None);
///
/// assert!(TableName::parse("a.b.c").is_err());
/// assert!(TableName::parse("  ").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableName {
    text: String,
    schema: Option<String>,
    name: String,
}

impl TableName {
    /// Parses `text`, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// [`ValidationError::EmptyTableName`] for empty or blank text,
    /// [`ValidationError::InvalidTableName`] for anything that is not one or
    /// two dot-separated identifiers.
    pub fn parse(text: &str) -> Result<Self, ValidationError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ValidationError::EmptyTableName);
        }
        let captures = table_name_pattern()
            .captures(text)
            .ok_or_else(|| ValidationError::InvalidTableName(text.to_string()))?;

        Ok(Self {
            text: text.to_string(),
            schema: captures
                .get(1)
                .map(|m| strip_brackets(m.as_str()).to_string()),
            name: strip_brackets(&captures[2]).to_string(),
        })
    }

    /// The identifier exactly as supplied (trimmed).
    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn schema(&self) -> Option<&str> {
        self.schema.as_deref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// One column of a result cursor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnShape {
    pub name: String,
    pub kind: ValueKind,
    pub nullable: bool,
}

impl ColumnShape {
    pub fn new(name: impl Into<String>, kind: ValueKind, nullable: bool) -> Self {
        Self {
            name: name.into(),
            kind,
            nullable,
        }
    }
}

/// The ordered column signature of a result cursor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RowShape {
    pub columns: Vec<ColumnShape>,
}

impl RowShape {
    pub fn new(columns: Vec<ColumnShape>) -> Self {
        Self { columns }
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }
}
