//! Dynamically shaped rows.
//!
//! A [`RowType`] is the descriptor synthesized for one result shape: a name
//! plus one typed field per column. Every [`Row`] materialized from that
//! shape shares the same `Arc<RowType>`.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::NaiveDateTime;
use dynamic_db_core::{PropertyBag, RowShape, Value, ValueKind};
use serde::ser::{Serialize, SerializeMap, Serializer};

/// One field of a row type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: String,
    pub kind: ValueKind,
    /// Whether the field may hold null.
    pub nullable: bool,
}

/// A named, reusable row structure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowType {
    name: String,
    fields: Vec<FieldDescriptor>,
    index: HashMap<String, usize>,
}

impl RowType {
    /// Builds a descriptor with one field per column of `shape`, in column
    /// order.
    ///
    /// Returns the name of the first repeated column if `shape` names a
    /// column twice, since two fields cannot share a name.
    pub fn from_shape(name: impl Into<String>, shape: &RowShape) -> Result<Self, String> {
        let mut index = HashMap::with_capacity(shape.len());
        let mut fields = Vec::with_capacity(shape.len());
        for (position, column) in shape.columns.iter().enumerate() {
            if index.insert(column.name.clone(), position).is_some() {
                return Err(column.name.clone());
            }
            fields.push(FieldDescriptor {
                name: column.name.clone(),
                kind: column.kind,
                nullable: column.nullable,
            });
        }
        Ok(Self {
            name: name.into(),
            fields,
            index,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.position(name).map(|i| &self.fields[i])
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl fmt::Display for RowType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {{ ", self.name)?;
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            let optional = if field.nullable { "?" } else { "" };
            write!(f, "{}: {}{optional}", field.name, field.kind)?;
        }
        f.write_str(" }")
    }
}

/// One materialized row.
///
/// Values are stored in field order and already conform to the row type:
/// every value is either null (in a nullable field) or of the field's kind.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    row_type: Arc<RowType>,
    values: Vec<Value>,
}

impl Row {
    pub(crate) fn new(row_type: Arc<RowType>, values: Vec<Value>) -> Self {
        Self { row_type, values }
    }

    pub fn row_type(&self) -> &Arc<RowType> {
        &self.row_type
    }

    /// The value of field `name`, or `None` if the row type has no such
    /// field.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.row_type.position(name).map(|i| &self.values[i])
    }

    pub fn get_i64(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(Value::as_i64)
    }

    pub fn get_f64(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(Value::as_f64)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(Value::as_bool)
    }

    pub fn get_timestamp(&self, name: &str) -> Option<NaiveDateTime> {
        self.get(name).and_then(Value::as_timestamp)
    }

    /// `true` if the field exists and holds null.
    pub fn is_null(&self, name: &str) -> bool {
        self.get(name).is_some_and(Value::is_null)
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// `(field, value)` pairs in field order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.row_type
            .fields
            .iter()
            .map(|f| f.name.as_str())
            .zip(self.values.iter())
    }
}

impl PropertyBag for Row {
    fn fields(&self) -> Vec<(String, Value)> {
        self.iter()
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect()
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (name, value) in self.iter() {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}
