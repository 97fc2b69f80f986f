//! Property bags: named values enumerated in a stable order.
//!
//! Criteria items, update values, insert records, and raw statement
//! parameters are all property bags. The generators only need to enumerate
//! `(name, value)` pairs; [`PropertyBag`] is that capability, and [`Record`]
//! is the ordered bag everything is normalized into.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::value::Value;

/// Enumerates named fields in a stable order.
///
/// Order matters only where it shows up in generated text (column lists and
/// parameter order); names are what statements are built from.
pub trait PropertyBag {
    fn fields(&self) -> Vec<(String, Value)>;

    fn to_record(&self) -> Record {
        Record::from_fields(self.fields())
    }
}

/// An ordered property bag.
///
/// Setting a name that is already present replaces its value in place, so a
/// record never holds duplicate names.
///
/// # Examples
///
/// ```
/// use dynamic_db_core::{record, Record, Value};
///
/// let person = record! { "FirstName" => "John", "Age" => 50, "MiddleInitial" => Option::<String>::None };
/// assert_eq!(person.names().collect::<Vec<_>>(), vec!["FirstName", "Age", "MiddleInitial"]);
/// assert_eq!(person.get("Age"), Some(&Value::Integer(50)));
///
/// let same = Record::new().with("FirstName", "John").with("Age", 50);
/// assert_eq!(same.get("FirstName"), person.get("FirstName"));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: Vec<(String, Value)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    fn from_fields(fields: Vec<(String, Value)>) -> Self {
        let mut record = Self::new();
        for (name, value) in fields {
            record.set(name, value);
        }
        record
    }

    /// Builds a record from any serializable struct or map, in declaration
    /// order.
    ///
    /// # Errors
    ///
    /// Fails if `value` cannot be serialized or does not serialize to an
    /// object.
    ///
    /// # Examples
    ///
    /// ```
    /// use dynamic_db_core::{Record, Value};
    ///
    /// #[derive(serde::Serialize)]
    /// struct Person { first_name: &'static str, age: i64 }
    ///
    /// let record = Record::from_serialize(&Person { first_name: "Ada", age: 36 }).unwrap();
    /// assert_eq!(record.names().collect::<Vec<_>>(), vec!["first_name", "age"]);
    /// assert_eq!(record.get("age"), Some(&Value::Integer(36)));
    /// assert!(Record::from_serialize(&5).is_err());
    /// ```
    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> Result<Self, serde_json::Error> {
        match serde_json::to_value(value)? {
            serde_json::Value::Object(map) => Ok(map.to_record()),
            other => Err(<serde_json::Error as serde::ser::Error>::custom(format!(
                "expected an object to build a record from, found {other}"
            ))),
        }
    }

    /// Builder-style [`set`](Self::set).
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = value,
            None => self.fields.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Returns `true` if both records expose the same set of names,
    /// regardless of order.
    pub fn same_names(&self, other: &Record) -> bool {
        self.len() == other.len() && self.names().all(|n| other.contains(n))
    }
}

impl PropertyBag for Record {
    fn fields(&self) -> Vec<(String, Value)> {
        self.fields.clone()
    }

    fn to_record(&self) -> Record {
        self.clone()
    }
}

impl PropertyBag for Vec<(String, Value)> {
    fn fields(&self) -> Vec<(String, Value)> {
        self.clone()
    }
}

impl PropertyBag for BTreeMap<String, Value> {
    fn fields(&self) -> Vec<(String, Value)> {
        self.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }
}

impl PropertyBag for serde_json::Map<String, serde_json::Value> {
    fn fields(&self) -> Vec<(String, Value)> {
        self.iter()
            .map(|(k, v)| (k.clone(), Value::from(v.clone())))
            .collect()
    }
}

impl PropertyBag for serde_json::Value {
    /// Objects enumerate their members; any other JSON value is an empty bag.
    fn fields(&self) -> Vec<(String, Value)> {
        match self {
            serde_json::Value::Object(map) => map.fields(),
            _ => Vec::new(),
        }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (name, value) in iter {
            record.set(name, value);
        }
        record
    }
}

impl IntoIterator for Record {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

/// Builds a [`Record`] from `name => value` pairs.
#[macro_export]
macro_rules! record {
    () => {
        $crate::Record::new()
    };
    ($($name:expr => $value:expr),+ $(,)?) => {
        $crate::Record::new()$(.with($name, $value))+
    };
}
