//! Engine-independent cell values.
//!
//! [`Value`] is what flows into statements as bound parameters and out of
//! result cursors as row cells. [`ValueKind`] is the runtime type a cursor
//! reports for a column and the type a materialized row field carries.

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Text layouts accepted when reading a timestamp stored as text.
const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Layout used when a timestamp is written as text.
pub const TIMESTAMP_TEXT_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Runtime type of a result column or row field.
///
/// # Examples
///
/// ```
/// use dynamic_db_core::{Value, ValueKind};
///
/// assert_eq!(Value::from(42).kind(), Some(ValueKind::Integer));
/// assert_eq!(Value::Null.kind(), None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueKind {
    Bool,
    Integer,
    Real,
    Text,
    Blob,
    Timestamp,
    /// The cursor could not report a type (e.g. an expression column);
    /// accepts any value.
    Any,
}

impl ValueKind {
    /// Returns a short lowercase name used in error messages.
    pub fn name(self) -> &'static str {
        match self {
            ValueKind::Bool => "bool",
            ValueKind::Integer => "integer",
            ValueKind::Real => "real",
            ValueKind::Text => "text",
            ValueKind::Blob => "blob",
            ValueKind::Timestamp => "timestamp",
            ValueKind::Any => "any",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single cell value.
///
/// `Null` is the engine's null marker; the typed accessors return `None`
/// for it.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
    Timestamp(NaiveDateTime),
}

impl Value {
    /// Returns the kind of a non-null value.
    pub fn kind(&self) -> Option<ValueKind> {
        match self {
            Value::Null => None,
            Value::Bool(_) => Some(ValueKind::Bool),
            Value::Integer(_) => Some(ValueKind::Integer),
            Value::Real(_) => Some(ValueKind::Real),
            Value::Text(_) => Some(ValueKind::Text),
            Value::Blob(_) => Some(ValueKind::Blob),
            Value::Timestamp(_) => Some(ValueKind::Timestamp),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            Value::Bool(b) => Some(i64::from(*b)),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Real(r) => Some(*r),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Blob(b) => Some(b),
            _ => None,
        }
    }

    /// Returns the timestamp, parsing text in one of the common layouts.
    pub fn as_timestamp(&self) -> Option<NaiveDateTime> {
        match self {
            Value::Timestamp(ts) => Some(*ts),
            Value::Text(s) => parse_timestamp(s),
            _ => None,
        }
    }

    /// Converts the value into `kind` where a conversion exists.
    ///
    /// Null passes through unchanged; nullability is the caller's concern.
    /// Integers become reals, exactly up to 2^53 in magnitude and rounded to
    /// the nearest representable value beyond it. `0`/`1` integers become
    /// booleans, and text in one of the common timestamp layouts becomes a
    /// timestamp. Returns `None` when no conversion exists.
    ///
    /// # Examples
    ///
    /// ```
    /// use dynamic_db_core::{Value, ValueKind};
    ///
    /// assert_eq!(Value::Integer(1).coerce(ValueKind::Bool), Some(Value::Bool(true)));
    /// assert_eq!(Value::Integer(7).coerce(ValueKind::Real), Some(Value::Real(7.0)));
    /// assert!(Value::from("abc").coerce(ValueKind::Integer).is_none());
    /// assert!(Value::from("2024-05-01 10:30:00").coerce(ValueKind::Timestamp).is_some());
    /// ```
    pub fn coerce(self, kind: ValueKind) -> Option<Value> {
        if kind == ValueKind::Any || self.is_null() || self.kind() == Some(kind) {
            return Some(self);
        }
        match (self, kind) {
            (Value::Integer(i), ValueKind::Real) => Some(Value::Real(i as f64)),
            (Value::Integer(0), ValueKind::Bool) => Some(Value::Bool(false)),
            (Value::Integer(1), ValueKind::Bool) => Some(Value::Bool(true)),
            (Value::Bool(b), ValueKind::Integer) => Some(Value::Integer(i64::from(b))),
            (Value::Text(s), ValueKind::Timestamp) => parse_timestamp(&s).map(Value::Timestamp),
            (Value::Timestamp(ts), ValueKind::Text) => {
                Some(Value::Text(ts.format(TIMESTAMP_TEXT_FORMAT).to_string()))
            }
            _ => None,
        }
    }
}

/// Parses a timestamp stored as text, accepting a bare date as midnight.
pub fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Real(r) => write!(f, "{r}"),
            Value::Text(s) => write!(f, "'{s}'"),
            Value::Blob(b) => write!(f, "<{} bytes>", b.len()),
            Value::Timestamp(ts) => write!(f, "{}", ts.format(TIMESTAMP_TEXT_FORMAT)),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_none(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Integer(i) => serializer.serialize_i64(*i),
            Value::Real(r) => serializer.serialize_f64(*r),
            Value::Text(s) => serializer.serialize_str(s),
            Value::Blob(b) => serializer.serialize_bytes(b),
            Value::Timestamp(ts) => ts.serialize(serializer),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Integer(i64::from(value))
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::Integer(i64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Real(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Value::Blob(value)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(value: NaiveDateTime) -> Self {
        Value::Timestamp(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

impl From<serde_json::Value> for Value {
    /// Scalars map to their natural kind; arrays and objects are kept as
    /// their JSON text.
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Integer(i),
                None => n.as_f64().map_or(Value::Null, Value::Real),
            },
            serde_json::Value::String(s) => Value::Text(s),
            other => Value::Text(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_option_none_is_null() {
        let v: Value = Option::<i64>::None.into();
        assert!(v.is_null());
        let v: Value = Some("x").into();
        assert_eq!(v, Value::Text("x".into()));
    }

    #[test]
    fn test_coerce_passes_null_through() {
        assert_eq!(Value::Null.coerce(ValueKind::Integer), Some(Value::Null));
    }

    #[test]
    fn test_coerce_rejects_unsupported_conversions() {
        assert!(Value::Real(1.5).coerce(ValueKind::Integer).is_none());
        assert!(Value::Integer(2).coerce(ValueKind::Bool).is_none());
        assert!(Value::Blob(vec![1]).coerce(ValueKind::Text).is_none());
    }

    #[test]
    fn test_coerce_integer_to_real_is_exact_up_to_2_pow_53() {
        let exact = 1_i64 << 53;
        assert_eq!(
            Value::Integer(-exact).coerce(ValueKind::Real),
            Some(Value::Real(-9_007_199_254_740_992.0))
        );
        assert_eq!(
            Value::Integer(exact + 1).coerce(ValueKind::Real),
            Some(Value::Real(9_007_199_254_740_992.0))
        );
    }

    #[test]
    fn test_parse_timestamp_layouts() {
        let expected = NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(10, 30, 0)
            .unwrap();
        assert_eq!(parse_timestamp("2024-05-01 10:30:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-05-01T10:30:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-05-01 10:30"), Some(expected));
        assert_eq!(
            parse_timestamp("2024-05-01"),
            NaiveDate::from_ymd_opt(2024, 5, 1).unwrap().and_hms_opt(0, 0, 0)
        );
        assert_eq!(parse_timestamp("yesterday"), None);
    }

    #[test]
    fn test_from_json_number() {
        assert_eq!(Value::from(serde_json::json!(5)), Value::Integer(5));
        assert_eq!(Value::from(serde_json::json!(2.5)), Value::Real(2.5));
        assert_eq!(
            Value::from(serde_json::json!([1, 2])),
            Value::Text("[1,2]".into())
        );
    }

    #[test]
    fn test_serialize_value() {
        let json = serde_json::to_string(&vec![Value::Null, Value::from(3), Value::from("a")])
            .unwrap();
        assert_eq!(json, r#"[null,3,"a"]"#);
    }
}
