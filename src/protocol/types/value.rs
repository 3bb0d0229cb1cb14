//! Application-side values exchanged with RFC calls.

use chrono::{NaiveDate, NaiveTime};
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{Error, Result};

/// Name-keyed field values of a structure or table row.
pub type Structure = BTreeMap<String, Value>;

/// A loosely-typed parameter or result value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Absent value. Treated as "not supplied" when filling.
    Null,
    /// Text (CHAR, NUM, STRING).
    String(String),
    /// Integer (INT, INT1, INT2, INT8).
    Integer(i64),
    /// Floating point (FLOAT).
    Float(f64),
    /// Decimal number as string (preserves precision).
    Decimal(String),
    /// Raw bytes (BYTE, XSTRING).
    Bytes(Vec<u8>),
    /// Calendar date (DATE).
    Date(NaiveDate),
    /// Time of day (TIME).
    Time(NaiveTime),
    /// Nested structure.
    Structure(Structure),
    /// Table rows in order.
    Table(Vec<Structure>),
}

impl Value {
    /// Check if the value is NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Try to get the value as a string reference.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            Value::Decimal(s) => Some(s),
            _ => None,
        }
    }

    /// Try to convert to i64.
    pub fn to_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            Value::Decimal(s) => s.parse().ok(),
            _ => None,
        }
    }

    /// Try to convert to f64.
    pub fn to_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            Value::Decimal(s) => s.parse().ok(),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Value::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_time(&self) -> Option<NaiveTime> {
        match self {
            Value::Time(t) => Some(*t),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_structure(&self) -> Option<&Structure> {
        match self {
            Value::Structure(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_table(&self) -> Option<&[Structure]> {
        match self {
            Value::Table(rows) => Some(rows),
            _ => None,
        }
    }

    /// Short name of the value's variant, used in diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::String(_) => "string",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::Decimal(_) => "decimal",
            Value::Bytes(_) => "bytes",
            Value::Date(_) => "date",
            Value::Time(_) => "time",
            Value::Structure(_) => "structure",
            Value::Table(_) => "table",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::String(s) => write!(f, "\"{}\"", s),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Decimal(d) => write!(f, "{}", d),
            Value::Bytes(b) => write!(f, "<BYTES: {} bytes>", b.len()),
            Value::Date(d) => write!(f, "{}", d.format("%Y%m%d")),
            Value::Time(t) => write!(f, "{}", t.format("%H%M%S")),
            Value::Structure(s) => write!(f, "<STRUCTURE: {} fields>", s.len()),
            Value::Table(rows) => write!(f, "<TABLE: {} rows>", rows.len()),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Integer(i as i64)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Bytes(b)
    }
}

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Value::Date(d)
    }
}

impl From<NaiveTime> for Value {
    fn from(t: NaiveTime) -> Self {
        Value::Time(t)
    }
}

impl From<Structure> for Value {
    fn from(s: Structure) -> Self {
        Value::Structure(s)
    }
}

impl From<Vec<Structure>> for Value {
    fn from(rows: Vec<Structure>) -> Self {
        Value::Table(rows)
    }
}

impl TryFrom<serde_json::Value> for Value {
    type Error = Error;

    /// Booleans map to the ABAP flag convention: `true` is `"X"`, `false` is `""`.
    fn try_from(json: serde_json::Value) -> Result<Self> {
        use serde_json::Value as Json;
        match json {
            Json::Null => Ok(Value::Null),
            Json::Bool(true) => Ok(Value::String("X".to_string())),
            Json::Bool(false) => Ok(Value::String(String::new())),
            Json::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(Value::Integer(i))
                } else if n.is_u64() {
                    Ok(Value::Decimal(n.to_string()))
                } else if let Some(x) = n.as_f64() {
                    Ok(Value::Float(x))
                } else {
                    Ok(Value::Decimal(n.to_string()))
                }
            }
            Json::String(s) => Ok(Value::String(s)),
            Json::Array(items) => {
                let bytes = items
                    .iter()
                    .map(|item| item.as_u64().and_then(|n| u8::try_from(n).ok()))
                    .collect::<Option<Vec<u8>>>();
                let items = items
                    .into_iter()
                    .map(Value::try_from)
                    .collect::<Result<Vec<_>>>()?;
                sequence_value(items, bytes)
            }
            Json::Object(map) => Ok(Value::Structure(json_object_to_structure(map)?)),
        }
    }
}

/// Value of a sequence: bytes if every element is a byte, otherwise table
/// rows. An empty sequence carries nothing and counts as not supplied.
pub(crate) fn sequence_value(items: Vec<Value>, bytes: Option<Vec<u8>>) -> Result<Value> {
    if items.is_empty() {
        return Ok(Value::Null);
    }
    if let Some(bytes) = bytes {
        return Ok(Value::Bytes(bytes));
    }
    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| match item {
            Value::Structure(row) => Ok(row),
            other => Err(Error::invalid_parameters(format!(
                "sequence element {} must be a named-field row or a byte, got {}",
                i,
                other.kind_name()
            ))),
        })
        .collect::<Result<Vec<_>>>()
        .map(Value::Table)
}

/// Convert a JSON object into a structure.
pub(crate) fn json_object_to_structure(
    map: serde_json::Map<String, serde_json::Value>,
) -> Result<Structure> {
    map.into_iter()
        .map(|(k, v)| -> Result<(String, Value)> { Ok((k, Value::try_from(v)?)) })
        .collect()
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_none(),
            Value::String(s) => serializer.serialize_str(s),
            Value::Integer(i) => serializer.serialize_i64(*i),
            Value::Float(x) => serializer.serialize_f64(*x),
            Value::Decimal(d) => serializer.serialize_str(d),
            Value::Bytes(b) => serializer.serialize_bytes(b),
            Value::Date(d) => serializer.collect_str(&d.format("%Y%m%d")),
            Value::Time(t) => serializer.collect_str(&t.format("%H%M%S")),
            Value::Structure(s) => {
                let mut map = serializer.serialize_map(Some(s.len()))?;
                for (k, v) in s {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
            Value::Table(rows) => {
                let mut seq = serializer.serialize_seq(Some(rows.len()))?;
                for row in rows {
                    seq.serialize_element(row)?;
                }
                seq.end()
            }
        }
    }
}
