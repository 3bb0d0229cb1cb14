//! Application parameter sources.
//!
//! The marshaller only sees `ParameterSource`: the supplied names plus a
//! lookup by name. Name-keyed maps implement it directly; any serde
//! `Serialize` struct becomes one through `Fields`.

use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;

use super::ser::to_value;
use crate::error::{Error, Result};
use crate::protocol::types::value::json_object_to_structure;
use crate::protocol::types::{Structure, Value};

/// A set of named call arguments.
pub trait ParameterSource {
    /// Names of all supplied values.
    fn names(&self) -> Vec<&str>;

    /// Value for `name`, or `None` if absent.
    fn value_for(&self, name: &str) -> Option<&Value>;
}

impl ParameterSource for BTreeMap<String, Value> {
    fn names(&self) -> Vec<&str> {
        self.keys().map(String::as_str).collect()
    }

    fn value_for(&self, name: &str) -> Option<&Value> {
        self.get(name)
    }
}

impl<S: BuildHasher> ParameterSource for HashMap<String, Value, S> {
    fn names(&self) -> Vec<&str> {
        self.keys().map(String::as_str).collect()
    }

    fn value_for(&self, name: &str) -> Option<&Value> {
        self.get(name)
    }
}

impl<T: ParameterSource + ?Sized> ParameterSource for &T {
    fn names(&self) -> Vec<&str> {
        (**self).names()
    }

    fn value_for(&self, name: &str) -> Option<&Value> {
        (**self).value_for(name)
    }
}

/// Named-field aggregate adapter.
///
/// # Example
///
/// ```
/// use sap_rfc_rs::Fields;
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// #[allow(non_snake_case)]
/// struct Request {
///     REQUTEXT: String,
/// }
///
/// let fields = Fields::from_serialize(&Request { REQUTEXT: "hello".into() }).unwrap();
/// assert_eq!(fields.len(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fields {
    values: Structure,
}

impl Fields {
    /// Build from any struct (or map) that serializes to named fields.
    ///
    /// Byte fields (`Vec<u8>`, `Value::Bytes`) stay bytes.
    pub fn from_serialize<T: Serialize + ?Sized>(aggregate: &T) -> Result<Self> {
        Self::from_value(to_value(aggregate)?)
    }

    /// Build from a JSON object.
    pub fn from_json(json: serde_json::Value) -> Result<Self> {
        match json {
            serde_json::Value::Object(map) => Ok(Self {
                values: json_object_to_structure(map)?,
            }),
            other => Err(Error::invalid_parameters(format!(
                "Parameters can only be passed as name-keyed mappings or named-field aggregates, got {}",
                json_kind(&other)
            ))),
        }
    }

    /// Build from a structure value.
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Structure(values) => Ok(Self { values }),
            other => Err(Error::invalid_parameters(format!(
                "Parameters can only be passed as name-keyed mappings or named-field aggregates, got {}",
                other.kind_name()
            ))),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn into_inner(self) -> Structure {
        self.values
    }
}

fn json_kind(json: &serde_json::Value) -> &'static str {
    match json {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

impl ParameterSource for Fields {
    fn names(&self) -> Vec<&str> {
        self.values.names()
    }

    fn value_for(&self, name: &str) -> Option<&Value> {
        self.values.value_for(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Serialize)]
    #[allow(non_snake_case)]
    struct Request {
        NAME: String,
        COUNT: i32,
        COMMENT: Option<String>,
    }

    #[test]
    fn test_fields_from_struct() {
        let fields = Fields::from_serialize(&Request {
            NAME: "ABC".to_string(),
            COUNT: 2,
            COMMENT: None,
        })
        .unwrap();
        let mut names = fields.names();
        names.sort_unstable();
        assert_eq!(names, vec!["COMMENT", "COUNT", "NAME"]);
        assert_eq!(fields.value_for("NAME"), Some(&Value::from("ABC")));
        assert_eq!(fields.value_for("COMMENT"), Some(&Value::Null));
        assert_eq!(fields.value_for("name"), None);
    }

    #[test]
    fn test_fields_keep_bytes() {
        #[derive(Serialize)]
        #[allow(non_snake_case)]
        struct Upload {
            DATA: Vec<u8>,
            XDATA: Value,
        }

        let fields = Fields::from_serialize(&Upload {
            DATA: vec![1, 2, 3],
            XDATA: Value::Bytes(vec![0xFF]),
        })
        .unwrap();
        assert_eq!(fields.value_for("DATA"), Some(&Value::Bytes(vec![1, 2, 3])));
        assert_eq!(fields.value_for("XDATA"), Some(&Value::Bytes(vec![0xFF])));
    }

    #[test]
    fn test_fields_rejects_non_aggregates() {
        for bad in [json!(1), json!("text"), json!([{"A": 1}])] {
            match Fields::from_json(bad) {
                Err(Error::InvalidParameters { message }) => {
                    assert!(message.contains("named-field aggregates"))
                }
                other => panic!("Expected InvalidParameters, got {other:?}"),
            }
        }
        assert!(Fields::from_value(Value::Integer(1)).is_err());
        assert!(Fields::from_serialize(&vec![1u8, 2]).is_err());
    }

    #[test]
    fn test_map_sources() {
        let mut btree = BTreeMap::new();
        btree.insert("A".to_string(), Value::Integer(1));
        assert_eq!(btree.names(), vec!["A"]);

        let mut hash: HashMap<String, Value> = HashMap::new();
        hash.insert("B".to_string(), Value::from("x"));
        assert_eq!((&hash).value_for("B"), Some(&Value::from("x")));
    }
}
