//! XML-RPC value model and the serde bridge used by typed API structs

use std::collections::BTreeMap;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Number, Value as JsonValue};

use super::error::Result;

/// A single XML-RPC value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Bool(bool),
    Double(f64),
    String(String),
    DateTime(String),
    Base64(Vec<u8>),
    Array(Vec<Value>),
    Struct(BTreeMap<String, Value>),
    Nil,
}

impl Value {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) | Value::DateTime(s) => Some(s),
            _ => None,
        }
    }

    /// Look up a struct member by name
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Struct(members) => members.get(key),
            _ => None,
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<JsonValue> for Value {
    fn from(json: JsonValue) -> Self {
        match json {
            JsonValue::Null => Value::Nil,
            JsonValue::Bool(b) => Value::Bool(b),
            JsonValue::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Double(n.as_f64().unwrap_or_default()),
            },
            JsonValue::String(s) => Value::String(s),
            JsonValue::Array(items) => Value::Array(items.into_iter().map(Value::from).collect()),
            JsonValue::Object(members) => Value::Struct(
                members
                    .into_iter()
                    .map(|(k, v)| (k, Value::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<Value> for JsonValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Nil => JsonValue::Null,
            Value::Bool(b) => JsonValue::Bool(b),
            Value::Int(i) => JsonValue::Number(i.into()),
            Value::Double(d) => Number::from_f64(d)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            Value::String(s) | Value::DateTime(s) => JsonValue::String(s),
            Value::Base64(bytes) => JsonValue::String(STANDARD.encode(bytes)),
            Value::Array(items) => JsonValue::Array(items.into_iter().map(JsonValue::from).collect()),
            Value::Struct(members) => JsonValue::Object(
                members
                    .into_iter()
                    .map(|(k, v)| (k, JsonValue::from(v)))
                    .collect::<Map<_, _>>(),
            ),
        }
    }
}

/// Convert any serializable value into an XML-RPC value
pub fn to_value<T: Serialize + ?Sized>(value: &T) -> Result<Value> {
    Ok(Value::from(serde_json::to_value(value)?))
}

/// Decode an XML-RPC value into a typed struct
pub fn from_value<T: DeserializeOwned>(value: Value) -> Result<T> {
    Ok(serde_json::from_value(JsonValue::from(value))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Filter {
        label: String,
        datacenter_id: i64,
        #[serde(skip_serializing_if = "Option::is_none")]
        state: Option<String>,
    }

    #[test]
    fn test_struct_serializes_to_xmlrpc_struct() {
        let filter = Filter {
            label: "Debian 12".to_string(),
            datacenter_id: 3,
            state: None,
        };
        let value = to_value(&filter).unwrap();

        assert_eq!(value.get("label"), Some(&Value::String("Debian 12".into())));
        assert_eq!(value.get("datacenter_id"), Some(&Value::Int(3)));
        assert!(value.get("state").is_none());
    }

    #[test]
    fn test_unknown_members_are_ignored_on_decode() {
        let mut members = BTreeMap::new();
        members.insert("label".to_string(), Value::from("Debian 12"));
        members.insert("datacenter_id".to_string(), Value::Int(1));
        members.insert("os_arch".to_string(), Value::from("x86-64"));

        let decoded: Filter = from_value(Value::Struct(members)).unwrap();
        assert_eq!(decoded.label, "Debian 12");
        assert_eq!(decoded.datacenter_id, 1);
    }

    #[test]
    fn test_decode_type_mismatch_is_an_error() {
        let result: Result<Filter> = from_value(Value::Array(vec![]));
        assert!(result.is_err());
    }

    #[test]
    fn test_base64_and_datetime_map_to_strings() {
        let json = JsonValue::from(Value::Base64(b"hello".to_vec()));
        assert_eq!(json, JsonValue::String("aGVsbG8=".into()));

        let json = JsonValue::from(Value::DateTime("20240101T10:00:00".into()));
        assert_eq!(json, JsonValue::String("20240101T10:00:00".into()));
    }

    #[test]
    fn test_non_finite_double_becomes_null() {
        assert_eq!(JsonValue::from(Value::Double(f64::NAN)), JsonValue::Null);
    }
}
