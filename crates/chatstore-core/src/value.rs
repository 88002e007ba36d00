//! Dynamic values carried by agent data and context metadata.
//!
//! Agents stash arbitrary state in a string-keyed map. Most of it is plain
//! JSON-like data, but some entries are live runtime objects (tool handles,
//! channels, caches) that have no persisted form. [`DataValue`] models both so
//! the document codec can decide per value what survives a save.

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// String-keyed dynamic map used for agent data and context metadata.
pub type DataMap = BTreeMap<String, DataValue>;

/// A live in-process object stored alongside plain data.
///
/// Runtime handles are never persisted; the codec drops them on encode.
#[derive(Clone)]
pub struct RuntimeHandle {
    type_name: &'static str,
    inner: Arc<dyn Any + Send + Sync>,
}

impl RuntimeHandle {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            type_name: std::any::type_name::<T>(),
            inner: Arc::new(value),
        }
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }
}

impl fmt::Debug for RuntimeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RuntimeHandle<{}>", self.type_name)
    }
}

impl PartialEq for RuntimeHandle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

/// A dynamically typed value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum DataValue {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    /// Unsigned integers beyond `i64::MAX`
    UInt(u64),
    Float(f64),
    Text(String),
    List(Vec<DataValue>),
    Map(DataMap),
    Runtime(RuntimeHandle),
}

impl DataValue {
    /// Returns the string slice if this is a `Text` value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            DataValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Converts to JSON if every leaf of this value has a JSON form.
    ///
    /// Returns `None` for runtime handles, non-finite floats, and any
    /// container holding one of those anywhere below it.
    pub fn to_json(&self) -> Option<serde_json::Value> {
        use serde_json::Value;
        match self {
            DataValue::Null => Some(Value::Null),
            DataValue::Bool(b) => Some(Value::Bool(*b)),
            DataValue::Int(i) => Some(Value::from(*i)),
            DataValue::UInt(u) => Some(Value::from(*u)),
            DataValue::Float(f) => serde_json::Number::from_f64(*f).map(Value::Number),
            DataValue::Text(s) => Some(Value::String(s.clone())),
            DataValue::List(items) => items
                .iter()
                .map(DataValue::to_json)
                .collect::<Option<Vec<_>>>()
                .map(Value::Array),
            DataValue::Map(map) => map
                .iter()
                .map(|(k, v)| v.to_json().map(|v| (k.clone(), v)))
                .collect::<Option<serde_json::Map<_, _>>>()
                .map(Value::Object),
            DataValue::Runtime(_) => None,
        }
    }
}

impl From<serde_json::Value> for DataValue {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::Null => DataValue::Null,
            Value::Bool(b) => DataValue::Bool(b),
            Value::Number(n) => match (n.as_i64(), n.as_u64()) {
                (Some(i), _) => DataValue::Int(i),
                (None, Some(u)) => DataValue::UInt(u),
                (None, None) => DataValue::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => DataValue::Text(s),
            Value::Array(items) => DataValue::List(items.into_iter().map(Into::into).collect()),
            Value::Object(map) => {
                DataValue::Map(map.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
        }
    }
}

impl From<&str> for DataValue {
    fn from(value: &str) -> Self {
        DataValue::Text(value.to_string())
    }
}

impl From<String> for DataValue {
    fn from(value: String) -> Self {
        DataValue::Text(value)
    }
}

impl From<i64> for DataValue {
    fn from(value: i64) -> Self {
        DataValue::Int(value)
    }
}

impl From<bool> for DataValue {
    fn from(value: bool) -> Self {
        DataValue::Bool(value)
    }
}

impl From<f64> for DataValue {
    fn from(value: f64) -> Self {
        DataValue::Float(value)
    }
}

/// Converts a JSON object into a [`DataMap`]. Non-object input yields an empty map.
pub fn data_map_from_json(value: serde_json::Value) -> DataMap {
    match value {
        serde_json::Value::Object(map) => map.into_iter().map(|(k, v)| (k, v.into())).collect(),
        _ => DataMap::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_plain_values_convert_to_json() {
        let value = DataValue::Map(DataMap::from([
            ("a".to_string(), DataValue::Int(1)),
            ("b".to_string(), DataValue::List(vec!["x".into(), DataValue::Bool(true)])),
        ]));
        assert_eq!(value.to_json(), Some(json!({"a": 1, "b": ["x", true]})));
    }

    #[test]
    fn test_runtime_and_nan_have_no_json_form() {
        assert!(DataValue::Runtime(RuntimeHandle::new(5u8)).to_json().is_none());
        assert!(DataValue::Float(f64::NAN).to_json().is_none());
        let nested = DataValue::List(vec![DataValue::Int(1), DataValue::Float(f64::INFINITY)]);
        assert!(nested.to_json().is_none());
    }

    #[test]
    fn test_from_json_roundtrip() {
        let original = json!({"n": 2, "f": 1.5, "s": "t", "l": [null]});
        let value: DataValue = original.clone().into();
        assert_eq!(value.to_json(), Some(original));
    }

    #[test]
    fn test_large_unsigned_keeps_precision() {
        let original = json!({"big": u64::MAX, "neg": i64::MIN});
        let value: DataValue = original.clone().into();
        match &value {
            DataValue::Map(map) => assert_eq!(map.get("big"), Some(&DataValue::UInt(u64::MAX))),
            other => panic!("unexpected value: {:?}", other),
        }
        assert_eq!(value.to_json(), Some(original));
    }

    #[test]
    fn test_runtime_handle_identity() {
        let handle = RuntimeHandle::new(String::from("tool"));
        let copy = handle.clone();
        assert_eq!(handle, copy);
        assert_ne!(handle, RuntimeHandle::new(String::from("tool")));
        assert_eq!(copy.downcast_ref::<String>().map(String::as_str), Some("tool"));
    }
}
