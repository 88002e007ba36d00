//! Loss-tolerant JSON document codec.
//!
//! Encoding never fails because of a value that has no JSON form. Such values
//! are dropped where they sit:
//! - a map entry whose value fails is removed (the key disappears)
//! - a list element that fails is removed (the list shrinks)
//! - a failing value at the top of the tree becomes `null`

use crate::dto::ContextDocument;
use chatstore_core::error::{Result, StoreError};
use chatstore_core::value::{DataMap, DataValue};
use serde_json::{Map, Value};

/// Encodes a dynamic value, dropping everything without a JSON form.
pub fn encode_tree(value: &DataValue) -> Value {
    match value {
        DataValue::Map(map) => Value::Object(encode_map(map)),
        DataValue::List(items) => Value::Array(
            items
                .iter()
                .filter_map(|item| item.to_json())
                .collect(),
        ),
        other => other.to_json().unwrap_or(Value::Null),
    }
}

/// Encodes a map, keeping only entries whose value round-trips as a whole.
pub fn encode_map(map: &DataMap) -> Map<String, Value> {
    map.iter()
        .filter_map(|(key, value)| match value.to_json() {
            Some(json) => Some((key.clone(), json)),
            None => {
                tracing::debug!("Dropping non-serializable entry '{}'", key);
                None
            }
        })
        .collect()
}

/// Renders a document as pretty-printed JSON.
pub fn encode_document(document: &ContextDocument) -> Result<String> {
    Ok(serde_json::to_string_pretty(document)?)
}

/// Parses a document; `source` names it in the error.
pub fn decode_document(text: &str, source: &str) -> Result<ContextDocument> {
    serde_json::from_str(text).map_err(|e| StoreError::malformed(source, e.to_string()))
}
