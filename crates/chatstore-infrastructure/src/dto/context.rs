//! Context document DTOs

use chatstore_core::context::ContextType;
use chatstore_core::ownership::OWNER_KEY;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Persisted form of one context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextDocument {
    /// Context id; stripped on import so a fresh one is assigned
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    /// ISO 8601 creation timestamp
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(rename = "type", default)]
    pub context_type: ContextType,
    /// ISO 8601 timestamp of the last activity
    #[serde(default)]
    pub last_message: Option<String>,
    /// Agents in chain order, root first
    #[serde(default)]
    pub agents: Vec<AgentRecord>,
    /// `number` of the agent that was streaming when saved; `null` when none
    /// was. Documents without the field predate it and resolve to the root.
    #[serde(default = "root_agent_number")]
    pub streaming_agent: Option<u32>,
    #[serde(default)]
    pub log: Option<LogRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

fn root_agent_number() -> Option<u32> {
    Some(0)
}

impl ContextDocument {
    /// Owner recorded in the document's metadata.
    pub fn owner(&self) -> Option<&str> {
        self.metadata
            .as_ref()
            .and_then(|metadata| metadata.get(OWNER_KEY))
            .and_then(Value::as_str)
    }

    pub fn is_persistent(&self) -> bool {
        self.context_type.is_persistent()
    }
}

/// Persisted form of one agent of the chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentRecord {
    pub number: u32,
    #[serde(default)]
    pub data: Map<String, Value>,
    /// Transcript as produced by the transcript collaborator
    #[serde(default)]
    pub history: String,
}

/// Persisted form of the activity log.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LogRecord {
    #[serde(default)]
    pub guid: Option<String>,
    #[serde(default)]
    pub logs: Vec<LogItemRecord>,
    #[serde(default)]
    pub progress: String,
    #[serde(default)]
    pub progress_no: usize,
}

/// Persisted form of one log item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogItemRecord {
    #[serde(default, alias = "no")]
    pub index: usize,
    #[serde(rename = "type")]
    pub item_type: String,
    #[serde(default)]
    pub heading: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub kvps: Option<Map<String, Value>>,
    #[serde(default)]
    pub temp: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_minimal_document_uses_defaults() {
        let doc: ContextDocument = serde_json::from_value(json!({"id": "c1"})).unwrap();
        assert_eq!(doc.id.as_deref(), Some("c1"));
        assert_eq!(doc.context_type, ContextType::User);
        assert!(doc.agents.is_empty());
        assert!(doc.log.is_none());
        assert!(doc.owner().is_none());
    }

    #[test]
    fn test_streaming_agent_missing_vs_null() {
        let missing: ContextDocument = serde_json::from_value(json!({"id": "c1"})).unwrap();
        assert_eq!(missing.streaming_agent, Some(0));

        let idle: ContextDocument =
            serde_json::from_value(json!({"id": "c1", "streaming_agent": null})).unwrap();
        assert_eq!(idle.streaming_agent, None);
    }

    #[test]
    fn test_owner_read_from_metadata() {
        let doc: ContextDocument = serde_json::from_value(json!({
            "id": "c1",
            "type": "task",
            "metadata": {"owner": "alice", "pinned": true}
        }))
        .unwrap();
        assert_eq!(doc.owner(), Some("alice"));
        assert_eq!(doc.context_type, ContextType::Task);
    }

    #[test]
    fn test_non_string_owner_is_no_owner() {
        let doc: ContextDocument =
            serde_json::from_value(json!({"metadata": {"owner": 42}})).unwrap();
        assert!(doc.owner().is_none());
    }

    #[test]
    fn test_legacy_log_item_no_field() {
        let item: LogItemRecord = serde_json::from_value(json!({
            "no": 7, "type": "agent", "heading": "h", "content": "c", "kvps": null, "temp": false
        }))
        .unwrap();
        assert_eq!(item.index, 7);
        assert!(item.kvps.is_none());
    }

    #[test]
    fn test_background_document_not_persistent() {
        let doc: ContextDocument = serde_json::from_value(json!({"type": "background"})).unwrap();
        assert!(!doc.is_persistent());
    }

    #[test]
    fn test_unknown_type_rejected() {
        let result = serde_json::from_value::<ContextDocument>(json!({"type": "robot"}));
        assert!(result.is_err());
    }
}
