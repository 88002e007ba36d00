//! Agent-chain flattening and rebuilding.

use crate::codec::encode_map;
use crate::dto::AgentRecord;
use chatstore_core::context::{Agent, AgentChain, TranscriptCodec};
use chatstore_core::error::Result;
use chatstore_core::value::{DataMap, data_map_from_json};
use serde_json::Value;

/// Data keys with this prefix hold runtime scratch values and are never persisted.
pub const RUNTIME_KEY_PREFIX: &str = "_";

/// Flattens the chain from the root along subordinate links.
pub fn flatten_agents(
    chain: &AgentChain,
    transcripts: &dyn TranscriptCodec,
) -> Result<Vec<AgentRecord>> {
    chain
        .walk()?
        .into_iter()
        .filter_map(|index| chain.get(index))
        .map(|agent| -> Result<AgentRecord> {
            Ok(AgentRecord {
                number: agent.number,
                data: encode_map(&persistent_data(&agent.data)),
                history: transcripts.serialize(agent)?,
            })
        })
        .collect()
}

fn persistent_data(data: &DataMap) -> DataMap {
    data.iter()
        .filter(|(key, _)| !key.starts_with(RUNTIME_KEY_PREFIX))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

/// Rebuilds a linked chain from records in root-to-tip order.
///
/// Fails with `InvalidChainState` when the numbers do not strictly increase.
pub fn rebuild_agents(
    records: Vec<AgentRecord>,
    transcripts: &dyn TranscriptCodec,
) -> Result<AgentChain> {
    let agents = records
        .into_iter()
        .map(|record| -> Result<Agent> {
            let transcript = transcripts.deserialize(&record.history, record.number)?;
            Ok(Agent::new(
                record.number,
                data_map_from_json(Value::Object(record.data)),
                transcript,
            ))
        })
        .collect::<Result<Vec<_>>>()?;

    AgentChain::from_agents(agents)
}

/// Chain position of the agent with the persisted streaming `number`.
pub fn resolve_streaming(chain: &AgentChain, number: Option<u32>) -> Result<Option<usize>> {
    match number {
        Some(number) => chain.position_of(number),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatstore_core::context::{JsonTranscriptCodec, Transcript};
    use chatstore_core::value::{DataValue, RuntimeHandle};
    use serde_json::json;

    fn record(number: u32) -> AgentRecord {
        AgentRecord {
            number,
            data: serde_json::Map::new(),
            history: String::new(),
        }
    }

    #[test]
    fn test_flatten_skips_runtime_keys_and_values() {
        let mut chain = AgentChain::new();
        let root = chain.get_mut(0).unwrap();
        root.data.insert("plan".to_string(), DataValue::Text("x".to_string()));
        root.data.insert("_scratch".to_string(), DataValue::Int(1));
        root.data.insert("tool".to_string(), DataValue::Runtime(RuntimeHandle::new(3u8)));
        root.transcript = Transcript::new(json!([{"role": "user"}]));

        let records = flatten_agents(&chain, &JsonTranscriptCodec).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(Value::Object(records[0].data.clone()), json!({"plan": "x"}));
        assert_eq!(records[0].history, r#"[{"role":"user"}]"#);
    }

    #[test]
    fn test_flatten_then_rebuild_links() {
        let mut chain = AgentChain::new();
        chain.delegate(DataMap::new());
        chain.delegate(DataMap::new());

        let records = flatten_agents(&chain, &JsonTranscriptCodec).unwrap();
        let numbers: Vec<u32> = records.iter().map(|r| r.number).collect();
        assert_eq!(numbers, vec![0, 1, 2]);

        let rebuilt = rebuild_agents(records, &JsonTranscriptCodec).unwrap();
        assert_eq!(rebuilt.len(), 3);
        for i in 0..2 {
            assert_eq!(rebuilt.get(i).unwrap().subordinate(), Some(i + 1));
            assert_eq!(rebuilt.get(i + 1).unwrap().superior(), Some(i));
        }
        assert_eq!(rebuilt.root().superior(), None);
        assert_eq!(rebuilt.tip().subordinate(), None);
    }

    #[test]
    fn test_empty_records_give_root() {
        let chain = rebuild_agents(Vec::new(), &JsonTranscriptCodec).unwrap();
        assert_eq!(chain.len(), 1);
        assert_eq!(chain.root().number, 0);
        assert!(chain.root().data.is_empty());
        assert_eq!(chain.root().transcript, Transcript::empty());
    }

    #[test]
    fn test_non_increasing_numbers_rejected() {
        let err = rebuild_agents(vec![record(0), record(2), record(2)], &JsonTranscriptCodec)
            .unwrap_err();
        assert!(err.is_invalid_chain());
    }

    #[test]
    fn test_resolve_streaming() {
        let chain = rebuild_agents(vec![record(0), record(3)], &JsonTranscriptCodec).unwrap();
        assert_eq!(resolve_streaming(&chain, Some(3)).unwrap(), Some(1));
        assert_eq!(resolve_streaming(&chain, Some(7)).unwrap(), None);
        assert_eq!(resolve_streaming(&chain, None).unwrap(), None);
    }

    #[test]
    fn test_bad_transcript_is_malformed() {
        let mut bad = record(0);
        bad.history = "{oops".to_string();
        let err = rebuild_agents(vec![bad], &JsonTranscriptCodec).unwrap_err();
        assert!(err.is_malformed());
    }
}
