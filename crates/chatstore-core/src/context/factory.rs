//! Collaborators consumed when materializing contexts.

use super::agent::{Agent, AgentConfig, Transcript};
use crate::error::{Result, StoreError};

/// Builds the fresh runtime pieces a context needs.
pub trait ContextFactory: Send + Sync {
    /// Configuration handed to every agent of a newly materialized context.
    fn agent_config(&self) -> AgentConfig;

    /// Id for a context that has none (new or imported).
    fn new_context_id(&self) -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

/// Factory returning a fixed configuration.
#[derive(Debug, Clone, Default)]
pub struct DefaultContextFactory {
    config: AgentConfig,
}

impl DefaultContextFactory {
    pub fn new(config: AgentConfig) -> Self {
        Self { config }
    }
}

impl ContextFactory for DefaultContextFactory {
    fn agent_config(&self) -> AgentConfig {
        self.config.clone()
    }
}

/// Encodes and decodes agent transcripts.
///
/// The persisted form is an opaque string; only the collaborator knows its
/// structure.
pub trait TranscriptCodec: Send + Sync {
    fn serialize(&self, agent: &Agent) -> Result<String>;

    fn deserialize(&self, raw: &str, agent_number: u32) -> Result<Transcript>;
}

/// Transcript codec storing the transcript value as compact JSON text.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonTranscriptCodec;

impl TranscriptCodec for JsonTranscriptCodec {
    fn serialize(&self, agent: &Agent) -> Result<String> {
        Ok(serde_json::to_string(agent.transcript.as_value())?)
    }

    fn deserialize(&self, raw: &str, agent_number: u32) -> Result<Transcript> {
        if raw.trim().is_empty() {
            return Ok(Transcript::empty());
        }
        serde_json::from_str(raw).map(Transcript::new).map_err(|e| {
            StoreError::malformed(format!("transcript of agent {}", agent_number), e.to_string())
        })
    }
}
