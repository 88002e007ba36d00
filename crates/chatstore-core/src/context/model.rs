//! Context domain model.

use super::agent::{Agent, AgentChain, AgentConfig};
use super::log::Log;
use crate::error::{Result, StoreError};
use crate::ownership::OWNER_KEY;
use crate::value::{DataMap, DataValue};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Kind of conversation unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContextType {
    /// Interactive chat
    #[default]
    User,
    /// Scheduled or delegated task
    Task,
    /// Ephemeral helper context, never persisted
    Background,
}

impl ContextType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContextType::User => "user",
            ContextType::Task => "task",
            ContextType::Background => "background",
        }
    }

    /// Whether contexts of this type take part in storage operations.
    pub fn is_persistent(&self) -> bool {
        !matches!(self, ContextType::Background)
    }
}

/// A conversation/task unit: metadata, agent chain and activity log.
#[derive(Debug, Clone)]
pub struct Context {
    pub id: String,
    pub name: Option<String>,
    pub context_type: ContextType,
    pub created_at: DateTime<Utc>,
    pub last_message: DateTime<Utc>,
    pub metadata: DataMap,
    pub agents: AgentChain,
    pub log: Log,
    pub config: Arc<AgentConfig>,
    streaming_agent: Option<usize>,
}

impl Context {
    /// Creates an empty context with a fresh root agent and log.
    pub fn new(id: impl Into<String>, context_type: ContextType, config: Arc<AgentConfig>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            name: None,
            context_type,
            created_at: now,
            last_message: now,
            metadata: DataMap::new(),
            agents: AgentChain::new(),
            log: Log::new(),
            config,
            streaming_agent: None,
        }
    }

    /// The root agent.
    pub fn agent0(&self) -> &Agent {
        self.agents.root()
    }

    /// The agent currently producing output, if any.
    pub fn streaming_agent(&self) -> Option<&Agent> {
        self.streaming_agent.and_then(|index| self.agents.get(index))
    }

    pub fn streaming_index(&self) -> Option<usize> {
        self.streaming_agent
    }

    pub fn set_streaming_agent(&mut self, index: Option<usize>) -> Result<()> {
        if let Some(index) = index {
            if self.agents.get(index).is_none() {
                return Err(StoreError::invalid_chain(format!(
                    "streaming agent position {} outside chain of {}",
                    index,
                    self.agents.len()
                )));
            }
        }
        self.streaming_agent = index;
        Ok(())
    }

    /// Owner recorded in metadata.
    pub fn owner(&self) -> Option<&str> {
        self.metadata.get(OWNER_KEY).and_then(DataValue::as_str)
    }

    pub fn set_owner(&mut self, owner: impl Into<String>) {
        self.metadata
            .insert(OWNER_KEY.to_string(), DataValue::Text(owner.into()));
    }

    pub fn is_persistent(&self) -> bool {
        self.context_type.is_persistent()
    }

    /// Marks new activity.
    pub fn touch(&mut self) {
        self.last_message = Utc::now();
    }
}
