//! Agents and the delegation chain of a context.

use crate::error::{Result, StoreError};
use crate::value::DataMap;
use std::collections::HashMap;
use std::path::PathBuf;

/// Opaque transcript owned by one agent.
///
/// The structure is defined by the transcript collaborator; this crate only
/// moves it around.
#[derive(Debug, Clone, PartialEq)]
pub struct Transcript(serde_json::Value);

impl Transcript {
    pub fn new(value: serde_json::Value) -> Self {
        Self(value)
    }

    pub fn empty() -> Self {
        Self(serde_json::Value::Array(Vec::new()))
    }

    pub fn as_value(&self) -> &serde_json::Value {
        &self.0
    }

    pub fn into_value(self) -> serde_json::Value {
        self.0
    }
}

impl Default for Transcript {
    fn default() -> Self {
        Self::empty()
    }
}

/// Runtime configuration shared by every agent of a context.
///
/// Built fresh by a [`ContextFactory`](super::ContextFactory) whenever a
/// context is materialized; never persisted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AgentConfig {
    /// Name of the prompt/profile set the agents run with
    pub profile: Option<String>,
    /// Working directory for agent execution
    pub cwd: Option<PathBuf>,
    /// Environment variables to set
    pub env_vars: HashMap<String, String>,
}

impl AgentConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Some(profile.into());
        self
    }
}

/// A node of the agent chain.
///
/// `superior`/`subordinate` are positions inside the owning [`AgentChain`]
/// and are only ever set by the chain itself.
#[derive(Debug, Clone, PartialEq)]
pub struct Agent {
    pub number: u32,
    pub data: DataMap,
    pub transcript: Transcript,
    superior: Option<usize>,
    subordinate: Option<usize>,
}

impl Agent {
    pub fn new(number: u32, data: DataMap, transcript: Transcript) -> Self {
        Self {
            number,
            data,
            transcript,
            superior: None,
            subordinate: None,
        }
    }

    /// Position of the delegating agent, `None` for the root.
    pub fn superior(&self) -> Option<usize> {
        self.superior
    }

    /// Position of the agent this one delegated to, `None` for the tip.
    pub fn subordinate(&self) -> Option<usize> {
        self.subordinate
    }
}

/// Singly-linked chain of agents rooted at `agent0`.
///
/// Nodes live in a vector in chain order; links are derived from that order,
/// so the chain can never branch or cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentChain {
    nodes: Vec<Agent>,
}

impl AgentChain {
    /// A chain holding only an empty root agent.
    pub fn new() -> Self {
        Self {
            nodes: vec![Agent::new(0, DataMap::new(), Transcript::empty())],
        }
    }

    /// Builds a chain from agents in root-to-tip order and links them.
    ///
    /// An empty list yields a fresh root. Numbers must strictly increase.
    pub fn from_agents(agents: Vec<Agent>) -> Result<Self> {
        if agents.is_empty() {
            return Ok(Self::new());
        }

        if let Some(pair) = agents.windows(2).find(|w| w[1].number <= w[0].number) {
            return Err(StoreError::invalid_chain(format!(
                "agent numbers must strictly increase, found {} after {}",
                pair[1].number, pair[0].number
            )));
        }

        let len = agents.len();
        let nodes = agents
            .into_iter()
            .enumerate()
            .map(|(i, mut agent)| {
                agent.superior = i.checked_sub(1);
                agent.subordinate = (i + 1 < len).then_some(i + 1);
                agent
            })
            .collect();

        Ok(Self { nodes })
    }

    pub fn root(&self) -> &Agent {
        &self.nodes[0]
    }

    pub fn get(&self, index: usize) -> Option<&Agent> {
        self.nodes.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Agent> {
        self.nodes.get_mut(index)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The deepest agent of the chain.
    pub fn tip(&self) -> &Agent {
        &self.nodes[self.nodes.len() - 1]
    }

    /// Appends a subordinate to the tip and returns its position.
    pub fn delegate(&mut self, data: DataMap) -> usize {
        let tip = self.nodes.len() - 1;
        let number = self.nodes[tip].number + 1;
        let mut agent = Agent::new(number, data, Transcript::empty());
        agent.superior = Some(tip);
        self.nodes.push(agent);
        let index = self.nodes.len() - 1;
        self.nodes[tip].subordinate = Some(index);
        index
    }

    /// Positions visited by following subordinate links from the root.
    ///
    /// The walk is bounded by the chain length; exceeding it means the links
    /// are corrupt.
    pub fn walk(&self) -> Result<Vec<usize>> {
        let mut visited = Vec::with_capacity(self.nodes.len());
        let mut current = Some(0);
        while let Some(index) = current {
            if visited.len() >= self.nodes.len() {
                return Err(StoreError::invalid_chain(format!(
                    "walk exceeded chain length {}",
                    self.nodes.len()
                )));
            }
            let agent = self.nodes.get(index).ok_or_else(|| {
                StoreError::invalid_chain(format!("dangling subordinate link to {}", index))
            })?;
            visited.push(index);
            current = agent.subordinate;
        }
        Ok(visited)
    }

    /// Position of the agent carrying `number`, or `None` when no agent has it.
    pub fn position_of(&self, number: u32) -> Result<Option<usize>> {
        Ok(self
            .walk()?
            .into_iter()
            .find(|&index| self.nodes[index].number == number))
    }
}

impl Default for AgentChain {
    fn default() -> Self {
        Self::new()
    }
}
