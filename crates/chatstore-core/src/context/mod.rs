//! Context domain module.
//!
//! # Module Structure
//!
//! - `model`: the `Context` entity and its `ContextType`
//! - `agent`: agents, the delegation chain, transcripts and agent configuration
//! - `log`: the activity log
//! - `factory`: collaborators used to materialize contexts (`ContextFactory`, `TranscriptCodec`)

mod agent;
mod factory;
mod log;
mod model;

pub use agent::{Agent, AgentChain, AgentConfig, Transcript};
pub use factory::{ContextFactory, DefaultContextFactory, JsonTranscriptCodec, TranscriptCodec};
pub use log::{DEFAULT_LOG_WINDOW, Log, LogItem};
pub use model::{Context, ContextType};
