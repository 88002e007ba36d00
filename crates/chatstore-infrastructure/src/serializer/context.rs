//! Context ⇄ document conversion.

use super::agents::{flatten_agents, rebuild_agents, resolve_streaming};
use super::log::{flatten_log, rebuild_log};
use crate::codec::encode_map;
use crate::dto::ContextDocument;
use chatstore_core::context::{AgentConfig, Context, DEFAULT_LOG_WINDOW, TranscriptCodec};
use chatstore_core::error::{Result, StoreError};
use chatstore_core::value::data_map_from_json;
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde_json::Value;
use std::sync::Arc;

const NAIVE_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Converts live contexts to persisted documents and back.
#[derive(Clone)]
pub struct ContextSerializer {
    transcripts: Arc<dyn TranscriptCodec>,
    log_window: usize,
}

impl std::fmt::Debug for ContextSerializer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextSerializer")
            .field("transcripts", &"<dyn TranscriptCodec>")
            .field("log_window", &self.log_window)
            .finish()
    }
}

impl ContextSerializer {
    pub fn new(transcripts: Arc<dyn TranscriptCodec>) -> Self {
        Self {
            transcripts,
            log_window: DEFAULT_LOG_WINDOW,
        }
    }

    pub fn with_log_window(mut self, log_window: usize) -> Self {
        self.log_window = log_window;
        self
    }

    pub fn log_window(&self) -> usize {
        self.log_window
    }

    pub fn to_document(&self, context: &Context) -> Result<ContextDocument> {
        let metadata = encode_map(&context.metadata);
        Ok(ContextDocument {
            id: Some(context.id.clone()),
            name: context.name.clone(),
            created_at: Some(format_timestamp(&context.created_at)),
            context_type: context.context_type,
            last_message: Some(format_timestamp(&context.last_message)),
            agents: flatten_agents(&context.agents, self.transcripts.as_ref())?,
            streaming_agent: context.streaming_agent().map(|agent| agent.number),
            log: Some(flatten_log(&context.log, self.log_window)),
            metadata: (!metadata.is_empty()).then_some(metadata),
        })
    }

    /// Materializes a context under `id` with a fresh agent configuration.
    ///
    /// The document's own id is ignored; callers decide which id applies.
    pub fn from_document(
        &self,
        document: ContextDocument,
        id: String,
        config: Arc<AgentConfig>,
    ) -> Result<Context> {
        let created_at = parse_timestamp(document.created_at.as_deref(), &id)?;
        let last_message = parse_timestamp(document.last_message.as_deref(), &id)?;
        let agents = rebuild_agents(document.agents, self.transcripts.as_ref())?;
        let streaming = resolve_streaming(&agents, document.streaming_agent)?;

        let mut context = Context::new(id, document.context_type, config);
        context.name = document.name;
        context.created_at = created_at;
        context.last_message = last_message;
        context.metadata = document
            .metadata
            .map(|metadata| data_map_from_json(Value::Object(metadata)))
            .unwrap_or_default();
        context.agents = agents;
        context.log = rebuild_log(document.log);
        context.set_streaming_agent(streaming)?;
        Ok(context)
    }
}

pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339()
}

/// Parses an ISO 8601 timestamp. Values without an offset are taken as UTC;
/// a missing value is the Unix epoch.
pub fn parse_timestamp(value: Option<&str>, source: &str) -> Result<DateTime<Utc>> {
    let Some(value) = value else {
        return Ok(DateTime::<Utc>::default());
    };

    if let Ok(timestamp) = DateTime::parse_from_rfc3339(value) {
        return Ok(timestamp.with_timezone(&Utc));
    }

    NaiveDateTime::parse_from_str(value, NAIVE_TIMESTAMP_FORMAT)
        .map(|naive| Utc.from_utc_datetime(&naive))
        .map_err(|e| StoreError::malformed(source, format!("bad timestamp '{}': {}", value, e)))
}
