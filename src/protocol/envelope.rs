//! The `{cmd, content}` envelope and the typed commands carried in it.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::debug;

use crate::results::ResultEntry;

/// Wire wrapper shared by both directions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub cmd: String,
    #[serde(default)]
    pub content: Value,
}

/// Content of a `save` command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveRequest {
    pub file: String,
    pub title: String,
    pub tags: Vec<String>,
    pub body: String,
    pub create: bool,
}

/// Outbound commands. All are fire-and-forget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Ranked search; a leading `#tag` filters by tag.
    Query(String),
    /// Request a full document, optionally scoped to the query that found it.
    Text { file: String, query: Option<String> },
    Save(SaveRequest),
    Create { title: String },
    CreateOrOpen { file: String, title: String },
    Delete(String),
}

impl Command {
    /// The `cmd` tag on the wire.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Query(_) => "query",
            Self::Text { .. } => "text",
            Self::Save(_) => "save",
            Self::Create { .. } => "create",
            Self::CreateOrOpen { .. } => "create_or_open",
            Self::Delete(_) => "delete",
        }
    }

    pub fn to_envelope(&self) -> Result<Envelope, serde_json::Error> {
        let content = match self {
            Self::Query(text) => json!(text),
            Self::Text { file, query } => match query {
                Some(query) => json!({ "file": file, "query": query }),
                None => json!({ "file": file }),
            },
            Self::Save(request) => serde_json::to_value(request)?,
            Self::Create { title } => json!({ "title": title }),
            Self::CreateOrOpen { file, title } => json!({ "file": file, "title": title }),
            Self::Delete(file) => json!(file),
        };
        Ok(Envelope {
            cmd: self.name().to_string(),
            content,
        })
    }

    /// Serialize to a single-line JSON frame.
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.to_envelope()?)
    }
}

/// Content of an inbound `text` message.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DocumentPayload {
    pub file: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub body: String,
}

/// Inbound messages the client acts on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    Results(Vec<ResultEntry>),
    Text(DocumentPayload),
    Rename { from: String, to: String },
}

impl Inbound {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Results(_) => "results",
            Self::Text(_) => "text",
            Self::Rename { .. } => "rename",
        }
    }

    /// Decode one frame. Anything unparseable or unknown yields `None`.
    pub fn decode(frame: &str) -> Option<Self> {
        let envelope: Envelope = match serde_json::from_str(frame) {
            Ok(envelope) => envelope,
            Err(err) => {
                debug!(%err, "dropping malformed frame");
                return None;
            }
        };
        let decoded = match envelope.cmd.as_str() {
            "results" => serde_json::from_value(envelope.content)
                .map(Self::Results)
                .ok(),
            "text" => serde_json::from_value(envelope.content).map(Self::Text).ok(),
            "rename" => serde_json::from_value::<(String, String)>(envelope.content)
                .map(|(from, to)| Self::Rename { from, to })
                .ok(),
            other => {
                debug!(cmd = other, "ignoring unknown command");
                return None;
            }
        };
        if decoded.is_none() {
            debug!(cmd = %envelope.cmd, "dropping frame with malformed content");
        }
        decoded
    }
}
