use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
    System,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
            MessageRole::System => "system",
        }
    }
}

/// A single conversation message
///
/// Messages are built once and never edited after they enter a
/// conversation. Artifact references are attached with
/// [`Message::with_artifacts`] before the message is appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub role: MessageRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub artifact_refs: Vec<String>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
}

impl Message {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), role, content)
    }

    pub fn with_id(id: impl Into<String>, role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role,
            content: content.into(),
            timestamp: Utc::now(),
            artifact_refs: Vec::new(),
            metadata: Map::new(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageRole::System, content)
    }

    pub fn with_artifacts(mut self, artifact_refs: Vec<String>) -> Self {
        if !artifact_refs.is_empty() {
            self.metadata.insert("has_artifacts".to_string(), Value::Bool(true));
        }
        self.artifact_refs = artifact_refs;
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// True when the turn that produced this message did not finish cleanly
    pub fn is_incomplete(&self) -> bool {
        self.metadata
            .get("incomplete")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}

/// One event of a streamed assistant turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamChunk {
    pub chunk: String,
    pub message_id: String,
    pub session_id: String,
    pub is_complete: bool,
    pub has_artifacts: bool,
    /// Artifacts extracted by this event; the final event lists all of them
    pub artifacts: Vec<String>,
    #[serde(default)]
    pub error: bool,
}

impl StreamChunk {
    pub fn fragment(
        chunk: impl Into<String>,
        message_id: &str,
        session_id: &str,
        artifacts: Vec<String>,
    ) -> Self {
        Self {
            chunk: chunk.into(),
            message_id: message_id.to_string(),
            session_id: session_id.to_string(),
            is_complete: false,
            has_artifacts: !artifacts.is_empty(),
            artifacts,
            error: false,
        }
    }

    pub fn complete(
        chunk: impl Into<String>,
        message_id: &str,
        session_id: &str,
        artifacts: Vec<String>,
        error: bool,
    ) -> Self {
        Self {
            is_complete: true,
            error,
            ..Self::fragment(chunk, message_id, session_id, artifacts)
        }
    }
}
