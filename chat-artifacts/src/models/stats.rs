use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use super::chat::Message;

/// Message counts and timestamps for one conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationStats {
    pub session_id: String,
    pub total_messages: usize,
    pub user_messages: usize,
    pub assistant_messages: usize,
    pub system_messages: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub context_keys: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactStats {
    pub total_artifacts: usize,
    pub by_type: BTreeMap<String, usize>,
    pub by_language: BTreeMap<String, usize>,
    pub runnable_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionStats {
    #[serde(flatten)]
    pub conversation: ConversationStats,
    pub artifacts: ArtifactStats,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionMetadata {
    pub session_id: String,
    pub created_at: DateTime<Utc>,
    pub message_count: usize,
}

/// Snapshot of a conversation handed to prompt builders
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryState {
    pub conversation_history: Vec<Message>,
    pub current_context: Map<String, Value>,
    pub artifacts_generated: Vec<String>,
    pub session_metadata: SessionMetadata,
}
