//! Per-session message log with a size cap

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::debug;

use crate::core::clock::{Clock, SystemClock};
use crate::models::{ConversationStats, Message, MessageRole};

/// Ordered messages of one session plus free-form side context
///
/// Holds at most `max_size` messages; appending past the cap drops the
/// oldest ones. `updated_at` is refreshed by every mutation and never moves
/// backwards, even if the clock does.
pub struct ConversationMemory {
    session_id: String,
    messages: Vec<Message>,
    context: Map<String, Value>,
    max_size: usize,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    clock: Arc<dyn Clock>,
}

impl ConversationMemory {
    pub fn new(session_id: impl Into<String>, max_size: usize) -> Self {
        Self::with_clock(session_id, max_size, Arc::new(SystemClock))
    }

    pub fn with_clock(session_id: impl Into<String>, max_size: usize, clock: Arc<dyn Clock>) -> Self {
        let now = clock.now();
        Self {
            session_id: session_id.into(),
            messages: Vec::new(),
            context: Map::new(),
            max_size: max_size.max(1),
            created_at: now,
            updated_at: now,
            clock,
        }
    }

    pub fn append(&mut self, message: Message) {
        self.messages.push(message);

        if self.messages.len() > self.max_size {
            let remove_count = self.messages.len() - self.max_size;
            self.messages.drain(0..remove_count);
            debug!(
                "Trimmed {} old messages from session {}",
                remove_count, self.session_id
            );
        }

        self.touch();
    }

    /// The last `n` messages in insertion order
    pub fn recent(&self, n: usize) -> &[Message] {
        let start = self.messages.len().saturating_sub(n);
        &self.messages[start..]
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Drop all messages and the side context
    pub fn clear(&mut self) {
        self.messages.clear();
        self.context.clear();
        self.touch();
    }

    pub fn update_context(&mut self, updates: Map<String, Value>) {
        self.context.extend(updates);
        self.touch();
    }

    pub fn context(&self) -> &Map<String, Value> {
        &self.context
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Artifact ids referenced by the retained messages, oldest first
    pub fn artifact_refs(&self) -> Vec<String> {
        self.messages
            .iter()
            .flat_map(|message| message.artifact_refs.iter().cloned())
            .collect()
    }

    pub fn stats(&self) -> ConversationStats {
        let count = |role: MessageRole| self.messages.iter().filter(|m| m.role == role).count();

        ConversationStats {
            session_id: self.session_id.clone(),
            total_messages: self.messages.len(),
            user_messages: count(MessageRole::User),
            assistant_messages: count(MessageRole::Assistant),
            system_messages: count(MessageRole::System),
            created_at: self.created_at,
            updated_at: self.updated_at,
            context_keys: self.context.keys().cloned().collect(),
        }
    }

    fn touch(&mut self) {
        self.updated_at = self.updated_at.max(self.clock.now());
    }
}

impl std::fmt::Debug for ConversationMemory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversationMemory")
            .field("session_id", &self.session_id)
            .field("messages", &self.messages.len())
            .field("max_size", &self.max_size)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}
