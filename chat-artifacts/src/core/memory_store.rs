//! Bounded set of conversations
//!
//! Sessions live behind a store-wide `RwLock` over the session map, and each
//! conversation sits behind its own `Mutex`. Appending to an existing session
//! only takes the read lock, so turns in different sessions never contend on
//! the map. Creating, evicting and deleting sessions take the write lock.
//!
//! Lock order is always map first, then session. Callers holding a session
//! guard obtained from [`MemoryStore::get`] must release it before calling
//! back into the store. The eviction hook runs under the map's write lock
//! and must not call back into the store either.

use parking_lot::{Mutex, RwLock};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::core::clock::{Clock, SystemClock};
use crate::core::conversation::ConversationMemory;
use crate::models::{ChatError, ChatResult, ConversationStats, MemoryState, Message, SessionMetadata};

pub type SharedConversation = Arc<Mutex<ConversationMemory>>;

/// Called with the id of every session dropped by eviction
pub type EvictionHook = Arc<dyn Fn(&str) + Send + Sync>;

#[derive(Debug, Clone)]
pub struct MemoryStoreConfig {
    /// Maximum number of live sessions
    pub capacity: usize,
    /// Maximum number of messages kept per session
    pub max_messages: usize,
}

impl Default for MemoryStoreConfig {
    fn default() -> Self {
        Self {
            capacity: 100,
            max_messages: 50,
        }
    }
}

pub struct MemoryStore {
    sessions: RwLock<HashMap<String, SharedConversation>>,
    config: MemoryStoreConfig,
    clock: Arc<dyn Clock>,
    on_evict: RwLock<Option<EvictionHook>>,
}

impl MemoryStore {
    pub fn new(config: MemoryStoreConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: MemoryStoreConfig, clock: Arc<dyn Clock>) -> Self {
        let config = MemoryStoreConfig {
            capacity: config.capacity.max(1),
            max_messages: config.max_messages.max(1),
        };
        Self {
            sessions: RwLock::new(HashMap::new()),
            config,
            clock,
            on_evict: RwLock::new(None),
        }
    }

    /// Install the hook run for each evicted session, replacing any previous one
    pub fn set_eviction_hook(&self, hook: EvictionHook) {
        *self.on_evict.write() = Some(hook);
    }

    pub fn config(&self) -> &MemoryStoreConfig {
        &self.config
    }

    /// Create a session under a fresh id
    pub fn create_session(&self) -> String {
        let session_id = Uuid::new_v4().to_string();
        self.get_or_create(&session_id);
        session_id
    }

    pub fn get_or_create(&self, session_id: &str) -> SharedConversation {
        if let Some(memory) = self.sessions.read().get(session_id) {
            return memory.clone();
        }

        let mut sessions = self.sessions.write();
        self.entry_locked(&mut sessions, session_id)
    }

    /// Append to a session, creating it if needed
    pub fn append(&self, session_id: &str, message: Message) {
        {
            let sessions = self.sessions.read();
            if let Some(memory) = sessions.get(session_id) {
                memory.lock().append(message);
                return;
            }
        }

        let mut sessions = self.sessions.write();
        let memory = self.entry_locked(&mut sessions, session_id);
        memory.lock().append(message);
    }

    /// Messages of a session in insertion order
    ///
    /// An unknown session yields an empty history. `limit` keeps only the
    /// most recent messages.
    pub fn history(&self, session_id: &str, limit: Option<usize>) -> Vec<Message> {
        let sessions = self.sessions.read();
        let Some(memory) = sessions.get(session_id) else {
            return Vec::new();
        };

        let memory = memory.lock();
        match limit {
            Some(n) => memory.recent(n).to_vec(),
            None => memory.messages().to_vec(),
        }
    }

    pub fn get(&self, session_id: &str) -> ChatResult<SharedConversation> {
        self.sessions
            .read()
            .get(session_id)
            .cloned()
            .ok_or_else(|| ChatError::SessionNotFound(session_id.to_string()))
    }

    pub fn contains(&self, session_id: &str) -> bool {
        self.sessions.read().contains_key(session_id)
    }

    /// Empty a session's messages and context; returns whether it existed
    pub fn clear(&self, session_id: &str) -> bool {
        let sessions = self.sessions.read();
        match sessions.get(session_id) {
            Some(memory) => {
                memory.lock().clear();
                info!("Cleared session {}", session_id);
                true
            },
            None => false,
        }
    }

    pub fn delete(&self, session_id: &str) -> bool {
        let removed = self.sessions.write().remove(session_id).is_some();
        if removed {
            info!("Deleted session {}", session_id);
        }
        removed
    }

    /// Merge keys into a session's side context, creating the session if needed
    pub fn update_context(&self, session_id: &str, updates: Map<String, Value>) {
        let memory = self.get_or_create(session_id);
        memory.lock().update_context(updates);
    }

    pub fn session_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.sessions.read().keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }

    pub fn session_stats(&self, session_id: &str) -> ChatResult<ConversationStats> {
        let memory = self.get(session_id)?;
        let stats = memory.lock().stats();
        Ok(stats)
    }

    /// Snapshot of a session for prompt builders
    pub fn memory_state(&self, session_id: &str) -> ChatResult<MemoryState> {
        let memory = self.get(session_id)?;
        let memory = memory.lock();

        Ok(MemoryState {
            conversation_history: memory.messages().to_vec(),
            current_context: memory.context().clone(),
            artifacts_generated: memory.artifact_refs(),
            session_metadata: SessionMetadata {
                session_id: session_id.to_string(),
                created_at: memory.created_at(),
                message_count: memory.len(),
            },
        })
    }

    fn entry_locked(
        &self,
        sessions: &mut HashMap<String, SharedConversation>,
        session_id: &str,
    ) -> SharedConversation {
        if let Some(memory) = sessions.get(session_id) {
            return memory.clone();
        }

        let memory = Arc::new(Mutex::new(ConversationMemory::with_clock(
            session_id,
            self.config.max_messages,
            self.clock.clone(),
        )));
        sessions.insert(session_id.to_string(), memory.clone());
        debug!("Created session {}", session_id);

        self.evict_locked(sessions, session_id);
        memory
    }

    /// Drop least recently updated sessions until the store fits its capacity
    ///
    /// Ties on `updated_at` go to the smaller session id. The session that
    /// triggered the eviction is never chosen.
    fn evict_locked(&self, sessions: &mut HashMap<String, SharedConversation>, keep: &str) {
        while sessions.len() > self.config.capacity {
            let oldest = sessions
                .iter()
                .filter(|(id, _)| id.as_str() != keep)
                .map(|(id, memory)| (memory.lock().updated_at(), id.clone()))
                .min();

            let Some((updated_at, id)) = oldest else {
                break;
            };
            sessions.remove(&id);
            info!("Evicted session {} (last updated {})", id, updated_at);

            if let Some(hook) = self.on_evict.read().as_ref() {
                hook(&id);
            }
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(MemoryStoreConfig::default())
    }
}
