use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

use chat_artifacts_llm::ChunkConfig;

use crate::core::agent::AgentConfig;
use crate::core::memory_store::MemoryStoreConfig;
use crate::models::{ChatError, ChatResult};

/// Runtime settings
///
/// Layered from built-in defaults, then `config/{RUN_MODE}` and
/// `config/local` (any format the `config` crate understands, both
/// optional), then environment variables such as
/// `CHAT_ARTIFACTS__MEMORY__MAX_SESSIONS=20`.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    pub memory: MemorySettings,
    pub agent: AgentSettings,
    #[serde(default)]
    pub streaming: StreamingSettings,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct MemorySettings {
    pub max_sessions: usize,
    pub max_messages: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AgentSettings {
    /// Number of prior messages sent to the generator
    pub history_window: usize,
    #[serde(default)]
    pub system_prompt: Option<String>,
}

/// Chunking of scripted replies
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct StreamingSettings {
    pub chunk_size: usize,
    pub chunk_delay_ms: u64,
}

impl Default for StreamingSettings {
    fn default() -> Self {
        Self {
            chunk_size: 20,
            chunk_delay_ms: 0,
        }
    }
}

impl Settings {
    pub fn new() -> ChatResult<Self> {
        Self::from_dir("config")
    }

    pub fn from_dir(dir: impl AsRef<Path>) -> ChatResult<Self> {
        let dir = dir.as_ref();
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = Config::builder()
            .set_default("memory.max_sessions", 100)?
            .set_default("memory.max_messages", 50)?
            .set_default("agent.history_window", 10)?
            .set_default("streaming.chunk_size", 20)?
            .set_default("streaming.chunk_delay_ms", 0)?
            .add_source(File::with_name(&dir.join(&run_mode).to_string_lossy()).required(false))
            .add_source(File::with_name(&dir.join("local").to_string_lossy()).required(false))
            .add_source(Environment::with_prefix("CHAT_ARTIFACTS").separator("__"))
            .build()?;

        let settings: Settings = s.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> ChatResult<()> {
        let checks = [
            ("memory.max_sessions", self.memory.max_sessions),
            ("memory.max_messages", self.memory.max_messages),
            ("streaming.chunk_size", self.streaming.chunk_size),
        ];

        for (key, value) in checks {
            if value == 0 {
                return Err(ChatError::InvalidSettings(format!("{key} must be at least 1")));
            }
        }
        Ok(())
    }

    pub fn memory_store_config(&self) -> MemoryStoreConfig {
        MemoryStoreConfig {
            capacity: self.memory.max_sessions,
            max_messages: self.memory.max_messages,
        }
    }

    pub fn agent_config(&self) -> AgentConfig {
        AgentConfig {
            history_window: self.agent.history_window,
            system_prompt: self.agent.system_prompt.clone(),
        }
    }

    pub fn chunk_config(&self) -> ChunkConfig {
        ChunkConfig {
            chunk_size: self.streaming.chunk_size,
            chunk_delay_ms: self.streaming.chunk_delay_ms,
            ..ChunkConfig::default()
        }
    }
}
