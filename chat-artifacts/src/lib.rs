//! # chat-artifacts
//!
//! Conversation memory and streaming artifact extraction for a coding
//! assistant.
//!
//! - [`core::MemoryStore`] keeps a bounded set of sessions, each a bounded
//!   message log, evicting the least recently updated session when full.
//! - [`utils::scanner`] finds fenced code blocks, incrementally when fed a
//!   streamed reply, and [`utils::classifier`] turns them into typed
//!   [`models::Artifact`]s.
//! - [`core::CodingAgent`] wires both to a
//!   [`TextGenerator`](chat_artifacts_llm::TextGenerator) for single-shot and
//!   streamed turns.
//!
//! ```rust,no_run
//! use chat_artifacts::core::{AgentConfig, ArtifactStore, CodingAgent, MemoryStore};
//! use chat_artifacts_llm::ScriptedGenerator;
//! use std::sync::Arc;
//!
//! # async fn run() -> chat_artifacts::models::ChatResult<()> {
//! let generator = Arc::new(ScriptedGenerator::default().with_reply("```python\nprint(1)\n```"));
//! let agent = CodingAgent::new(
//!     generator,
//!     Arc::new(MemoryStore::default()),
//!     ArtifactStore::new(),
//!     AgentConfig::default(),
//! );
//!
//! let outcome = agent.respond("session-1", "print one").await?;
//! assert_eq!(outcome.artifacts[0].language, "python");
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod models;
pub mod utils;
