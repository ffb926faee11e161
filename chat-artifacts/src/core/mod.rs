pub mod agent;
pub mod artifact_store;
pub mod clock;
pub mod config;
pub mod conversation;
pub mod memory_store;
pub mod prompts;

pub use agent::{AgentConfig, ChunkStream, CodingAgent, TurnOutcome};
pub use artifact_store::ArtifactStore;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Settings;
pub use conversation::ConversationMemory;
pub use memory_store::{MemoryStore, MemoryStoreConfig, SharedConversation};
