pub mod artifact;
pub mod chat;
pub mod error;
pub mod stats;

pub use artifact::{Artifact, ArtifactDownload, ArtifactKind, ArtifactMetadata, Provenance};
pub use chat::{Message, MessageRole, StreamChunk};
pub use error::{ChatError, ChatResult};
pub use stats::{ArtifactStats, ConversationStats, MemoryState, SessionMetadata, SessionStats};
