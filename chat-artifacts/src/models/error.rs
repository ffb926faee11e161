use chat_artifacts_llm::GenerationError;

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    /// The operation needs an existing session and there is none
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Artifact not found: {0}")]
    ArtifactNotFound(String),

    /// The generator failed; never retried inside the core
    #[error(transparent)]
    Generation(#[from] GenerationError),

    /// Scanning or classification rejected a block
    #[error("Artifact extraction failed: {0}")]
    Extraction(String),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid settings: {0}")]
    InvalidSettings(String),
}

pub type ChatResult<T> = Result<T, ChatError>;
