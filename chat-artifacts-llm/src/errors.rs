//! Error type for text generation
//!
//! Generation has a single failure kind. The cause is kept as a plain string
//! so that callers can record it in conversation history verbatim.

use thiserror::Error;

/// A terminal failure of one generation turn
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Generation failed: {cause}")]
pub struct GenerationError {
    cause: String,
}

impl GenerationError {
    /// Create an error with a human-readable cause
    pub fn new(cause: impl Into<String>) -> Self {
        Self {
            cause: cause.into(),
        }
    }

    /// Error used when the caller cancels an in-flight stream
    pub fn cancelled() -> Self {
        Self::new("generation cancelled")
    }

    /// The human-readable cause
    pub fn cause(&self) -> &str {
        &self.cause
    }
}

/// Result type for generator operations
pub type Result<T> = std::result::Result<T, GenerationError>;
