//! In-memory scripted generator for tests and transcript replay

use crate::{
    chunker::{ChunkConfig, split_text_into_chunks},
    errors::{GenerationError, Result},
    generator::{FragmentStream, TextGenerator},
    types::GenerationRequest,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::time::Duration;
use tracing::debug;

/// One canned outcome of a generation call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptedReply {
    /// Reply with this text
    Text(String),
    /// Fail before producing anything
    Fail(String),
    /// Stream `text`, then fail with `cause`
    Interrupted {
        /// Text delivered before the failure
        text: String,
        /// Failure cause
        cause: String,
    },
}

/// A generator that replays queued replies in order
///
/// Each call to `generate` or `generate_streaming` consumes one reply. When
/// the queue is empty the generator either echoes the prompt (see
/// [`ScriptedGenerator::echo`]) or fails.
#[derive(Default)]
pub struct ScriptedGenerator {
    replies: Mutex<VecDeque<ScriptedReply>>,
    requests: Mutex<Vec<GenerationRequest>>,
    chunk_config: ChunkConfig,
    echo: bool,
}

impl ScriptedGenerator {
    /// Create a generator streaming with the given chunk configuration
    pub fn new(chunk_config: ChunkConfig) -> Self {
        Self {
            chunk_config,
            ..Default::default()
        }
    }

    /// Create a generator that answers every prompt with the prompt itself
    pub fn echo() -> Self {
        Self {
            echo: true,
            ..Default::default()
        }
    }

    /// Queue a successful reply
    pub fn with_reply(self, text: impl Into<String>) -> Self {
        self.push(ScriptedReply::Text(text.into()));
        self
    }

    /// Queue an arbitrary scripted outcome
    pub fn with_outcome(self, reply: ScriptedReply) -> Self {
        self.push(reply);
        self
    }

    /// Queue a reply on a shared generator
    pub fn push(&self, reply: ScriptedReply) {
        self.replies.lock().push_back(reply);
    }

    /// Requests received so far, oldest first
    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().clone()
    }

    fn next_reply(&self, request: &GenerationRequest) -> ScriptedReply {
        self.requests.lock().push(request.clone());

        match self.replies.lock().pop_front() {
            Some(reply) => reply,
            None if self.echo => ScriptedReply::Text(request.prompt.clone()),
            None => ScriptedReply::Fail("no scripted reply left".to_string()),
        }
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        match self.next_reply(request) {
            ScriptedReply::Text(text) => Ok(text),
            ScriptedReply::Fail(cause) | ScriptedReply::Interrupted { cause, .. } => {
                Err(GenerationError::new(cause))
            },
        }
    }

    async fn generate_streaming(&self, request: &GenerationRequest) -> Result<FragmentStream> {
        let (text, failure) = match self.next_reply(request) {
            ScriptedReply::Text(text) => (text, None),
            ScriptedReply::Fail(cause) => return Err(GenerationError::new(cause)),
            ScriptedReply::Interrupted { text, cause } => (text, Some(GenerationError::new(cause))),
        };

        let chunks = split_text_into_chunks(&text, &self.chunk_config);
        let delay = Duration::from_millis(self.chunk_config.chunk_delay_ms);
        debug!("Scripted reply split into {} fragments", chunks.len());

        let stream = async_stream::stream! {
            for chunk in chunks {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                yield Ok(chunk);
            }
            if let Some(err) = failure {
                yield Err(err);
            }
        };

        Ok(Box::pin(stream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn test_generate_consumes_replies_in_order() {
        let generator = ScriptedGenerator::default()
            .with_reply("first")
            .with_reply("second");

        let request = GenerationRequest::new("hi");
        assert_eq!(generator.generate(&request).await.unwrap(), "first");
        assert_eq!(generator.generate(&request).await.unwrap(), "second");
        assert!(generator.generate(&request).await.is_err());
        assert_eq!(generator.requests().len(), 3);
    }

    #[tokio::test]
    async fn test_echo_replies_with_prompt() {
        let generator = ScriptedGenerator::echo();
        let reply = generator
            .generate(&GenerationRequest::new("ping"))
            .await
            .unwrap();
        assert_eq!(reply, "ping");
    }

    #[tokio::test]
    async fn test_interrupted_stream_ends_with_error() {
        let generator = ScriptedGenerator::default().with_outcome(ScriptedReply::Interrupted {
            text: "partial answer".to_string(),
            cause: "connection reset".to_string(),
        });

        let mut stream = generator
            .generate_streaming(&GenerationRequest::new("hi"))
            .await
            .unwrap();

        let mut text = String::new();
        let mut failure = None;
        while let Some(item) = stream.next().await {
            match item {
                Ok(fragment) => text.push_str(&fragment),
                Err(err) => failure = Some(err),
            }
        }

        assert_eq!(text, "partial answer");
        assert_eq!(failure.unwrap().cause(), "connection reset");
    }
}
