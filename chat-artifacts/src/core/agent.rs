//! Turn orchestration
//!
//! A turn records the user message, asks the generator for a reply, mines
//! the reply for fenced code, stores the resulting artifacts and records the
//! assistant message with references to them. The streaming variant does
//! the same incrementally: each artifact is extracted as soon as its closing
//! fence arrives.

use chat_artifacts_llm::{ChatTurn, GenerationError, GenerationRequest, TextGenerator};
use futures::stream::{Stream, StreamExt};
use std::pin::Pin;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::core::artifact_store::ArtifactStore;
use crate::core::memory_store::MemoryStore;
use crate::core::prompts::system_prompt;
use crate::models::{
    Artifact, ArtifactDownload, ChatResult, MemoryState, Message, MessageRole, SessionStats,
    StreamChunk,
};
use crate::utils::classifier::ArtifactClassifier;
use crate::utils::scanner::{RawBlock, StreamingScanner, scan};

pub type ChunkStream<'a> = Pin<Box<dyn Stream<Item = StreamChunk> + Send + 'a>>;

#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Number of prior messages sent to the generator
    pub history_window: usize,
    /// Replaces the built-in system prompt when set
    pub system_prompt: Option<String>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            history_window: 10,
            system_prompt: None,
        }
    }
}

/// Result of a single-shot turn
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub message: Message,
    pub artifacts: Vec<Artifact>,
}

enum Next {
    Fragment(String),
    Done,
    Failed(GenerationError),
}

#[derive(Clone)]
pub struct CodingAgent {
    generator: Arc<dyn TextGenerator>,
    memory: Arc<MemoryStore>,
    artifacts: ArtifactStore,
    classifier: ArtifactClassifier,
    config: AgentConfig,
}

impl CodingAgent {
    /// Build an agent over shared stores
    ///
    /// Installs an eviction hook on `memory` so that a session evicted for
    /// capacity takes its artifacts with it.
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        memory: Arc<MemoryStore>,
        artifacts: ArtifactStore,
        config: AgentConfig,
    ) -> Self {
        let evicted_artifacts = artifacts.clone();
        memory.set_eviction_hook(Arc::new(move |session_id: &str| {
            let removed = evicted_artifacts.remove_session(session_id);
            debug!("Evicted session {} took {} artifacts", session_id, removed);
        }));

        Self {
            generator,
            memory,
            artifacts,
            classifier: ArtifactClassifier::new(),
            config,
        }
    }

    pub fn memory(&self) -> &MemoryStore {
        &self.memory
    }

    pub fn artifacts(&self) -> &ArtifactStore {
        &self.artifacts
    }

    /// Run one turn and return the recorded assistant message
    ///
    /// A generator failure is still recorded as an assistant message
    /// flagged `incomplete`, then returned as `ChatError::Generation`.
    pub async fn respond(&self, session_id: &str, prompt: &str) -> ChatResult<TurnOutcome> {
        let request = self.begin_turn(session_id, prompt);
        let message_id = Uuid::new_v4().to_string();

        match self.generator.generate(&request).await {
            Ok(text) => {
                let artifacts = self.store_blocks(scan(&text), session_id, &message_id);
                let message = Message::with_id(message_id, MessageRole::Assistant, text)
                    .with_artifacts(artifacts.iter().map(|a| a.id.clone()).collect());
                self.memory.append(session_id, message.clone());

                Ok(TurnOutcome { message, artifacts })
            },
            Err(err) => {
                error!("Generation failed for session {}: {}", session_id, err);
                let message = failed_message(message_id, String::new(), Vec::new(), &err);
                self.memory.append(session_id, message);
                Err(err.into())
            },
        }
    }

    pub fn stream_response(&self, session_id: &str, prompt: &str) -> ChunkStream<'_> {
        self.stream_response_with_cancel(session_id, prompt, CancellationToken::new())
    }

    /// Stream one turn as [`StreamChunk`] events
    ///
    /// The stream never fails. Every event but the last carries a fragment of
    /// the reply and the artifacts closed by it. The last event has
    /// `is_complete` set and lists every artifact of the turn; on failure or
    /// cancellation it also has `error` set and its chunk describes the cause.
    /// Artifacts closed before the failure are kept. Dropping the stream
    /// before it ends records the partial reply as a cancelled turn.
    pub fn stream_response_with_cancel(
        &self,
        session_id: &str,
        prompt: &str,
        cancel: CancellationToken,
    ) -> ChunkStream<'_> {
        let session_id = session_id.to_string();
        let prompt = prompt.to_string();

        let stream = async_stream::stream! {
            let request = self.begin_turn(&session_id, &prompt);
            let mut turn = StreamedTurn::new(&self.memory, &session_id, Uuid::new_v4().to_string());
            let mut failure = None;

            let opened = tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(GenerationError::cancelled()),
                result = self.generator.generate_streaming(&request) => result,
            };

            match opened {
                Ok(mut fragments) => loop {
                    let next = tokio::select! {
                        biased;
                        _ = cancel.cancelled() => Next::Failed(GenerationError::cancelled()),
                        item = fragments.next() => match item {
                            Some(Ok(fragment)) => Next::Fragment(fragment),
                            Some(Err(err)) => Next::Failed(err),
                            None => Next::Done,
                        },
                    };

                    match next {
                        Next::Fragment(fragment) => {
                            let closed = turn.scanner.push(&fragment);
                            let fresh: Vec<String> = self
                                .store_blocks(closed, &session_id, &turn.message_id)
                                .into_iter()
                                .map(|a| a.id)
                                .collect();
                            turn.artifact_ids.extend(fresh.iter().cloned());
                            yield StreamChunk::fragment(fragment, &turn.message_id, &session_id, fresh);
                        },
                        Next::Done => break,
                        Next::Failed(err) => {
                            failure = Some(err);
                            break;
                        },
                    }
                },
                Err(err) => failure = Some(err),
            }

            let tail = turn.scanner.finish();
            let tail_ids: Vec<String> = self
                .store_blocks(tail, &session_id, &turn.message_id)
                .into_iter()
                .map(|a| a.id)
                .collect();
            turn.artifact_ids.extend(tail_ids);

            match failure {
                None => {
                    turn.record(None);
                    debug!("Streamed turn {} complete", turn.message_id);

                    yield StreamChunk::complete("", &turn.message_id, &session_id, turn.artifact_ids.clone(), false);
                },
                Some(err) => {
                    warn!("Streamed turn {} ended early: {}", turn.message_id, err);
                    turn.record(Some(&err));

                    let notice = format!("Error: {}", err.cause());
                    yield StreamChunk::complete(notice, &turn.message_id, &session_id, turn.artifact_ids.clone(), true);
                },
            }
        };

        Box::pin(stream)
    }

    pub fn get_artifact(&self, artifact_id: &str) -> ChatResult<Artifact> {
        self.artifacts.get(artifact_id)
    }

    pub fn session_artifacts(&self, session_id: &str) -> Vec<Artifact> {
        self.artifacts.list_by_session(session_id)
    }

    pub fn download_artifact(&self, artifact_id: &str) -> ChatResult<ArtifactDownload> {
        Ok(self.artifacts.get(artifact_id)?.download())
    }

    pub fn history(&self, session_id: &str, limit: Option<usize>) -> Vec<Message> {
        self.memory.history(session_id, limit)
    }

    pub fn memory_state(&self, session_id: &str) -> ChatResult<MemoryState> {
        self.memory.memory_state(session_id)
    }

    pub fn session_stats(&self, session_id: &str) -> ChatResult<SessionStats> {
        let conversation = self.memory.session_stats(session_id)?;
        Ok(SessionStats {
            conversation,
            artifacts: self.artifacts.stats_for_session(session_id),
        })
    }

    /// Forget the messages of a session; its artifacts stay downloadable
    pub fn clear_session(&self, session_id: &str) -> bool {
        self.memory.clear(session_id)
    }

    /// Drop a session together with its artifacts
    pub fn delete_session(&self, session_id: &str) -> bool {
        let removed = self.memory.delete(session_id);
        let artifacts = self.artifacts.remove_session(session_id);
        if artifacts > 0 {
            info!("Dropped {} artifacts with session {}", artifacts, session_id);
        }
        removed
    }

    /// Record the user message and build the generator request
    ///
    /// History is read before the new message is appended, so the prompt is
    /// not repeated in it.
    fn begin_turn(&self, session_id: &str, prompt: &str) -> GenerationRequest {
        self.memory.get_or_create(session_id);
        let history = self
            .memory
            .history(session_id, Some(self.config.history_window));
        self.memory.append(session_id, Message::user(prompt));

        GenerationRequest::new(prompt)
            .with_history(to_turns(&history))
            .with_system(system_prompt(self.config.system_prompt.as_deref()))
    }

    fn store_blocks(&self, blocks: Vec<RawBlock>, session_id: &str, message_id: &str) -> Vec<Artifact> {
        let mut stored = Vec::with_capacity(blocks.len());

        for block in blocks {
            match self.classifier.classify(&block, session_id, message_id) {
                Ok(artifact) => {
                    info!(
                        "Extracted {} artifact '{}' ({})",
                        artifact.kind, artifact.title, artifact.id
                    );
                    self.artifacts.put(artifact.clone());
                    stored.push(artifact);
                },
                Err(err) => warn!("Skipping code block: {}", err),
            }
        }

        stored
    }
}

/// Turn state of a streamed reply
///
/// Records the assistant message exactly once. A turn dropped before
/// [`StreamedTurn::record`] runs, for instance because the consumer stopped
/// polling, is recorded as cancelled with whatever text had arrived.
struct StreamedTurn<'a> {
    memory: &'a MemoryStore,
    session_id: String,
    message_id: String,
    scanner: StreamingScanner,
    artifact_ids: Vec<String>,
    recorded: bool,
}

impl<'a> StreamedTurn<'a> {
    fn new(memory: &'a MemoryStore, session_id: &str, message_id: String) -> Self {
        Self {
            memory,
            session_id: session_id.to_string(),
            message_id,
            scanner: StreamingScanner::new(),
            artifact_ids: Vec::new(),
            recorded: false,
        }
    }

    fn record(&mut self, failure: Option<&GenerationError>) {
        if std::mem::replace(&mut self.recorded, true) {
            return;
        }

        let content = self.scanner.buffer().to_string();
        let message = match failure {
            None => Message::with_id(self.message_id.clone(), MessageRole::Assistant, content)
                .with_artifacts(self.artifact_ids.clone()),
            Some(err) => failed_message(self.message_id.clone(), content, self.artifact_ids.clone(), err),
        };
        self.memory.append(&self.session_id, message);
    }
}

impl Drop for StreamedTurn<'_> {
    fn drop(&mut self) {
        if !self.recorded {
            warn!("Streamed turn {} dropped before completion", self.message_id);
            self.record(Some(&GenerationError::cancelled()));
        }
    }
}

/// Generator view of stored history; system messages are not replayed
fn to_turns(history: &[Message]) -> Vec<ChatTurn> {
    history
        .iter()
        .filter_map(|message| match message.role {
            MessageRole::User => Some(ChatTurn::user(message.content.clone())),
            MessageRole::Assistant => Some(ChatTurn::model(message.content.clone())),
            MessageRole::System => None,
        })
        .collect()
}

fn failed_message(
    message_id: String,
    content: String,
    artifact_ids: Vec<String>,
    err: &GenerationError,
) -> Message {
    let content = if content.is_empty() {
        format!("Error: {}", err.cause())
    } else {
        content
    };

    Message::with_id(message_id, MessageRole::Assistant, content)
        .with_artifacts(artifact_ids)
        .with_metadata("incomplete", true)
        .with_metadata("error", err.cause())
}
