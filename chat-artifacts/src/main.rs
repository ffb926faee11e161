//! Replay a saved assistant reply through the streaming pipeline
//!
//! Usage: `chat-artifacts [TRANSCRIPT]`. Reads stdin when no path (or `-`)
//! is given and prints the extracted artifacts and session stats as JSON.

use anyhow::{Context, Result};
use futures::StreamExt;
use serde::Serialize;
use std::env;
use std::io::Read;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use chat_artifacts::core::{ArtifactStore, CodingAgent, MemoryStore, Settings};
use chat_artifacts::models::{Artifact, SessionStats};
use chat_artifacts_llm::ScriptedGenerator;

const REPLAY_PROMPT: &str = "Replay transcript";

#[derive(Serialize)]
struct ReplayReport {
    session_id: String,
    message_id: String,
    error: bool,
    artifacts: Vec<Artifact>,
    stats: SessionStats,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let settings = Settings::new()?;
    let transcript = read_transcript(env::args().nth(1))?;
    info!("Replaying transcript of {} bytes", transcript.len());

    let generator = Arc::new(ScriptedGenerator::new(settings.chunk_config()).with_reply(transcript));
    let agent = CodingAgent::new(
        generator,
        Arc::new(MemoryStore::new(settings.memory_store_config())),
        ArtifactStore::new(),
        settings.agent_config(),
    );

    let session_id = agent.memory().create_session();
    let mut chunks = agent.stream_response(&session_id, REPLAY_PROMPT);
    let mut last = None;
    while let Some(chunk) = chunks.next().await {
        if chunk.is_complete {
            last = Some(chunk);
        }
    }
    let last = last.context("stream ended without a completion event")?;
    if last.error {
        warn!("Replay ended with an error: {}", last.chunk);
    }

    let report = ReplayReport {
        session_id: session_id.clone(),
        message_id: last.message_id,
        error: last.error,
        artifacts: agent.session_artifacts(&session_id),
        stats: agent.session_stats(&session_id)?,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}

fn read_transcript(path: Option<String>) -> Result<String> {
    match path.as_deref() {
        None | Some("-") => {
            let mut transcript = String::new();
            std::io::stdin()
                .read_to_string(&mut transcript)
                .context("failed to read transcript from stdin")?;
            Ok(transcript)
        },
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read transcript from {path}")),
    }
}
