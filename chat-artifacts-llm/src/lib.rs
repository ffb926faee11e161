//! # Text generator contract for chat-artifacts
//!
//! The conversation core treats the language model as an opaque text
//! generator. This crate defines that seam and ships a scripted, in-memory
//! implementation used by tests and by the replay binary.
//!
//! ## Features
//!
//! - **Single-shot generation**: `TextGenerator::generate` returns the full reply
//! - **Streaming generation**: `TextGenerator::generate_streaming` yields a finite,
//!   non-restartable stream of text fragments
//! - **One error kind**: every failure surfaces as `GenerationError` with a
//!   human-readable cause
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use chat_artifacts_llm::{GenerationRequest, ScriptedGenerator, TextGenerator};
//! use futures::StreamExt;
//!
//! #[tokio::main]
//! async fn main() -> chat_artifacts_llm::Result<()> {
//!     let generator = ScriptedGenerator::default().with_reply("Hello there");
//!     let request = GenerationRequest::new("Hi");
//!
//!     let mut fragments = generator.generate_streaming(&request).await?;
//!     while let Some(fragment) = fragments.next().await {
//!         print!("{}", fragment?);
//!     }
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod chunker;
mod errors;
mod generator;
mod scripted;
mod types;

pub use chunker::{ChunkConfig, split_text_into_chunks};
pub use errors::{GenerationError, Result};
pub use generator::{FragmentStream, TextGenerator};
pub use scripted::{ScriptedGenerator, ScriptedReply};
pub use types::{ChatTurn, GenerationRequest, TurnRole};
