//! The text generator seam
//!
//! Implementations wrap a concrete model client. The conversation core only
//! ever sees this trait.

use crate::{errors::Result, types::GenerationRequest};
use async_trait::async_trait;
use futures::stream::Stream;
use std::pin::Pin;

/// A finite, non-restartable stream of reply fragments
///
/// An `Err` item is terminal: callers stop polling after the first error.
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<String>> + Send + 'static>>;

/// Text generator trait
///
/// Implementations must be thread-safe (Send + Sync) as one generator is
/// shared by every session of the host process.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Produce the complete reply in one call
    async fn generate(&self, request: &GenerationRequest) -> Result<String>;

    /// Produce the reply as incremental fragments
    async fn generate_streaming(&self, request: &GenerationRequest) -> Result<FragmentStream>;
}
