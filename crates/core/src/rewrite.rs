//! Chunk-by-chunk rewriting with per-chunk fallback.
//!
//! Rewriting never fails: a chunk whose request errors (or comes back
//! empty) keeps its original text. Requests may overlap, but outcomes are
//! always reassembled in chunk order.

use futures::StreamExt;
use futures::stream;
use tracing::{debug, warn};

use crate::chunk::{Chunk, ChunkConfig, chunk_text};
use crate::client::{ClientConfig, CompletionBackend};
use crate::level::CefrLevel;
use crate::prompt::rewrite_request;

/// Configuration for rewriting
#[derive(Debug, Clone)]
pub struct RewriteConfig {
    pub chunk: ChunkConfig,
    /// Maximum chunk requests in flight at once (at least 1)
    pub max_concurrent_requests: usize,
}

impl Default for RewriteConfig {
    fn default() -> Self {
        Self { chunk: ChunkConfig::default(), max_concurrent_requests: 4 }
    }
}

/// What happened to one chunk
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkOutcome {
    /// The model's rewrite
    Rewritten(String),
    /// Too short to send; original text
    PassThrough(String),
    /// The request failed; original text
    Fallback(String),
}

impl ChunkOutcome {
    pub fn text(&self) -> &str {
        match self {
            ChunkOutcome::Rewritten(t) | ChunkOutcome::PassThrough(t) | ChunkOutcome::Fallback(t) => t,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, ChunkOutcome::Fallback(_))
    }
}

/// The reassembled rewrite of a whole text
#[derive(Debug, Clone)]
pub struct RewrittenText {
    /// Chunk outcomes in chunk order
    pub outcomes: Vec<ChunkOutcome>,
}

impl RewrittenText {
    /// Outcome texts joined with a single space, in chunk order.
    pub fn text(&self) -> String {
        self.outcomes.iter().map(ChunkOutcome::text).collect::<Vec<_>>().join(" ")
    }

    pub fn rewritten_count(&self) -> usize {
        self.outcomes.iter().filter(|o| matches!(o, ChunkOutcome::Rewritten(_))).count()
    }

    pub fn fallback_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_fallback()).count()
    }
}

/// Rewrite a single chunk, collapsing any failure to the original text.
pub async fn rewrite_chunk<B: CompletionBackend>(
    backend: &B, chunk: &Chunk, level: CefrLevel, client: &ClientConfig,
) -> ChunkOutcome {
    if !chunk.needs_processing() {
        return ChunkOutcome::PassThrough(chunk.text.clone());
    }

    let request = rewrite_request(&chunk.text, level, client.rewrite_max_tokens, client.rewrite_temperature);
    match backend.complete(&request).await {
        Ok(text) => ChunkOutcome::Rewritten(text),
        Err(err) => {
            warn!(chunk = chunk.index, error = %err, "chunk rewrite failed, keeping original text");
            ChunkOutcome::Fallback(chunk.text.clone())
        }
    }
}

/// Rewrite `text` for `level`, chunk by chunk.
pub async fn rewrite_text<B: CompletionBackend>(
    backend: &B, text: &str, level: CefrLevel, config: &RewriteConfig, client: &ClientConfig,
) -> RewrittenText {
    let chunks: Vec<Chunk> = chunk_text(text, &config.chunk).collect();
    debug!(
        chunks = chunks.len(),
        substantial = chunks.iter().filter(|c| c.needs_processing()).count(),
        "rewriting text"
    );

    let outcomes = stream::iter(chunks.iter().map(|chunk| rewrite_chunk(backend, chunk, level, client)))
        .buffered(config.max_concurrent_requests.max(1))
        .collect::<Vec<_>>()
        .await;

    RewrittenText { outcomes }
}
