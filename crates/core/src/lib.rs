pub mod chunk;
pub mod client;
pub mod dom;
pub mod error;
pub mod export;
pub mod extract;
pub mod fetch;
pub mod level;
pub mod message;
pub mod parse;
pub mod patch;
pub mod prompt;
pub mod rewrite;
pub mod session;
pub mod snapshot;
pub mod summarize;

pub use chunk::{Chunk, ChunkConfig, chunk_text, sentences};
pub use client::{ClientConfig, CompletionBackend, CompletionRequest, Connector, OpenAiClient};
pub use dom::{HtmlPage, PageDom};
pub use error::{GradedError, Result};
pub use export::{
    Artifact, DirectorySink, DownloadSink, ExportConfig, ExportFormat, MemorySink, PageMeta, build_artifact,
    render_summary, sanitize_file_stem,
};
pub use extract::{ContentSource, ExtractConfig, ExtractedText, extract_main_text};
pub use fetch::FetchConfig;
pub use fetch::{fetch_file, fetch_stdin, fetch_url};
pub use level::CefrLevel;
pub use message::{Command, Response};
pub use parse::Document;
pub use patch::{ApplyReport, PatchConfig, RestoreReport, TEXT_SELECTOR};
pub use patch::{apply, capture, restore, split_paragraphs};
pub use prompt::SummaryLength;
pub use rewrite::{ChunkOutcome, RewriteConfig, RewrittenText, rewrite_text};
pub use session::{RewriteOutcome, Session, SessionConfig, SessionConfigBuilder, SummaryOutcome};
pub use snapshot::{PageSnapshot, SnapshotEntry};
pub use summarize::{SummaryConfig, summarize_text};
