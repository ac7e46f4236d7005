//! One page interaction: the page, its snapshot, and the three commands.
//!
//! A [`Session`] owns the page for as long as the page is "loaded". The
//! first rewrite captures a snapshot of the untouched page; later rewrites
//! reuse it, and reset restores from it and drops it.
//!
//! # Example
//!
//! ```rust,no_run
//! use graded_core::{CefrLevel, ClientConfig, Command, DirectorySink, HtmlPage, Session, SessionConfig};
//!
//! # async fn run() -> graded_core::Result<()> {
//! let page = HtmlPage::parse("<html><body><article>...</article></body></html>", None)?;
//! let config = SessionConfig::default();
//! let mut session = Session::new(page, config.client.clone(), DirectorySink::downloads(), config);
//!
//! let response = session
//!     .handle(Command::RewritePage { api_key: "sk-...".into(), target_level: CefrLevel::B1 })
//!     .await;
//! assert!(response.success);
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use tracing::{info, instrument, warn};

use crate::client::{ClientConfig, Connector};
use crate::dom::PageDom;
use crate::export::{DownloadSink, ExportConfig, ExportFormat, PageMeta, build_artifact};
use crate::extract::{ExtractConfig, ExtractedText, extract_main_text};
use crate::level::CefrLevel;
use crate::message::{Command, Response};
use crate::patch::{self, ApplyReport, PatchConfig, RestoreReport};
use crate::rewrite::{RewriteConfig, rewrite_text};
use crate::snapshot::PageSnapshot;
use crate::summarize::{SummaryConfig, summarize_text};
use crate::{GradedError, Result};

/// Configuration for every stage of a session.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use graded_core::SessionConfig;
///
/// let config = SessionConfig::builder()
///     .model("gpt-4o")
///     .max_concurrent_requests(2)
///     .fade_duration(Duration::ZERO)
///     .build();
/// assert_eq!(config.client.model, "gpt-4o");
/// ```
#[derive(Debug, Clone, Default)]
pub struct SessionConfig {
    pub extract: ExtractConfig,
    pub rewrite: RewriteConfig,
    pub summary: SummaryConfig,
    pub client: ClientConfig,
    pub patch: PatchConfig,
    pub export: ExportConfig,
}

impl SessionConfig {
    pub fn builder() -> SessionConfigBuilder {
        SessionConfigBuilder::new()
    }
}

/// Builder for SessionConfig.
pub struct SessionConfigBuilder {
    config: SessionConfig,
}

impl SessionConfigBuilder {
    /// Creates a new builder with default values.
    pub fn new() -> Self {
        Self { config: SessionConfig::default() }
    }

    /// Sets the chat-completions endpoint URL.
    pub fn endpoint(mut self, value: impl Into<String>) -> Self {
        self.config.client.endpoint = value.into();
        self
    }

    /// Sets the model identifier.
    pub fn model(mut self, value: impl Into<String>) -> Self {
        self.config.client.model = value.into();
        self
    }

    /// Sets the HTTP timeout in seconds.
    pub fn timeout(mut self, value: u64) -> Self {
        self.config.client.timeout = value;
        self
    }

    /// Sets how many chunk requests may be in flight at once.
    pub fn max_concurrent_requests(mut self, value: usize) -> Self {
        self.config.rewrite.max_concurrent_requests = value.max(1);
        self
    }

    /// Sets how many sentences go into one chunk.
    pub fn sentences_per_chunk(mut self, value: usize) -> Self {
        self.config.rewrite.chunk.sentences_per_chunk = value.max(1);
        self
    }

    /// Sets the maximum extracted text length in characters.
    pub fn max_text_len(mut self, value: usize) -> Self {
        self.config.extract.max_len = value;
        self
    }

    /// Sets the input length above which summaries are long-form.
    pub fn long_form_threshold(mut self, value: usize) -> Self {
        self.config.summary.long_form_threshold = value;
        self
    }

    /// Sets how long the page stays dimmed before a swap.
    pub fn fade_duration(mut self, value: Duration) -> Self {
        self.config.patch.fade_duration = value;
        self
    }

    /// Sets the summary export format.
    pub fn export_format(mut self, value: ExportFormat) -> Self {
        self.config.export.format = value;
        self
    }

    /// Builds the config.
    pub fn build(self) -> SessionConfig {
        self.config
    }
}

impl Default for SessionConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of a successful rewrite
#[derive(Debug, Clone)]
pub struct RewriteOutcome {
    /// Extracted text length in characters
    pub original_length: usize,
    /// Rewritten text length in characters
    pub new_length: usize,
    pub rewritten_chunks: usize,
    pub fallback_chunks: usize,
    pub report: ApplyReport,
}

/// Result of a successful summary
#[derive(Debug, Clone)]
pub struct SummaryOutcome {
    pub summary: String,
    /// Summary length in characters
    pub summary_length: usize,
    /// Where the download sink put the file
    pub saved_to: String,
}

/// A page plus everything needed to rewrite, summarize and reset it.
pub struct Session<P: PageDom, C, S> {
    page: P,
    connector: C,
    sink: S,
    config: SessionConfig,
    snapshot: Option<PageSnapshot<P::Handle>>,
}

impl<P, C, S> Session<P, C, S>
where
    P: PageDom,
    C: Connector,
    S: DownloadSink,
{
    pub fn new(page: P, connector: C, sink: S, config: SessionConfig) -> Self {
        Self { page, connector, sink, config, snapshot: None }
    }

    pub fn page(&self) -> &P {
        &self.page
    }

    pub fn into_page(self) -> P {
        self.page
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Whether a rewrite snapshot is held.
    pub fn is_rewritten(&self) -> bool {
        self.snapshot.is_some()
    }

    pub fn snapshot(&self) -> Option<&PageSnapshot<P::Handle>> {
        self.snapshot.as_ref()
    }

    fn extract(&self) -> Result<ExtractedText> {
        let extracted = extract_main_text(&self.page.markup(), &self.config.extract)?;
        if extracted.text.trim().is_empty() {
            return Err(GradedError::NoContent);
        }
        Ok(extracted)
    }

    /// Rewrite the page's text for `level`.
    ///
    /// Chunk failures fall back to the original text, so once text has been
    /// extracted this only fails on page mutation errors.
    #[instrument(skip_all, fields(level = %level))]
    pub async fn rewrite_page(&mut self, api_key: &str, level: CefrLevel) -> Result<RewriteOutcome> {
        let backend = self.connector.connect(api_key)?;
        let extracted = self.extract()?;

        let snapshot = match self.snapshot.take() {
            Some(snapshot) => snapshot,
            None => patch::capture(&self.page, &self.config.patch)?,
        };
        let snapshot = &*self.snapshot.insert(snapshot);

        let rewritten =
            rewrite_text(&backend, &extracted.text, level, &self.config.rewrite, &self.config.client).await;
        let new_text = rewritten.text();
        let paragraphs = patch::split_paragraphs(&new_text);

        patch::fade_out(&mut self.page, &self.config.patch).await;
        let applied = patch::apply(&mut self.page, snapshot, &paragraphs, &self.config.patch);
        patch::fade_in(&mut self.page);
        let report = applied?;

        let outcome = RewriteOutcome {
            original_length: extracted.char_len(),
            new_length: new_text.chars().count(),
            rewritten_chunks: rewritten.rewritten_count(),
            fallback_chunks: rewritten.fallback_count(),
            report,
        };
        info!(
            original = outcome.original_length,
            new = outcome.new_length,
            fallbacks = outcome.fallback_chunks,
            updated = report.updated,
            "page rewritten"
        );
        Ok(outcome)
    }

    /// Summarize the page for `level` and hand the rendered file to the sink.
    ///
    /// Nothing is saved unless the summary succeeded.
    #[instrument(skip_all, fields(level = %level))]
    pub async fn summarize_page(&mut self, api_key: &str, level: CefrLevel) -> Result<SummaryOutcome> {
        let backend = self.connector.connect(api_key)?;
        let extracted = self.extract()?;

        let summary =
            summarize_text(&backend, &extracted.text, level, &self.config.summary, &self.config.client).await?;

        let meta = PageMeta { title: self.page.title(), url: self.page.url().map(str::to_string) };
        let artifact = build_artifact(&summary, level, &meta, &self.config.export);
        let saved_to = self.sink.save(&artifact)?;

        let summary_length = summary.chars().count();
        info!(summary_length, saved_to = %saved_to, "page summarized");
        Ok(SummaryOutcome { summary, summary_length, saved_to })
    }

    /// Restore the captured markup. Returns `None` when nothing was rewritten.
    #[instrument(skip_all)]
    pub async fn reset_page(&mut self) -> Result<Option<RestoreReport>> {
        let Some(snapshot) = self.snapshot.take() else {
            return Ok(None);
        };

        patch::fade_out(&mut self.page, &self.config.patch).await;
        let restored = patch::restore(&mut self.page, &snapshot);
        patch::fade_in(&mut self.page);
        let report = restored?;

        if report.stale > 0 {
            warn!(stale = report.stale, "some captured elements were no longer attached");
        }
        info!(restored = report.restored, "page reset");
        Ok(Some(report))
    }

    /// Run one command. Never fails: errors become failure responses.
    pub async fn handle(&mut self, command: Command) -> Response {
        let result = match command {
            Command::RewritePage { api_key, target_level } => self
                .rewrite_page(&api_key, target_level)
                .await
                .map(|o| Response::rewritten(o.original_length, o.new_length)),
            Command::SummarizePage { api_key, target_level } => self
                .summarize_page(&api_key, target_level)
                .await
                .map(|o| Response::summarized(o.summary_length)),
            Command::ResetPage => self.reset_page().await.map(|_| Response::reset()),
        };

        result.unwrap_or_else(|err| {
            warn!(error = %err, "command failed");
            Response::failure(err.to_string())
        })
    }
}

impl<P, S> Session<P, ClientConfig, S>
where
    P: PageDom,
    S: DownloadSink,
{
    /// A session that talks to the endpoint configured in `config.client`.
    pub fn with_config(page: P, sink: S, config: SessionConfig) -> Self {
        Self::new(page, config.client.clone(), sink, config)
    }
}
