//! Whole-text summarization. Unlike rewriting, every failure propagates.

use tracing::debug;

use crate::client::{ClientConfig, CompletionBackend};
use crate::level::CefrLevel;
use crate::prompt::{SummaryLength, summary_request};
use crate::{GradedError, Result};

/// Configuration for summarization
#[derive(Debug, Clone)]
pub struct SummaryConfig {
    /// Inputs longer than this (in chars) get a 500-600 word summary
    pub long_form_threshold: usize,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self { long_form_threshold: 3000 }
    }
}

/// Summarize `text` for `level` with a single request.
///
/// # Errors
///
/// Any backend error, wrapped in [`GradedError::Summarize`]. An empty model
/// answer is reported as [`GradedError::EmptyCompletion`] inside it.
pub async fn summarize_text<B: CompletionBackend>(
    backend: &B, text: &str, level: CefrLevel, config: &SummaryConfig, client: &ClientConfig,
) -> Result<String> {
    let length = SummaryLength::for_input(text.chars().count(), config.long_form_threshold);
    debug!(?length, %level, "requesting summary");

    let request = summary_request(text, level, length, client.summary_max_tokens, client.summary_temperature);
    let summary = backend.complete(&request).await.map_err(GradedError::summarize)?;

    if summary.trim().is_empty() {
        return Err(GradedError::summarize(GradedError::EmptyCompletion));
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::CompletionRequest;

    struct Fixed(&'static str);

    impl CompletionBackend for Fixed {
        async fn complete(&self, _request: &CompletionRequest) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    struct Down;

    impl CompletionBackend for Down {
        async fn complete(&self, _request: &CompletionRequest) -> Result<String> {
            Err(GradedError::Api { status: 503, message: "unavailable".to_string() })
        }
    }

    #[tokio::test]
    async fn test_summary_returned() {
        let summary = summarize_text(
            &Fixed("A short summary."),
            "Some text.",
            CefrLevel::B1,
            &SummaryConfig::default(),
            &ClientConfig::default(),
        )
        .await
        .unwrap();
        assert_eq!(summary, "A short summary.");
    }

    #[tokio::test]
    async fn test_failure_propagates_with_context() {
        let err = summarize_text(&Down, "Some text.", CefrLevel::B1, &SummaryConfig::default(), &ClientConfig::default())
            .await
            .unwrap_err();
        assert!(err.to_string().starts_with("Summarization failed"));
        assert!(err.to_string().contains("503"));
    }

    #[tokio::test]
    async fn test_blank_summary_is_an_error() {
        let err =
            summarize_text(&Fixed("  "), "Some text.", CefrLevel::A1, &SummaryConfig::default(), &ClientConfig::default())
                .await
                .unwrap_err();
        match err {
            GradedError::Summarize(inner) => assert!(matches!(*inner, GradedError::EmptyCompletion)),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
