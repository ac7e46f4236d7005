//! Error types for graded operations.
//!
//! This module defines the main error type [`GradedError`] which represents
//! everything that can go wrong while extracting page text, talking to the
//! completion API, patching the page, or exporting a summary.
//!
//! Rewriting never surfaces API errors to the caller (each chunk falls back
//! to its original text), so most variants here reach users only through
//! the summarize path or through page loading.
//!
//! # Example
//!
//! ```rust
//! use graded_core::{GradedError, Result};
//!
//! fn require_text(text: &str) -> Result<&str> {
//!     if text.trim().is_empty() {
//!         return Err(GradedError::NoContent);
//!     }
//!     Ok(text)
//! }
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for graded operations.
#[derive(Error, Debug)]
pub enum GradedError {
    /// HTTP transport errors from reqwest.
    ///
    /// DNS failures, refused connections, TLS problems and the like.
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Request timeout.
    #[error("Request timed out after {timeout} seconds")]
    Timeout { timeout: u64 },

    /// The completion API answered with a non-success status.
    #[error("API request failed with status {status}: {message}")]
    Api { status: u16, message: String },

    /// The completion API answered 2xx but the body was not the expected shape.
    #[error("Malformed API response: {0}")]
    MalformedResponse(String),

    /// The model returned no text.
    #[error("The model returned an empty response")]
    EmptyCompletion,

    /// No credential was supplied with the command.
    #[error("API key is required")]
    MissingApiKey,

    /// Summarization failed; wraps the underlying cause.
    #[error("Summarization failed: {0}")]
    Summarize(Box<GradedError>),

    /// Invalid URL provided.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// HTML parsing or selector errors.
    #[error("Failed to parse HTML: {0}")]
    HtmlParseError(String),

    /// Unknown CEFR level name.
    #[error("Invalid CEFR level: {0} (expected one of A1, A2, B1, B2, C1, C2)")]
    InvalidLevel(String),

    /// A snapshot handle points at an element that is no longer in the page.
    #[error("Element {0} is no longer attached to the page")]
    StaleElement(String),

    /// Extraction produced no usable text.
    #[error("No readable content found on this page")]
    NoContent,

    /// File not found.
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// File read/write errors.
    #[error("Failed to write to file: {0}")]
    WriteError(#[from] std::io::Error),
}

impl GradedError {
    /// Wraps an error as a summarization failure.
    pub fn summarize(err: GradedError) -> Self {
        match err {
            already @ GradedError::Summarize(_) => already,
            other => GradedError::Summarize(Box::new(other)),
        }
    }
}

/// Result type alias for GradedError.
pub type Result<T> = std::result::Result<T, GradedError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = GradedError::InvalidUrl("not a url".to_string());
        assert!(err.to_string().contains("Invalid URL"));
    }

    #[test]
    fn test_api_error_display() {
        let err = GradedError::Api { status: 429, message: "slow down".to_string() };
        assert!(err.to_string().contains("429"));
        assert!(err.to_string().contains("slow down"));
    }

    #[test]
    fn test_summarize_wraps_once() {
        let err = GradedError::summarize(GradedError::summarize(GradedError::EmptyCompletion));
        match err {
            GradedError::Summarize(inner) => assert!(matches!(*inner, GradedError::EmptyCompletion)),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_timeout_error() {
        let err = GradedError::Timeout { timeout: 30 };
        assert!(err.to_string().contains("30"));
    }
}
