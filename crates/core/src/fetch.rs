//! Page loading from URLs, files, and stdin.

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use reqwest::Client;
use tracing::debug;
use url::Url;

use crate::{GradedError, Result};

/// HTTP settings for fetching pages.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Request timeout in seconds.
    pub timeout: u64,
    /// User-Agent header sent with every request.
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self { timeout: 30, user_agent: concat!("Mozilla/5.0 (compatible; graded/", env!("CARGO_PKG_VERSION"), ")").to_string() }
    }
}

/// Fetches a page over HTTP(S) and returns its body as text.
///
/// Only `http` and `https` URLs are accepted. Redirects are followed.
pub async fn fetch_url(url: &str, config: &FetchConfig) -> Result<String> {
    let parsed_url = Url::parse(url).map_err(|e| GradedError::InvalidUrl(e.to_string()))?;

    if !matches!(parsed_url.scheme(), "http" | "https") {
        return Err(GradedError::InvalidUrl(format!(
            "unsupported scheme '{}' (expected http or https)",
            parsed_url.scheme()
        )));
    }

    let client = Client::builder()
        .timeout(Duration::from_secs(config.timeout))
        .build()
        .map_err(GradedError::HttpError)?;

    debug!(url = %parsed_url, "fetching page");
    let response = client
        .get(parsed_url)
        .header("User-Agent", &config.user_agent)
        .header("Accept", "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8")
        .header("Accept-Language", "en-US,en;q=0.9")
        .send()
        .await
        .map_err(|e| if e.is_timeout() { GradedError::Timeout { timeout: config.timeout } } else { GradedError::HttpError(e) })?;

    let content = response.error_for_status()?.text().await?;

    Ok(content)
}

/// Reads a page from a local file.
pub fn fetch_file(path: &str) -> Result<String> {
    let path_buf = PathBuf::from(path);

    if !path_buf.exists() {
        Err(GradedError::FileNotFound(path_buf))
    } else {
        fs::read_to_string(&path_buf).map_err(GradedError::from)
    }
}

/// Reads a page from standard input until EOF.
pub fn fetch_stdin() -> Result<String> {
    use std::io::{self, Read};

    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;

    Ok(buffer)
}
