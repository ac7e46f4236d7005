//! Capturing, rewriting and restoring page text.
//!
//! Capture records every text-bearing element once, before anything is
//! mutated. Apply hands processed paragraphs to the captured elements in
//! order. Restore puts the captured markup back verbatim.

use std::time::Duration;

use tracing::{debug, warn};

use crate::Result;
use crate::dom::PageDom;
use crate::snapshot::PageSnapshot;

/// Elements considered to carry readable text.
pub const TEXT_SELECTOR: &str = "h1, h2, h3, h4, h5, h6, p, li, td, th, blockquote, figcaption, dt, dd, \
     [class*=\"article-text\"], [class*=\"body-text\"], [class*=\"paragraph\"], [class*=\"story-text\"]";

/// Configuration for page patching
#[derive(Debug, Clone)]
pub struct PatchConfig {
    /// Selector for text-bearing elements
    pub capture_selector: String,
    /// Elements are captured when their trimmed text is longer than this
    pub capture_min_len: usize,
    /// Captured elements receive rewritten text when their original text is longer than this
    pub apply_min_len: usize,
    /// Opacity held while the page is being swapped
    pub fade_opacity: f32,
    /// How long the faded state lasts before mutation
    pub fade_duration: Duration,
}

impl Default for PatchConfig {
    fn default() -> Self {
        Self {
            capture_selector: TEXT_SELECTOR.to_string(),
            capture_min_len: 10,
            apply_min_len: 20,
            fade_opacity: 0.5,
            fade_duration: Duration::from_millis(300),
        }
    }
}

/// Counts from one apply pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyReport {
    /// Elements that received a paragraph
    pub updated: usize,
    /// Elements below `apply_min_len`
    pub skipped: usize,
    /// Elements no longer attached to the page
    pub stale: usize,
}

/// Counts from one restore pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RestoreReport {
    pub restored: usize,
    pub stale: usize,
}

/// Record the text and inner markup of every text-bearing element.
pub fn capture<P: PageDom>(page: &P, config: &PatchConfig) -> Result<PageSnapshot<P::Handle>> {
    let mut snapshot = PageSnapshot::new();

    for handle in page.select(&config.capture_selector)? {
        let Some(text) = page.text(handle) else { continue };
        if text.trim().chars().count() <= config.capture_min_len {
            continue;
        }
        let html = page.inner_html(handle).unwrap_or_default();
        snapshot.push(handle, text, html);
    }

    debug!(elements = snapshot.len(), "captured page snapshot");
    Ok(snapshot)
}

/// Split processed text into paragraphs on blank lines.
pub fn split_paragraphs(text: &str) -> Vec<String> {
    let mut paragraphs = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in text.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                paragraphs.push(current.join("\n"));
                current.clear();
            }
        } else {
            current.push(line.trim());
        }
    }
    if !current.is_empty() {
        paragraphs.push(current.join("\n"));
    }

    paragraphs
}

/// Inline-formatted text: has tags but does not start with one.
pub fn is_complex_markup(html: &str) -> bool {
    let html = html.trim();
    html.contains('<') && html.contains('>') && !html.starts_with('<')
}

/// Distribute `paragraphs` over the captured elements.
///
/// Eligible elements take paragraphs in order; once the supply runs out
/// they all take the last one. Surplus paragraphs are dropped.
pub fn apply<P: PageDom>(
    page: &mut P, snapshot: &PageSnapshot<P::Handle>, paragraphs: &[String], config: &PatchConfig,
) -> Result<ApplyReport> {
    let mut report = ApplyReport::default();
    let Some(last) = paragraphs.last() else {
        return Ok(report);
    };

    let mut next = 0;
    for entry in snapshot {
        if entry.text_len() <= config.apply_min_len {
            report.skipped += 1;
            continue;
        }

        let paragraph = paragraphs.get(next).unwrap_or(last);
        next += 1;

        if !page.is_attached(entry.element) {
            warn!(index = entry.index, "captured element detached, not rewriting it");
            report.stale += 1;
            continue;
        }

        if is_complex_markup(&entry.original_html) {
            page.replace_first_text_leaf(entry.element, paragraph)?;
        } else {
            page.set_text(entry.element, paragraph)?;
        }
        report.updated += 1;
    }

    debug!(?report, paragraphs = paragraphs.len(), "applied rewritten paragraphs");
    Ok(report)
}

/// Put every captured element's original markup back.
pub fn restore<P: PageDom>(page: &mut P, snapshot: &PageSnapshot<P::Handle>) -> Result<RestoreReport> {
    let mut report = RestoreReport::default();

    for entry in snapshot {
        if !page.is_attached(entry.element) {
            report.stale += 1;
            continue;
        }
        page.set_inner_html(entry.element, &entry.original_html)?;
        report.restored += 1;
    }

    debug!(?report, "restored page snapshot");
    Ok(report)
}

/// Dim the page before a swap.
pub async fn fade_out<P: PageDom>(page: &mut P, config: &PatchConfig) {
    page.set_opacity(config.fade_opacity);
    if !config.fade_duration.is_zero() {
        tokio::time::sleep(config.fade_duration).await;
    }
}

/// Bring the page back to full opacity.
pub fn fade_in<P: PageDom>(page: &mut P) {
    page.set_opacity(1.0);
}
