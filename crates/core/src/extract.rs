//! Main-content text extraction.
//!
//! Picks the element most likely to hold the article text by walking a
//! prioritized selector list, and falls back to the page body with
//! navigation and boilerplate removed.

use std::sync::LazyLock;

use ego_tree::iter::Edge;
use regex::Regex;
use scraper::{ElementRef, Html, Node};
use tracing::debug;

use crate::parse::Document;
use crate::{GradedError, Result};

static HORIZONTAL_WS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\S\n]+").unwrap());
static NEWLINE_RUN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r" ?\n[\s]*").unwrap());

/// Containers tried in order when looking for the main content.
pub const CONTENT_SELECTORS: &[&str] = &[
    "main",
    "article",
    "[role=\"main\"]",
    ".main-content",
    ".post-content",
    ".entry-content",
    ".article-content",
    ".article-body",
    ".content",
    "#content",
];

/// Elements removed from the body before using it as a fallback.
pub const BOILERPLATE_SELECTORS: &[&str] = &[
    "nav",
    "header",
    "footer",
    "aside",
    "script",
    "style",
    "noscript",
    "template",
    ".sidebar",
    ".navigation",
    ".menu",
    ".advertisement",
    ".ads",
    ".cookie-banner",
    "[role=\"navigation\"]",
    "[role=\"banner\"]",
    "[role=\"contentinfo\"]",
];

/// Tags whose text never counts as readable content.
const INVISIBLE_TAGS: &[&str] = &["script", "style", "noscript", "template"];

/// Tags that end a line of text when rendered.
const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "br", "dd", "div", "dl", "dt", "figcaption", "figure", "footer",
    "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li", "main", "nav", "ol", "p", "pre", "section",
    "table", "td", "th", "tr", "ul",
];

/// Configuration for content extraction
#[derive(Debug, Clone)]
pub struct ExtractConfig {
    /// A selector match is accepted only when its text is longer than this (in chars)
    pub min_candidate_len: usize,
    /// Extracted text is truncated to this many chars
    pub max_len: usize,
    /// Main-content selectors, highest priority first
    pub content_selectors: Vec<String>,
    /// Selectors stripped from the body fallback
    pub boilerplate_selectors: Vec<String>,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            min_candidate_len: 100,
            max_len: 12_000,
            content_selectors: CONTENT_SELECTORS.iter().map(|s| s.to_string()).collect(),
            boilerplate_selectors: BOILERPLATE_SELECTORS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Where the extracted text came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentSource {
    /// A main-content selector matched with enough text
    Selector(String),
    /// The boilerplate-stripped body
    Body,
}

/// The result of text extraction
#[derive(Debug, Clone)]
pub struct ExtractedText {
    /// Normalized, possibly truncated text. May be empty.
    pub text: String,
    pub source: ContentSource,
    /// Whether `max_len` cut the text short
    pub truncated: bool,
}

impl ExtractedText {
    /// Length of the text in characters.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Extract the main readable text from page markup.
///
/// Never fails on an empty page; the caller decides whether empty text is
/// acceptable. Errors are limited to invalid selectors in `config`.
pub fn extract_main_text(markup: &str, config: &ExtractConfig) -> Result<ExtractedText> {
    let doc = Document::parse(markup)?;

    for selector in &config.content_selectors {
        let Some(candidate) = doc.select_first(selector)? else {
            continue;
        };
        let text = normalize_text(&visible_text(candidate.element_ref()));
        let len = text.chars().count();
        if len > config.min_candidate_len {
            debug!(selector = %selector, len, "main content selector accepted");
            return Ok(finish(text, ContentSource::Selector(selector.clone()), config.max_len));
        }
        debug!(selector = %selector, len, "main content selector too short");
    }

    let body_markup = doc.body().map(|b| b.outer_html()).unwrap_or_else(|| doc.as_string());
    let stripped = strip_boilerplate(&body_markup, &config.boilerplate_selectors)?;
    let fragment = Html::parse_fragment(&stripped);
    let text = normalize_text(&visible_text(fragment.root_element()));
    debug!(len = text.chars().count(), "falling back to stripped body");

    Ok(finish(text, ContentSource::Body, config.max_len))
}

fn finish(text: String, source: ContentSource, max_len: usize) -> ExtractedText {
    let (text, truncated) = truncate_chars(text, max_len);
    ExtractedText { text, source, truncated }
}

/// Remove every element matching one of `selectors`, including its content.
pub fn strip_boilerplate(html: &str, selectors: &[String]) -> Result<String> {
    for selector in selectors {
        selector
            .parse::<lol_html::Selector>()
            .map_err(|e| GradedError::HtmlParseError(format!("Invalid selector {}: {}", selector, e)))?;
    }

    let mut output = String::new();
    let mut rewriter = lol_html::HtmlRewriter::new(
        lol_html::Settings {
            element_content_handlers: selectors
                .iter()
                .map(|selector| {
                    lol_html::element!(selector.as_str(), |el| {
                        el.remove();
                        Ok(())
                    })
                })
                .collect(),
            ..Default::default()
        },
        |c: &[u8]| {
            output.push_str(&String::from_utf8_lossy(c));
        },
    );

    rewriter
        .write(html.as_bytes())
        .map_err(|e| GradedError::HtmlParseError(e.to_string()))?;
    rewriter.end().map_err(|e| GradedError::HtmlParseError(e.to_string()))?;

    Ok(output)
}

/// Text an element would render, with block boundaries as newlines and
/// script-like content skipped.
pub fn visible_text(element: ElementRef<'_>) -> String {
    let mut text = String::new();
    let mut hidden_depth = 0usize;

    for edge in element.traverse() {
        match edge {
            Edge::Open(node) => match node.value() {
                Node::Element(el) if INVISIBLE_TAGS.contains(&el.name()) => hidden_depth += 1,
                Node::Text(t) if hidden_depth == 0 => text.push_str(t),
                _ => {}
            },
            Edge::Close(node) => {
                if let Node::Element(el) = node.value() {
                    if INVISIBLE_TAGS.contains(&el.name()) {
                        hidden_depth = hidden_depth.saturating_sub(1);
                    } else if hidden_depth == 0 && BLOCK_TAGS.contains(&el.name()) {
                        text.push('\n');
                    }
                }
            }
        }
    }

    text
}

/// Collapse whitespace runs to one space and newline runs to one newline, then trim.
pub fn normalize_text(text: &str) -> String {
    let collapsed = HORIZONTAL_WS_RE.replace_all(text, " ");
    let collapsed = NEWLINE_RUN_RE.replace_all(&collapsed, "\n");
    collapsed.trim().to_string()
}

/// Truncate to at most `max_chars` characters.
pub fn truncate_chars(mut text: String, max_chars: usize) -> (String, bool) {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => {
            text.truncate(cut);
            (text, true)
        }
        None => (text, false),
    }
}
