//! HTML parsing and read-only DOM queries.
//!
//! This module provides the [`Document`] and [`Element`] types used by the
//! extractor and by [`HtmlPage`](crate::dom::HtmlPage) to query a parsed
//! page with CSS selectors.
//!
//! # Example
//!
//! ```rust
//! use graded_core::parse::Document;
//!
//! let html = r#"
//!     <html>
//!         <body>
//!             <h1>Title</h1>
//!             <p class="content">Paragraph</p>
//!         </body>
//!     </html>
//! "#;
//!
//! let doc = Document::parse(html).unwrap();
//! let paragraphs = doc.select("p.content").unwrap();
//! assert_eq!(paragraphs.len(), 1);
//! ```

use ego_tree::NodeId;
use scraper::{Html, Selector};

use crate::{GradedError, Result};

/// Compiles a CSS selector, mapping failures to [`GradedError::HtmlParseError`].
pub fn compile_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| GradedError::HtmlParseError(format!("Invalid selector: {}", e)))
}

/// Represents a parsed HTML document.
///
/// # Example
///
/// ```rust
/// use graded_core::parse::Document;
///
/// let html = "<html><head><title>Test</title></head><body><p>Hello</p></body></html>";
/// let doc = Document::parse(html).unwrap();
/// assert_eq!(doc.title(), Some("Test".to_string()));
/// ```
#[derive(Debug, Clone)]
pub struct Document {
    html: Html,
}

impl Document {
    /// Parses a full HTML document.
    pub fn parse(html: &str) -> Result<Self> {
        let html = Html::parse_document(html);
        Ok(Self { html })
    }

    /// Gets the underlying `scraper::Html` instance.
    pub fn html(&self) -> &Html {
        &self.html
    }

    pub(crate) fn html_mut(&mut self) -> &mut Html {
        &mut self.html
    }

    /// Serializes the whole document back to markup.
    pub fn as_string(&self) -> String {
        self.html.html()
    }

    /// Selects elements using a CSS selector, in document order.
    ///
    /// # Errors
    ///
    /// Returns [`GradedError::HtmlParseError`] if the selector is invalid.
    pub fn select(&'_ self, selector: &str) -> Result<Vec<Element<'_>>> {
        let sel = compile_selector(selector)?;
        Ok(self.html.select(&sel).map(|el| Element { element: el }).collect())
    }

    /// Gets the first element matching a selector, if any.
    pub fn select_first(&'_ self, selector: &str) -> Result<Option<Element<'_>>> {
        let sel = compile_selector(selector)?;
        Ok(self.html.select(&sel).next().map(|el| Element { element: el }))
    }

    /// Gets the content of the `<title>` element, trimmed.
    pub fn title(&self) -> Option<String> {
        let selector = Selector::parse("title").ok()?;
        self.html
            .select(&selector)
            .next()
            .map(|el| el.text().collect::<String>().trim().to_string())
            .filter(|t| !t.is_empty())
    }

    /// Gets the `<body>` element.
    pub fn body(&'_ self) -> Option<Element<'_>> {
        let selector = Selector::parse("body").ok()?;
        self.html.select(&selector).next().map(|el| Element { element: el })
    }
}

/// A wrapper around scraper's `ElementRef`.
///
/// # Example
///
/// ```rust
/// use graded_core::parse::Document;
///
/// let html = r#"<a href="https://example.com">Link text</a>"#;
/// let doc = Document::parse(html).unwrap();
/// let link = &doc.select("a").unwrap()[0];
///
/// assert_eq!(link.text(), "Link text");
/// assert_eq!(link.tag_name(), "a");
/// ```
#[derive(Clone, Debug)]
pub struct Element<'a> {
    element: scraper::ElementRef<'a>,
}

impl<'a> Element<'a> {
    /// Gets the node id of this element within its document tree.
    pub fn id(&self) -> NodeId {
        self.element.id()
    }

    /// Gets the wrapped scraper element.
    pub fn element_ref(&self) -> scraper::ElementRef<'a> {
        self.element
    }

    /// Gets the inner HTML of this element.
    pub fn inner_html(&self) -> String {
        self.element.inner_html()
    }

    /// Gets the outer HTML of this element.
    pub fn outer_html(&self) -> String {
        self.element.html()
    }

    /// Gets the concatenated text of all descendant text nodes.
    pub fn text(&self) -> String {
        self.element.text().collect()
    }

    /// Gets the lowercase tag name.
    pub fn tag_name(&self) -> String {
        self.element.value().name().to_lowercase()
    }
}
