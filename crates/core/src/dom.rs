//! The page capability the patcher works against.
//!
//! [`PageDom`] is everything the session needs from a live page: markup
//! for extraction, element lookup by selector, and text/markup mutation
//! through non-owning handles. [`HtmlPage`] implements it over a parsed
//! `scraper` tree, where handles are `ego_tree` node ids.

use std::fmt::Debug;

use ego_tree::{NodeId, NodeRef, Tree};
use scraper::node::Text;
use scraper::{ElementRef, Html, Node};
use tracing::warn;
use url::Url;

use crate::parse::Document;
use crate::{GradedError, Result};

/// A mutable page whose elements are addressed by weak handles.
pub trait PageDom {
    /// Non-owning element reference. The page owns the element.
    type Handle: Copy + Eq + Debug;

    /// Serialized markup of the whole page as it is now.
    fn markup(&self) -> String;

    fn title(&self) -> Option<String>;

    fn url(&self) -> Option<&str>;

    /// Handles of all elements matching `selector`, in document order.
    fn select(&self, selector: &str) -> Result<Vec<Self::Handle>>;

    /// Concatenated text content of an element.
    fn text(&self, handle: Self::Handle) -> Option<String>;

    /// Inner markup of an element.
    fn inner_html(&self, handle: Self::Handle) -> Option<String>;

    /// Whether the element is still part of the page tree.
    fn is_attached(&self, handle: Self::Handle) -> bool;

    /// Replace all children of an element with one text node.
    fn set_text(&mut self, handle: Self::Handle, text: &str) -> Result<()>;

    /// Put `text` into the first non-blank text leaf of an element and
    /// remove every later non-blank text leaf, keeping the element markup.
    fn replace_first_text_leaf(&mut self, handle: Self::Handle, text: &str) -> Result<()>;

    /// Replace the children of an element with parsed `html`.
    fn set_inner_html(&mut self, handle: Self::Handle, html: &str) -> Result<()>;

    /// Visual opacity of the page content, 0.0 to 1.0.
    fn set_opacity(&mut self, opacity: f32);
}

/// An in-memory HTML page.
///
/// # Example
///
/// ```rust
/// use graded_core::dom::{HtmlPage, PageDom};
///
/// let mut page = HtmlPage::parse("<html><body><p>Hello there</p></body></html>", None).unwrap();
/// let p = page.select("p").unwrap()[0];
/// page.set_text(p, "Hi").unwrap();
/// assert!(page.markup().contains("<p>Hi</p>"));
/// ```
#[derive(Debug, Clone)]
pub struct HtmlPage {
    doc: Document,
    url: Option<Url>,
    opacity: f32,
}

impl HtmlPage {
    /// Parse a page, optionally remembering the URL it was loaded from.
    pub fn parse(html: &str, url: Option<&str>) -> Result<Self> {
        let url = url
            .map(|u| Url::parse(u).map_err(|e| GradedError::InvalidUrl(e.to_string())))
            .transpose()?;
        Ok(Self { doc: Document::parse(html)?, url, opacity: 1.0 })
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    fn tree(&self) -> &Tree<Node> {
        &self.doc.html().tree
    }

    fn tree_mut(&mut self) -> &mut Tree<Node> {
        &mut self.doc.html_mut().tree
    }

    fn element(&self, handle: NodeId) -> Option<ElementRef<'_>> {
        self.tree().get(handle).and_then(ElementRef::wrap)
    }

    fn attached_element(&self, handle: NodeId) -> Result<ElementRef<'_>> {
        if !self.is_attached(handle) {
            return Err(GradedError::StaleElement(format!("{:?}", handle)));
        }
        self.element(handle).ok_or_else(|| GradedError::StaleElement(format!("{:?}", handle)))
    }

    fn detach_children(&mut self, handle: NodeId) {
        let children: Vec<NodeId> = match self.tree().get(handle) {
            Some(node) => node.children().map(|c| c.id()).collect(),
            None => return,
        };
        for child in children {
            if let Some(mut node) = self.tree_mut().get_mut(child) {
                node.detach();
            }
        }
    }

    /// Tag names from the outermost element below `<body>` down to `handle`.
    fn context_path(&self, handle: NodeId) -> Vec<String> {
        let Some(node) = self.tree().get(handle) else {
            return Vec::new();
        };
        let mut path: Vec<String> = std::iter::once(node)
            .chain(node.ancestors())
            .filter_map(|n| n.value().as_element().map(|el| el.name().to_string()))
            .take_while(|name| name != "body" && name != "html")
            .collect();
        path.reverse();
        path
    }

    fn append_text(&mut self, handle: NodeId, text: &str) {
        if let Some(mut node) = self.tree_mut().get_mut(handle) {
            node.append(Node::Text(Text { text: text.into() }));
        }
    }
}

/// Deep-copy the children of `source` under `parent`.
fn graft(tree: &mut Tree<Node>, parent: NodeId, source: NodeRef<'_, Node>) {
    for child in source.children() {
        let id = match tree.get_mut(parent) {
            Some(mut node) => node.append(child.value().clone()).id(),
            None => return,
        };
        graft(tree, id, child);
    }
}

/// Follow `path` down from `root`, one element child per tag name.
fn descend<'a>(root: NodeRef<'a, Node>, path: &[String]) -> Option<NodeRef<'a, Node>> {
    path.iter().try_fold(root, |node, name| {
        node.children()
            .find(|c| c.value().as_element().is_some_and(|el| el.name() == name.as_str()))
    })
}

fn is_blank_text(node: &NodeRef<'_, Node>) -> Option<bool> {
    node.value().as_text().map(|t| t.trim().is_empty())
}

impl PageDom for HtmlPage {
    type Handle = NodeId;

    fn markup(&self) -> String {
        self.doc.as_string()
    }

    fn title(&self) -> Option<String> {
        self.doc.title()
    }

    fn url(&self) -> Option<&str> {
        self.url.as_ref().map(Url::as_str)
    }

    fn select(&self, selector: &str) -> Result<Vec<NodeId>> {
        Ok(self.doc.select(selector)?.iter().map(|el| el.id()).collect())
    }

    fn text(&self, handle: NodeId) -> Option<String> {
        self.element(handle).map(|el| el.text().collect())
    }

    fn inner_html(&self, handle: NodeId) -> Option<String> {
        self.element(handle).map(|el| el.inner_html())
    }

    fn is_attached(&self, handle: NodeId) -> bool {
        let root = self.tree().root().id();
        match self.tree().get(handle) {
            Some(node) => node.id() == root || node.ancestors().any(|a| a.id() == root),
            None => false,
        }
    }

    fn set_text(&mut self, handle: NodeId, text: &str) -> Result<()> {
        self.attached_element(handle)?;
        self.detach_children(handle);
        self.append_text(handle, text);
        Ok(())
    }

    fn replace_first_text_leaf(&mut self, handle: NodeId, text: &str) -> Result<()> {
        let leaves: Vec<NodeId> = self
            .attached_element(handle)?
            .descendants()
            .filter(|node| is_blank_text(node) == Some(false))
            .map(|node| node.id())
            .collect();

        let Some((first, rest)) = leaves.split_first() else {
            return self.set_text(handle, text);
        };

        if let Some(mut node) = self.tree_mut().get_mut(*first)
            && let Node::Text(leaf) = node.value()
        {
            leaf.text = text.into();
        }
        for id in rest {
            if let Some(mut node) = self.tree_mut().get_mut(*id) {
                node.detach();
            }
        }
        Ok(())
    }

    fn set_inner_html(&mut self, handle: NodeId, html: &str) -> Result<()> {
        self.attached_element(handle)?;
        let path = self.context_path(handle);
        self.detach_children(handle);

        // Table parts and similar only parse inside their own ancestors.
        let open: String = path.iter().map(|name| format!("<{name}>")).collect();
        let close: String = path.iter().rev().map(|name| format!("</{name}>")).collect();
        let fragment = Html::parse_fragment(&format!("{open}{html}{close}"));

        let fallback;
        let target = match descend(*fragment.root_element(), &path) {
            Some(target) => target,
            None => {
                warn!("Could not re-parse markup inside {:?}; using body context", path);
                fallback = Html::parse_fragment(html);
                *fallback.root_element()
            }
        };
        graft(self.tree_mut(), handle, target);
        Ok(())
    }

    fn set_opacity(&mut self, opacity: f32) {
        self.opacity = opacity.clamp(0.0, 1.0);
    }
}
