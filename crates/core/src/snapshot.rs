//! Captured pre-rewrite state of a page.

/// One captured element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotEntry<H> {
    /// Capture order, starting at 0
    pub index: usize,
    /// Non-owning handle into the page
    pub element: H,
    pub original_text: String,
    pub original_html: String,
}

impl<H> SnapshotEntry<H> {
    /// Length of the trimmed original text in characters.
    pub fn text_len(&self) -> usize {
        self.original_text.trim().chars().count()
    }
}

/// Ordered text/markup of every captured element, taken before any mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSnapshot<H> {
    entries: Vec<SnapshotEntry<H>>,
}

impl<H: Copy> PageSnapshot<H> {
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Record an element; entries keep insertion order.
    pub fn push(&mut self, element: H, original_text: String, original_html: String) {
        let index = self.entries.len();
        self.entries.push(SnapshotEntry { index, element, original_text, original_html });
    }

    pub fn get(&self, index: usize) -> Option<&SnapshotEntry<H>> {
        self.entries.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SnapshotEntry<H>> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<H: Copy> Default for PageSnapshot<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, H> IntoIterator for &'a PageSnapshot<H> {
    type Item = &'a SnapshotEntry<H>;
    type IntoIter = std::slice::Iter<'a, SnapshotEntry<H>>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
