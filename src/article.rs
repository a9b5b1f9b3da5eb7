use std::sync::Arc;

/// Shared handle to a node id
/// The graph, every rank table and every contribution point at the same
/// allocation, so handing an id around is a refcount bump.
pub type NodeId = Arc<str>;

/// One parsed record: a page title and the raw targets of its `[[links]]`
/// Targets are kept verbatim and in order; they may repeat, point back at
/// the page itself, or name pages that are not in the corpus.
#[derive(Clone, Debug, PartialEq)]
pub struct Page {
    pub title: String,
    pub links: Vec<String>,
}

impl Page {
    pub fn new<T: Into<String>>(title: T, links: Vec<String>) -> Self {
        Page { title: title.into(), links }
    }
    pub fn is_dangling(&self) -> bool {
        self.links.is_empty()
    }
}
