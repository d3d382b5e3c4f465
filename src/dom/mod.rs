//! Document tree: html5ever parsing into an arena of index-linked nodes.

mod arena;
mod tree_sink;

pub use arena::{Ancestors, Attribute, Children, Descendants, Document, Node, NodeData, NodeId};
pub use tree_sink::DocumentSink;

use html5ever::driver::ParseOpts;
use html5ever::parse_document;
use html5ever::tendril::TendrilSink;

impl Document {
    /// Parse HTML markup into a document tree.
    ///
    /// Parsing is lenient: malformed markup is recovered from the way a
    /// browser would, never rejected.
    pub fn parse(html: &str) -> Document {
        let sink = DocumentSink::new();
        let result = parse_document(sink, ParseOpts::default())
            .from_utf8()
            .one(html.as_bytes());
        result.into_document()
    }
}
