//! Rule matching: relocate elements satisfying a learned [`Stack`] in a new
//! document and extract their values.
//!
//! Exact mode walks the recorded ancestor path top-down from the document
//! root. Similar mode additionally accepts any element whose own tag and
//! attribute signature match the leaf of the path, which broadens recall on
//! pages that are structurally close but not identical.

use tracing::trace;
use url::Url;

use crate::dom::{Document, NodeId};
use crate::stack::{Stack, StackEntry};
use crate::text::{attr_value_match, normalize};

/// Options for the `get_result` family.
#[derive(Debug, Clone)]
pub struct ResultOptions {
    /// Base URL for resolving extracted values of `is_full_url` rules.
    pub url: String,
    /// Similarity threshold for attribute signature comparison. 1.0 requires
    /// equality.
    pub attr_fuzz_ratio: f64,
    /// Keep empty extracted values instead of discarding them.
    pub keep_blank: bool,
    /// Order values by document position instead of match-discovery order.
    pub keep_order: bool,
    /// Deduplicate values. `None` resolves to true for flat results and
    /// false for grouped results.
    pub unique: Option<bool>,
    /// Also collect siblings of located nodes that share the same tag and
    /// attribute signature (captures repeated list/table items).
    pub contain_sibling_leaves: bool,
}

impl Default for ResultOptions {
    fn default() -> Self {
        Self {
            url: String::new(),
            attr_fuzz_ratio: 1.0,
            keep_blank: false,
            keep_order: false,
            unique: None,
            contain_sibling_leaves: false,
        }
    }
}

impl ResultOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_attr_fuzz_ratio(mut self, ratio: f64) -> Self {
        self.attr_fuzz_ratio = ratio;
        self
    }

    pub fn with_keep_blank(mut self, keep_blank: bool) -> Self {
        self.keep_blank = keep_blank;
        self
    }

    pub fn with_keep_order(mut self, keep_order: bool) -> Self {
        self.keep_order = keep_order;
        self
    }

    pub fn with_unique(mut self, unique: bool) -> Self {
        self.unique = Some(unique);
        self
    }

    pub fn with_contain_sibling_leaves(mut self, contain: bool) -> Self {
        self.contain_sibling_leaves = contain;
        self
    }
}

/// Matching mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Mode {
    Exact,
    Similar,
}

/// An extracted value together with the document position it came from.
#[derive(Debug, Clone)]
pub(crate) struct ResultItem {
    pub text: String,
    pub node: NodeId,
}

/// Resolve a possibly-relative URL against a base. Absolute inputs pass
/// through; returns `None` when the base itself does not parse.
pub(crate) fn resolve_url(base: &str, value: &str) -> Option<String> {
    let base = Url::parse(base).ok()?;
    base.join(value).ok().map(|u| u.to_string())
}

/// Whether an element reproduces one recorded path level.
fn signature_matches(doc: &Document, id: NodeId, entry: &StackEntry, ratio: f64) -> bool {
    if doc.tag(id) != Some(entry.tag.as_str()) {
        return false;
    }
    entry.attrs.iter().all(|(name, recorded)| {
        doc.attr(id, name)
            .is_some_and(|actual| attr_value_match(name, recorded, actual, ratio))
    })
}

/// Top-down walk of the recorded path; yields the leaf nodes reached.
fn locate_exact(doc: &Document, stack: &Stack, ratio: f64) -> Vec<NodeId> {
    let mut parents = vec![doc.root()];
    for entry in &stack.content {
        let mut next = Vec::new();
        for &parent in &parents {
            for child in doc.children(parent) {
                if signature_matches(doc, child, entry, ratio) {
                    next.push(child);
                }
            }
        }
        if next.is_empty() {
            return Vec::new();
        }
        parents = next;
    }
    parents
}

/// Exact walk plus a document-wide scan for leaf-signature matches.
fn locate_similar(doc: &Document, stack: &Stack, ratio: f64) -> Vec<NodeId> {
    let mut located = locate_exact(doc, stack, ratio);
    let Some(leaf) = stack.leaf() else {
        return located;
    };
    for id in doc.elements() {
        if !located.contains(&id) && signature_matches(doc, id, leaf, ratio) {
            located.push(id);
        }
    }
    located
}

/// Expand each located node with siblings sharing its tag and class.
///
/// Siblings compare on tag and class only: `id` attributes are unique by
/// nature, and repeated list/table items differ exactly there.
fn expand_siblings(doc: &Document, located: Vec<NodeId>) -> Vec<NodeId> {
    let mut expanded = Vec::new();
    for id in located {
        if !expanded.contains(&id) {
            expanded.push(id);
        }
        let Some(tag) = doc.tag(id) else {
            continue;
        };
        let classes = doc.classes(id);
        let Some(parent) = doc.get(id).map(|n| n.parent) else {
            continue;
        };
        for sibling in doc.children(parent) {
            if sibling != id
                && doc.tag(sibling) == Some(tag)
                && doc.classes(sibling) == classes
                && !expanded.contains(&sibling)
            {
                expanded.push(sibling);
            }
        }
    }
    expanded
}

/// Extract the rule's value from one located node.
fn extract(doc: &Document, id: NodeId, stack: &Stack, base_url: &str) -> String {
    let raw = match &stack.wanted_attr {
        Some(attr) => {
            let value = doc.attr(id, attr).unwrap_or("").to_string();
            if stack.is_full_url {
                resolve_url(base_url, &value).unwrap_or(value)
            } else {
                value
            }
        }
        None => {
            if stack.is_non_rec_text {
                doc.direct_text(id)
            } else {
                doc.text(id)
            }
        }
    };
    normalize(&raw)
}

/// Values for one rule against one document: locate, optionally expand
/// siblings, extract, filter blanks, order, deduplicate.
pub(crate) fn results_for_stack(
    doc: &Document,
    stack: &Stack,
    options: &ResultOptions,
    mode: Mode,
    unique: bool,
) -> Vec<ResultItem> {
    let located = match mode {
        Mode::Exact => locate_exact(doc, stack, options.attr_fuzz_ratio),
        Mode::Similar => locate_similar(doc, stack, options.attr_fuzz_ratio),
    };
    let located = if options.contain_sibling_leaves {
        expand_siblings(doc, located)
    } else {
        located
    };
    trace!(stack_id = %stack.stack_id, located = located.len(), ?mode, "rule matched");

    let mut items: Vec<ResultItem> = located
        .into_iter()
        .map(|node| ResultItem {
            text: extract(doc, node, stack, &options.url),
            node,
        })
        .filter(|item| options.keep_blank || !item.text.is_empty())
        .collect();

    if options.keep_order {
        items.sort_by_key(|item| item.node);
    }
    if unique {
        let mut seen = std::collections::HashSet::new();
        items.retain(|item| seen.insert(item.text.clone()));
    }
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::learn::learn_stacks;
    use crate::text::Target;

    fn learn_one(doc: &Document, value: &str) -> Stack {
        let targets = vec![(String::new(), Target::from(value))];
        let mut stacks = learn_stacks(doc, &targets, "", 1.0);
        stacks.retain(|s| s.leaf().is_some());
        stacks.pop().unwrap()
    }

    #[test]
    fn test_resolve_url_semantics() {
        assert_eq!(
            resolve_url("https://example.com/page", "/path").as_deref(),
            Some("https://example.com/path")
        );
        assert_eq!(
            resolve_url("https://example.com/a/", "b").as_deref(),
            Some("https://example.com/a/b")
        );
        // Absolute inputs pass through
        assert_eq!(
            resolve_url("https://example.com", "https://other.org/x").as_deref(),
            Some("https://other.org/x")
        );
        // Protocol-relative resolves against the base scheme
        assert_eq!(
            resolve_url("https://example.com", "//cdn.example.com/x").as_deref(),
            Some("https://cdn.example.com/x")
        );
        assert_eq!(resolve_url("", "/path"), None);
    }

    #[test]
    fn test_exact_walk_locates_structural_twins() {
        let doc = Document::parse(
            "<ul><li class='item'>Alpha</li><li class='item'>Beta</li></ul>",
        );
        let stack = learn_one(&doc, "Alpha");
        let items = results_for_stack(&doc, &stack, &ResultOptions::default(), Mode::Exact, true);
        let texts: Vec<_> = items.iter().map(|i| i.text.as_str()).collect();
        assert_eq!(texts, vec!["Alpha", "Beta"]);
    }

    #[test]
    fn test_similar_broadens_beyond_path() {
        // The second card sits under an extra wrapper, so the exact path
        // misses it but the leaf signature still matches.
        let doc = Document::parse(
            "<div><p class='title'>One</p></div>\
             <section><div><p class='title'>Two</p></div></section>",
        );
        let stack = learn_one(&doc, "One");

        let exact = results_for_stack(&doc, &stack, &ResultOptions::default(), Mode::Exact, true);
        let similar =
            results_for_stack(&doc, &stack, &ResultOptions::default(), Mode::Similar, true);

        let exact_texts: Vec<_> = exact.iter().map(|i| i.text.as_str()).collect();
        let similar_texts: Vec<_> = similar.iter().map(|i| i.text.as_str()).collect();
        assert_eq!(exact_texts, vec!["One"]);
        assert_eq!(similar_texts, vec!["One", "Two"]);
    }

    #[test]
    fn test_blank_filtering() {
        let doc = Document::parse("<ul><li>Alpha</li><li></li></ul>");
        let stack = learn_one(&doc, "Alpha");

        let default = results_for_stack(&doc, &stack, &ResultOptions::default(), Mode::Exact, true);
        assert_eq!(default.len(), 1);

        let kept = results_for_stack(
            &doc,
            &stack,
            &ResultOptions::new().with_keep_blank(true),
            Mode::Exact,
            true,
        );
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn test_attribute_fuzz_on_class() {
        let doc = Document::parse("<div class='post'>Alpha</div>");
        let stack = learn_one(&doc, "Alpha");

        let other = Document::parse("<div class='postz'>Beta</div>");
        let strict =
            results_for_stack(&other, &stack, &ResultOptions::default(), Mode::Similar, true);
        assert!(strict.is_empty());

        let fuzzy = results_for_stack(
            &other,
            &stack,
            &ResultOptions::new().with_attr_fuzz_ratio(0.7),
            Mode::Similar,
            true,
        );
        assert_eq!(fuzzy.len(), 1);
        assert_eq!(fuzzy[0].text, "Beta");
    }
}
