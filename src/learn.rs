//! Rule learning: scan a training document for elements carrying the wanted
//! values and derive one [`Stack`] per distinct match.

use indexmap::IndexMap;
use tracing::trace;

use crate::dom::{Document, NodeId};
use crate::locate::resolve_url;
use crate::stack::{Stack, StackEntry};
use crate::text::{Target, normalize, text_match};

/// Wanted values for a build call: a flat list (all rules get an empty
/// alias) or a mapping of alias to values.
#[derive(Debug, Clone)]
pub enum Wanted {
    List(Vec<Target>),
    Dict(IndexMap<String, Vec<Target>>),
}

impl Wanted {
    /// Flat targets with no alias.
    pub fn list<I, T>(targets: I) -> Wanted
    where
        I: IntoIterator<Item = T>,
        T: Into<Target>,
    {
        Wanted::List(targets.into_iter().map(Into::into).collect())
    }

    /// Alias-grouped targets.
    pub fn dict<K, I, T>(groups: impl IntoIterator<Item = (K, I)>) -> Wanted
    where
        K: Into<String>,
        I: IntoIterator<Item = T>,
        T: Into<Target>,
    {
        Wanted::Dict(
            groups
                .into_iter()
                .map(|(k, v)| (k.into(), v.into_iter().map(Into::into).collect()))
                .collect(),
        )
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Wanted::List(targets) => targets.is_empty(),
            Wanted::Dict(groups) => groups.values().all(|v| v.is_empty()),
        }
    }

    /// Flatten into (alias, target) pairs, preserving order.
    pub(crate) fn flatten(&self) -> Vec<(String, Target)> {
        match self {
            Wanted::List(targets) => targets
                .iter()
                .map(|t| (String::new(), t.clone()))
                .collect(),
            Wanted::Dict(groups) => groups
                .iter()
                .flat_map(|(alias, targets)| {
                    targets.iter().map(move |t| (alias.clone(), t.clone()))
                })
                .collect(),
        }
    }
}

/// Options for [`Scraper::build`](crate::Scraper::build).
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Base URL of the training document; used to recognize attributes that
    /// only match once resolved, and recorded on such rules.
    pub url: String,
    /// Merge newly learned rules into the existing rule set instead of
    /// replacing it.
    pub update: bool,
    /// Similarity threshold for matching wanted values against document
    /// text. 1.0 requires equality.
    pub text_fuzz_ratio: f64,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            url: String::new(),
            update: false,
            text_fuzz_ratio: 1.0,
        }
    }
}

impl BuildOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_update(mut self, update: bool) -> Self {
        self.update = update;
        self
    }

    pub fn with_text_fuzz_ratio(mut self, ratio: f64) -> Self {
        self.text_fuzz_ratio = ratio;
        self
    }
}

/// How a candidate node carries the wanted value.
struct Candidate {
    node: NodeId,
    wanted_attr: Option<String>,
    is_full_url: bool,
    is_non_rec_text: bool,
}

/// Learn stacks for every (alias, target) pair against a document.
///
/// Candidate order follows document order per target, so rule order is
/// reproducible across runs.
pub(crate) fn learn_stacks(
    doc: &Document,
    targets: &[(String, Target)],
    url: &str,
    text_fuzz_ratio: f64,
) -> Vec<Stack> {
    let mut stacks = Vec::new();
    for (alias, target) in targets {
        for candidate in find_candidates(doc, target, url, text_fuzz_ratio) {
            let mut stack = build_stack(doc, &candidate, url);
            stack.alias = alias.clone();
            trace!(stack_id = %stack.stack_id, depth = stack.content.len(), "learned rule");
            stacks.push(stack);
        }
    }
    stacks
}

/// Scan every element for text or attribute matches of one target.
fn find_candidates(
    doc: &Document,
    target: &Target,
    url: &str,
    ratio: f64,
) -> Vec<Candidate> {
    let mut candidates = Vec::new();
    for node in doc.elements() {
        if let Some(candidate) = match_node(doc, node, target, url, ratio) {
            candidates.push(candidate);
        }
    }
    candidates
}

/// Decide whether one node carries the target, and how.
///
/// Text matches are preferred over attribute matches; within text matches the
/// non-recursive form is preferred when it also matches, since it is less
/// likely to capture unrelated descendant text. Within attributes, the first
/// matching attribute wins, trying the raw value before the URL-resolved one.
fn match_node(
    doc: &Document,
    node: NodeId,
    target: &Target,
    url: &str,
    ratio: f64,
) -> Option<Candidate> {
    let full_text = normalize(&doc.text(node));
    if text_match(target, &full_text, ratio) {
        // A matching direct child subsumes a container with no class/id
        // signature of its own; signed containers still yield a rule, which
        // keeps whole-document wrappers (body, html) out of the set.
        let subsumed = doc.children(node).any(|child| {
            doc.is_element(child) && text_match(target, &normalize(&doc.text(child)), ratio)
        });
        let signed = doc.element_id(node).is_some() || !doc.classes(node).is_empty();
        if !subsumed || signed {
            let direct = normalize(&doc.direct_text(node));
            let is_non_rec_text = text_match(target, &direct, ratio);
            return Some(Candidate {
                node,
                wanted_attr: None,
                is_full_url: false,
                is_non_rec_text,
            });
        }
    }

    for attr in doc.attrs(node) {
        let value = normalize(&attr.value);
        if text_match(target, &value, ratio) {
            return Some(Candidate {
                node,
                wanted_attr: Some(attr.name.clone()),
                is_full_url: false,
                is_non_rec_text: false,
            });
        }
        if !url.is_empty()
            && let Some(resolved) = resolve_url(url, &value)
            && text_match(target, &resolved, ratio)
        {
            return Some(Candidate {
                node,
                wanted_attr: Some(attr.name.clone()),
                is_full_url: true,
                is_non_rec_text: false,
            });
        }
    }

    None
}

/// Walk from a candidate to the document root, recording the signature at
/// each level, root first.
fn build_stack(doc: &Document, candidate: &Candidate, url: &str) -> Stack {
    let mut content = Vec::new();
    if let Some(entry) = StackEntry::from_node(doc, candidate.node) {
        content.push(entry);
    }
    for ancestor in doc.ancestors(candidate.node) {
        if let Some(entry) = StackEntry::from_node(doc, ancestor) {
            content.push(entry);
        }
    }
    content.reverse();

    let recorded_url = if candidate.is_full_url {
        url.to_string()
    } else {
        String::new()
    };
    Stack::new(
        content,
        candidate.wanted_attr.clone(),
        candidate.is_full_url,
        candidate.is_non_rec_text,
        recorded_url,
    )
}
