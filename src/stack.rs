//! The learned rule model.
//!
//! A [`Stack`] records the ancestor path of one example match (root to leaf)
//! plus how to extract the value once an equivalent element is found again.

use indexmap::IndexMap;
use serde::de::{IgnoredAny, SeqAccess, Visitor};
use serde::ser::SerializeSeq;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::dom::{Document, NodeId};

/// One level of a learned ancestor path: a tag name plus the discriminating
/// attributes (`class` and `id`) recorded at that level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackEntry {
    pub tag: String,
    pub attrs: IndexMap<String, String>,
}

impl StackEntry {
    /// Capture the signature of an element: its tag plus `class`/`id`.
    ///
    /// Class tokens are stored space-joined; insertion order is fixed
    /// (class, then id) so fingerprints stay deterministic.
    pub fn from_node(doc: &Document, id: NodeId) -> Option<StackEntry> {
        let tag = doc.tag(id)?.to_string();
        let mut attrs = IndexMap::new();
        let classes = doc.classes(id);
        if !classes.is_empty() {
            attrs.insert("class".to_string(), classes.join(" "));
        }
        if let Some(element_id) = doc.element_id(id) {
            attrs.insert("id".to_string(), element_id.to_string());
        }
        Some(StackEntry { tag, attrs })
    }
}

// Serialized as the array `[tag, attrs]`. Older rule files carry a third
// element (a child index); it is accepted and ignored on read.
impl Serialize for StackEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(2))?;
        seq.serialize_element(&self.tag)?;
        seq.serialize_element(&self.attrs)?;
        seq.end()
    }
}

impl<'de> Deserialize<'de> for StackEntry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct EntryVisitor;

        impl<'de> Visitor<'de> for EntryVisitor {
            type Value = StackEntry;

            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                f.write_str("a [tag, attribute_map] pair")
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
                let tag: String = seq
                    .next_element()?
                    .ok_or_else(|| serde::de::Error::invalid_length(0, &self))?;
                let raw: IndexMap<String, serde_json::Value> = seq
                    .next_element()?
                    .ok_or_else(|| serde::de::Error::invalid_length(1, &self))?;
                // Drain any trailing legacy elements
                while seq.next_element::<IgnoredAny>()?.is_some() {}

                // Attribute values may be a string or a token list
                let mut attrs = IndexMap::new();
                for (key, value) in raw {
                    let joined = match value {
                        serde_json::Value::String(s) => s,
                        serde_json::Value::Array(items) => items
                            .iter()
                            .filter_map(|v| v.as_str())
                            .collect::<Vec<_>>()
                            .join(" "),
                        other => other.to_string(),
                    };
                    attrs.insert(key, joined);
                }

                Ok(StackEntry { tag, attrs })
            }
        }

        deserializer.deserialize_seq(EntryVisitor)
    }
}

/// A learned extraction rule.
///
/// Created only by the rule learner; after that, only the `alias` may change.
/// `hash` and `stack_id` are deterministic functions of `content` and
/// `wanted_attr`, so structurally identical matches collide and deduplicate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stack {
    /// Ancestor chain, root to leaf.
    pub content: Vec<StackEntry>,
    /// Attribute to extract; `None` means extract text.
    #[serde(default)]
    pub wanted_attr: Option<String>,
    /// Whether the extracted value must be resolved against a base URL.
    #[serde(default)]
    pub is_full_url: bool,
    /// Whether text extraction uses only the element's own direct text.
    #[serde(default)]
    pub is_non_rec_text: bool,
    /// Base URL at training time; empty if resolution was never needed.
    #[serde(default)]
    pub url: String,
    /// Fingerprint of `content` + `wanted_attr`.
    pub hash: String,
    /// Human-inspectable identifier derived from `hash`.
    pub stack_id: String,
    /// Caller-assigned group label; empty string means ungrouped.
    #[serde(default)]
    pub alias: String,
}

impl Stack {
    /// Build a rule from a learned ancestor path, computing its fingerprint.
    pub fn new(
        content: Vec<StackEntry>,
        wanted_attr: Option<String>,
        is_full_url: bool,
        is_non_rec_text: bool,
        url: String,
    ) -> Stack {
        let hash = fingerprint(&content, wanted_attr.as_deref());
        let stack_id = format!("rule_{}", &hash[..8]);
        Stack {
            content,
            wanted_attr,
            is_full_url,
            is_non_rec_text,
            url,
            hash,
            stack_id,
            alias: String::new(),
        }
    }

    /// The leaf (deepest) entry of the ancestor chain.
    pub fn leaf(&self) -> Option<&StackEntry> {
        self.content.last()
    }
}

/// SHA-1 over the canonical JSON of the path and the wanted attribute.
fn fingerprint(content: &[StackEntry], wanted_attr: Option<&str>) -> String {
    let canonical = serde_json::to_string(&(content, wanted_attr))
        .unwrap_or_else(|_| String::from("unserializable"));
    let mut sha = sha1_smol::Sha1::new();
    sha.update(canonical.as_bytes());
    sha.digest().to_string()
}

/// Drop duplicate stacks by hash, preserving first occurrence.
pub fn unique_stacks(stacks: Vec<Stack>) -> Vec<Stack> {
    let mut seen = std::collections::HashSet::new();
    stacks
        .into_iter()
        .filter(|s| seen.insert(s.hash.clone()))
        .collect()
}
