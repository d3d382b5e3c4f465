//! Text normalization and similarity primitives.
//!
//! Shared by the rule learner and the rule matcher: both decide "is this the
//! value the caller showed us" through [`text_match`], and both compare
//! attribute signatures through the same ratio machinery.

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// Canonicalize a string for comparison: trim surrounding whitespace and
/// apply Unicode NFKD decomposition.
pub fn normalize(value: &str) -> String {
    value.trim().nfkd().collect()
}

/// Similarity ratio between two strings in [0, 1].
///
/// Defined as `2 * LCS(a, b) / (|a| + |b|)` over characters: symmetric,
/// 1.0 for identical strings, and monotonically decreasing as the strings
/// diverge. Two empty strings are identical (ratio 1.0).
pub fn similarity_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    // Longest common subsequence, rolling single row.
    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];
    for &ca in &a {
        for (j, &cb) in b.iter().enumerate() {
            curr[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                prev[j + 1].max(curr[j])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    let lcs = prev[b.len()];

    2.0 * lcs as f64 / (a.len() + b.len()) as f64
}

/// A wanted value: either a literal string or a compiled pattern.
#[derive(Debug, Clone)]
pub enum Target {
    Literal(String),
    Pattern(Regex),
}

impl From<&str> for Target {
    fn from(s: &str) -> Self {
        Target::Literal(s.to_string())
    }
}

impl From<String> for Target {
    fn from(s: String) -> Self {
        Target::Literal(s)
    }
}

impl From<Regex> for Target {
    fn from(re: Regex) -> Self {
        // Recompile anchored so the pattern must span the whole candidate.
        // An unanchored leftmost-first search would reject full matches that
        // begin with a shorter alternative (`foo|foobar` against "foobar").
        let anchored = Regex::new(&format!("^(?:{})$", re.as_str()));
        Target::Pattern(anchored.unwrap_or(re))
    }
}

/// Match a candidate string against a target.
///
/// A pattern target must match the entire candidate (`ratio_limit` is
/// ignored); [`Target::from`] anchors the pattern at construction. A literal
/// target with `ratio_limit >= 1.0` requires equality; below that,
/// [`similarity_ratio`] must reach the limit.
pub fn text_match(target: &Target, candidate: &str, ratio_limit: f64) -> bool {
    match target {
        Target::Pattern(re) => re.is_match(candidate),
        Target::Literal(text) => {
            if ratio_limit >= 1.0 {
                text == candidate
            } else {
                similarity_ratio(text, candidate) >= ratio_limit
            }
        }
    }
}

/// A reusable comparator bound to one reference string and ratio limit.
#[derive(Debug, Clone)]
pub struct FuzzyText {
    pub text: String,
    pub ratio_limit: f64,
}

impl FuzzyText {
    pub fn new(text: impl Into<String>, ratio_limit: f64) -> Self {
        Self {
            text: text.into(),
            ratio_limit,
        }
    }

    /// Whether a candidate is similar enough to the reference string.
    pub fn search(&self, candidate: &str) -> bool {
        if self.ratio_limit >= 1.0 {
            return self.text == candidate;
        }
        similarity_ratio(&self.text, candidate) >= self.ratio_limit
    }
}

/// Compare one recorded attribute value against a candidate value.
///
/// Class-like values are compared per whitespace-separated token: every
/// recorded token must find a similar candidate token. Other attributes
/// compare whole values.
pub fn attr_value_match(name: &str, recorded: &str, candidate: &str, ratio_limit: f64) -> bool {
    if name == "class" {
        let candidate_tokens: Vec<&str> = candidate.split_whitespace().collect();
        recorded.split_whitespace().all(|token| {
            let fuzzy = FuzzyText::new(token, ratio_limit);
            candidate_tokens.iter().any(|c| fuzzy.search(c))
        })
    } else {
        FuzzyText::new(recorded, ratio_limit).search(candidate)
    }
}
