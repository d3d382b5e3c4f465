//! The scraper: owns the learned rule set and exposes the build / match /
//! manage / persist surface.

use std::path::Path;

use indexmap::IndexMap;
use tracing::debug;

use crate::dom::Document;
use crate::error::{Error, Result};
use crate::learn::{BuildOptions, Wanted, learn_stacks};
use crate::locate::{Mode, ResultItem, ResultOptions, results_for_stack};
use crate::persist;
use crate::stack::{Stack, unique_stacks};

/// Learns structural extraction rules from examples and reapplies them.
///
/// A scraper owns an ordered, hash-deduplicated list of [`Stack`] rules.
/// Learning ([`build`](Scraper::build)) and rule-set management mutate the
/// list; the `get_result` family only reads it, so matching an unchanging
/// scraper across documents is safe to parallelize externally.
#[derive(Debug, Clone, Default)]
pub struct Scraper {
    stack_list: Vec<Stack>,
}

impl Scraper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read access to the learned rule set, in order.
    pub fn stacks(&self) -> &[Stack] {
        &self.stack_list
    }

    /// Learn rules from a training document.
    ///
    /// Scans the document for elements matching each wanted value and derives
    /// one rule per distinct structural match. With `update` set, new rules
    /// merge into the existing set (deduplicated by hash); otherwise they
    /// replace it.
    ///
    /// Returns the freshly learned rules applied back to the training
    /// document in similar mode, so the caller can verify learning took. An
    /// empty result means no wanted value was found; it is not an error.
    pub fn build(
        &mut self,
        document: &Document,
        wanted: &Wanted,
        options: &BuildOptions,
    ) -> Result<Vec<String>> {
        validate_ratio("text_fuzz_ratio", options.text_fuzz_ratio)?;
        if wanted.is_empty() {
            return Err(Error::InvalidArgument(
                "no wanted values supplied".to_string(),
            ));
        }

        let targets = wanted.flatten();
        let learned = unique_stacks(learn_stacks(
            document,
            &targets,
            &options.url,
            options.text_fuzz_ratio,
        ));
        debug!(rules = learned.len(), update = options.update, "build complete");

        let preview_options = ResultOptions::new().with_url(options.url.clone());
        let preview = assemble_flat(document, &learned, &preview_options, Mode::Similar);

        if options.update {
            let mut merged = std::mem::take(&mut self.stack_list);
            merged.extend(learned);
            self.stack_list = unique_stacks(merged);
        } else {
            self.stack_list = learned;
        }

        Ok(preview)
    }

    /// Values matched in similar mode, flattened across all rules.
    pub fn get_result_similar(
        &self,
        document: &Document,
        options: &ResultOptions,
    ) -> Result<Vec<String>> {
        validate_ratio("attr_fuzz_ratio", options.attr_fuzz_ratio)?;
        Ok(assemble_flat(document, &self.stack_list, options, Mode::Similar))
    }

    /// Values matched in exact mode, flattened across all rules.
    pub fn get_result_exact(
        &self,
        document: &Document,
        options: &ResultOptions,
    ) -> Result<Vec<String>> {
        validate_ratio("attr_fuzz_ratio", options.attr_fuzz_ratio)?;
        Ok(assemble_flat(document, &self.stack_list, options, Mode::Exact))
    }

    /// Both modes at once: `(similar, exact)`, computed independently.
    pub fn get_result(
        &self,
        document: &Document,
        options: &ResultOptions,
    ) -> Result<(Vec<String>, Vec<String>)> {
        Ok((
            self.get_result_similar(document, options)?,
            self.get_result_exact(document, options)?,
        ))
    }

    /// Similar-mode values grouped by `stack_id`.
    pub fn get_result_similar_grouped(
        &self,
        document: &Document,
        options: &ResultOptions,
    ) -> Result<IndexMap<String, Vec<String>>> {
        validate_ratio("attr_fuzz_ratio", options.attr_fuzz_ratio)?;
        Ok(assemble_grouped(document, &self.stack_list, options, Mode::Similar))
    }

    /// Exact-mode values grouped by `stack_id`.
    pub fn get_result_exact_grouped(
        &self,
        document: &Document,
        options: &ResultOptions,
    ) -> Result<IndexMap<String, Vec<String>>> {
        validate_ratio("attr_fuzz_ratio", options.attr_fuzz_ratio)?;
        Ok(assemble_grouped(document, &self.stack_list, options, Mode::Exact))
    }

    /// Similar-mode values grouped by rule alias.
    pub fn get_result_similar_by_alias(
        &self,
        document: &Document,
        options: &ResultOptions,
    ) -> Result<IndexMap<String, Vec<String>>> {
        validate_ratio("attr_fuzz_ratio", options.attr_fuzz_ratio)?;
        Ok(assemble_by_alias(document, &self.stack_list, options, Mode::Similar))
    }

    /// Exact-mode values grouped by rule alias.
    pub fn get_result_exact_by_alias(
        &self,
        document: &Document,
        options: &ResultOptions,
    ) -> Result<IndexMap<String, Vec<String>>> {
        validate_ratio("attr_fuzz_ratio", options.attr_fuzz_ratio)?;
        Ok(assemble_by_alias(document, &self.stack_list, options, Mode::Exact))
    }

    /// Drop rules by `stack_id`. Unknown ids are ignored.
    pub fn remove_rules<S: AsRef<str>>(&mut self, ids: &[S]) {
        self.stack_list
            .retain(|s| !ids.iter().any(|id| id.as_ref() == s.stack_id));
    }

    /// Retain only rules with the given `stack_id`s. If none match, the rule
    /// set becomes empty.
    pub fn keep_rules<S: AsRef<str>>(&mut self, ids: &[S]) {
        self.stack_list
            .retain(|s| ids.iter().any(|id| id.as_ref() == s.stack_id));
    }

    /// Assign aliases by `stack_id`. Ids not present in the rule set are
    /// ignored. Hashes and ids never change.
    pub fn set_rule_aliases(&mut self, aliases: &IndexMap<String, String>) {
        for stack in &mut self.stack_list {
            if let Some(alias) = aliases.get(&stack.stack_id) {
                stack.alias = alias.clone();
            }
        }
    }

    /// Serialize the rule set to the current JSON container shape.
    pub fn to_json(&self) -> Result<String> {
        persist::encode(&self.stack_list)
    }

    /// Replace the rule set from JSON in either container shape.
    pub fn from_json(data: &str) -> Result<Scraper> {
        Ok(Scraper {
            stack_list: persist::decode(data)?,
        })
    }

    /// Write the rule set to a file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        persist::save(path.as_ref(), &self.stack_list)
    }

    /// Replace the rule set from a file written by [`save`](Scraper::save)
    /// (or the legacy bare-array format).
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<()> {
        self.stack_list = persist::load(path.as_ref())?;
        debug!(rules = self.stack_list.len(), "model loaded");
        Ok(())
    }
}

fn validate_ratio(name: &str, ratio: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&ratio) {
        return Err(Error::InvalidArgument(format!(
            "{name} must be within [0, 1], got {ratio}"
        )));
    }
    Ok(())
}

/// Flatten all rules' values into one list.
fn assemble_flat(
    document: &Document,
    stacks: &[Stack],
    options: &ResultOptions,
    mode: Mode,
) -> Vec<String> {
    let unique = options.unique.unwrap_or(true);
    let mut items: Vec<ResultItem> = Vec::new();
    for stack in stacks {
        items.extend(results_for_stack(document, stack, options, mode, unique));
    }
    if options.keep_order {
        items.sort_by_key(|item| item.node);
    }
    let mut texts: Vec<String> = items.into_iter().map(|item| item.text).collect();
    if unique {
        let mut seen = std::collections::HashSet::new();
        texts.retain(|t| seen.insert(t.clone()));
    }
    texts
}

/// One list per rule, keyed by `stack_id`.
fn assemble_grouped(
    document: &Document,
    stacks: &[Stack],
    options: &ResultOptions,
    mode: Mode,
) -> IndexMap<String, Vec<String>> {
    let unique = options.unique.unwrap_or(false);
    let mut groups = IndexMap::new();
    for stack in stacks {
        let items = results_for_stack(document, stack, options, mode, unique);
        groups.insert(
            stack.stack_id.clone(),
            items.into_iter().map(|item| item.text).collect(),
        );
    }
    groups
}

/// Concatenated lists of rules sharing an alias.
fn assemble_by_alias(
    document: &Document,
    stacks: &[Stack],
    options: &ResultOptions,
    mode: Mode,
) -> IndexMap<String, Vec<String>> {
    let unique = options.unique.unwrap_or(false);
    let mut groups: IndexMap<String, Vec<String>> = IndexMap::new();
    for stack in stacks {
        let items = results_for_stack(document, stack, options, mode, unique);
        groups
            .entry(stack.alias.clone())
            .or_default()
            .extend(items.into_iter().map(|item| item.text));
    }
    if unique {
        for texts in groups.values_mut() {
            let mut seen = std::collections::HashSet::new();
            texts.retain(|t| seen.insert(t.clone()));
        }
    }
    groups
}
