//! Banned-version rules.
//!
//! The rule feed is a JSON array of `[name, range...]` tuples:
//!
//! ```json
//! [
//!   ["@acme/bad", "1.0.*"],
//!   ["@acme/bad", "^1.1.2"],
//!   ["evil-package", "*"]
//! ]
//! ```
//!
//! [`RuleSet::from_feed`] normalizes it into a name-to-patterns map, merging
//! repeated names in encounter order. Entries that are not arrays are
//! skipped with a [`Diagnostic::MalformedRuleEntry`] warning; a feed whose
//! top level is not an array is rejected with [`Error::FeedMalformed`].

pub mod source;

pub use source::{FileRuleSource, HttpRuleSource, RuleSource};

use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::error::{Error, Result};
use crate::matcher::RangePattern;
use serde_json::Value;
use std::collections::HashMap;

/// Longest rendering of a malformed entry kept in its diagnostic.
const ENTRY_PREVIEW_LEN: usize = 80;

/// Package name to banned version patterns.
///
/// Names are case-sensitive and may be scoped (`@scope/name`). A name is
/// only present when it has at least one pattern.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: HashMap<String, Vec<RangePattern>>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses and normalizes a raw feed body.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FeedMalformed`] if the body is not JSON or not an
    /// array.
    pub fn from_slice(bytes: &[u8], sink: &dyn DiagnosticSink) -> Result<Self> {
        let feed: Value =
            serde_json::from_slice(bytes).map_err(|e| Error::FeedMalformed(e.to_string()))?;
        Self::from_feed(&feed, sink)
    }

    /// Normalizes an already-parsed feed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FeedMalformed`] if `feed` is not an array.
    pub fn from_feed(feed: &Value, sink: &dyn DiagnosticSink) -> Result<Self> {
        let entries = feed.as_array().ok_or_else(|| {
            Error::FeedMalformed(format!(
                "expected a JSON array of [name, range...] entries, found {}",
                value_kind(feed)
            ))
        })?;

        let mut rules = Self::new();
        for (index, entry) in entries.iter().enumerate() {
            let name = entry
                .as_array()
                .and_then(|items| items.split_first())
                .and_then(|(name, patterns)| Some((scalar_to_string(name)?, patterns)));

            match name {
                Some((name, patterns)) if !name.is_empty() => {
                    let compiled: Vec<RangePattern> = patterns
                        .iter()
                        .filter_map(scalar_to_string)
                        .map(RangePattern::new)
                        .collect();
                    for pattern in compiled.iter().filter(|p| !p.is_valid()) {
                        sink.emit(Diagnostic::InvalidRangePattern {
                            name: name.clone(),
                            pattern: pattern.as_str().to_string(),
                        });
                    }
                    rules.insert_compiled(name, compiled);
                }
                _ => sink.emit(Diagnostic::MalformedRuleEntry {
                    index,
                    entry: preview(entry),
                }),
            }
        }

        Ok(rules)
    }

    /// Appends patterns for `name`, keeping any it already has.
    pub fn insert<N, I, P>(&mut self, name: N, patterns: I)
    where
        N: Into<String>,
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        self.insert_compiled(name.into(), patterns.into_iter().map(RangePattern::new).collect());
    }

    fn insert_compiled(&mut self, name: String, compiled: Vec<RangePattern>) {
        if compiled.is_empty() {
            return;
        }
        self.rules.entry(name).or_default().extend(compiled);
    }

    /// The patterns for `name`, or `None` if it has none.
    pub fn patterns(&self, name: &str) -> Option<&[RangePattern]> {
        self.rules.get(name).map(Vec::as_slice)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.rules.contains_key(name)
    }

    /// Number of packages with at least one pattern.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Total number of patterns across all packages.
    pub fn pattern_count(&self) -> usize {
        self.rules.values().map(Vec::len).sum()
    }
}

/// Coerces a scalar feed value to a string; containers and null are dropped.
fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn preview(value: &Value) -> String {
    let rendered = value.to_string();
    if rendered.chars().count() <= ENTRY_PREVIEW_LEN {
        return rendered;
    }
    let truncated: String = rendered.chars().take(ENTRY_PREVIEW_LEN - 3).collect();
    format!("{}...", truncated)
}
