//! Diagnostic events raised while building rules and scanning lockfiles.
//!
//! The rule normalizer and the scanner never log directly. They hand every
//! event to a [`DiagnosticSink`], which lets library users decide where
//! warnings go. The binary installs [`TracingSink`]; tests use
//! [`MemorySink`] to assert on what was reported.

use serde::Serialize;
use std::path::PathBuf;
use std::sync::Mutex;

/// A single diagnostic event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// A rule feed entry was not a `[name, range...]` array and was skipped.
    MalformedRuleEntry { index: usize, entry: String },
    /// A range pattern could not be parsed. It is kept but never matches.
    InvalidRangePattern { name: String, pattern: String },
    /// The feed produced no rules, so there is nothing to check.
    EmptyRuleSet,
    /// A lockfile could not be parsed as JSON and was skipped.
    InvalidLockfile { path: PathBuf, reason: String },
    /// A lockfile could not be read and was skipped.
    UnreadableLockfile { path: PathBuf, reason: String },
    /// No lockfiles were found under the scanned roots.
    NoLockfiles,
    /// A lockfile was scanned.
    LockfileScanned { path: PathBuf, findings: usize },
}

/// Severity of a [`Diagnostic`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Debug,
    Info,
    Warn,
}

impl Diagnostic {
    pub fn level(&self) -> Level {
        match self {
            Diagnostic::MalformedRuleEntry { .. }
            | Diagnostic::InvalidRangePattern { .. }
            | Diagnostic::InvalidLockfile { .. }
            | Diagnostic::UnreadableLockfile { .. } => Level::Warn,
            Diagnostic::EmptyRuleSet | Diagnostic::NoLockfiles => Level::Info,
            Diagnostic::LockfileScanned { .. } => Level::Debug,
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Diagnostic::MalformedRuleEntry { index, entry } => {
                write!(f, "skipping malformed rule entry #{}: {}", index, entry)
            }
            Diagnostic::InvalidRangePattern { name, pattern } => {
                write!(f, "range '{}' for {} cannot be parsed and never matches", pattern, name)
            }
            Diagnostic::EmptyRuleSet => write!(f, "rule feed is empty, nothing to check"),
            Diagnostic::InvalidLockfile { path, reason } => {
                write!(f, "skipping {}: invalid JSON: {}", path.display(), reason)
            }
            Diagnostic::UnreadableLockfile { path, reason } => {
                write!(f, "skipping {}: {}", path.display(), reason)
            }
            Diagnostic::NoLockfiles => write!(f, "no lockfiles found"),
            Diagnostic::LockfileScanned { path, findings } => {
                write!(f, "scanned {} ({} findings)", path.display(), findings)
            }
        }
    }
}

/// Receiver for diagnostic events.
pub trait DiagnosticSink: Send + Sync {
    fn emit(&self, diagnostic: Diagnostic);
}

/// Forwards diagnostics to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn emit(&self, diagnostic: Diagnostic) {
        match &diagnostic {
            Diagnostic::MalformedRuleEntry { index, entry } => {
                tracing::warn!(index, entry = %entry, "skipping malformed rule entry");
            }
            Diagnostic::InvalidRangePattern { name, pattern } => {
                tracing::warn!(package = %name, pattern = %pattern, "unparseable range never matches");
            }
            Diagnostic::EmptyRuleSet => {
                tracing::info!("rule feed is empty, nothing to check");
            }
            Diagnostic::InvalidLockfile { path, reason } => {
                tracing::warn!(path = %path.display(), reason = %reason, "skipping invalid lockfile");
            }
            Diagnostic::UnreadableLockfile { path, reason } => {
                tracing::warn!(path = %path.display(), reason = %reason, "skipping unreadable lockfile");
            }
            Diagnostic::NoLockfiles => {
                tracing::info!("no lockfiles found");
            }
            Diagnostic::LockfileScanned { path, findings } => {
                tracing::debug!(path = %path.display(), findings, "scanned lockfile");
            }
        }
    }
}

/// Records diagnostics in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<Diagnostic>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of every recorded event, in emission order.
    pub fn events(&self) -> Vec<Diagnostic> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Returns the recorded events at warning level.
    pub fn warnings(&self) -> Vec<Diagnostic> {
        self.events()
            .into_iter()
            .filter(|d| d.level() == Level::Warn)
            .collect()
    }
}

impl DiagnosticSink for MemorySink {
    fn emit(&self, diagnostic: Diagnostic) {
        if let Ok(mut events) = self.events.lock() {
            events.push(diagnostic);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_sink_preserves_order() {
        let sink = MemorySink::new();
        sink.emit(Diagnostic::NoLockfiles);
        sink.emit(Diagnostic::EmptyRuleSet);

        assert_eq!(
            sink.events(),
            vec![Diagnostic::NoLockfiles, Diagnostic::EmptyRuleSet]
        );
    }

    #[test]
    fn test_warnings_filter() {
        let sink = MemorySink::new();
        sink.emit(Diagnostic::LockfileScanned {
            path: PathBuf::from("package-lock.json"),
            findings: 0,
        });
        sink.emit(Diagnostic::InvalidLockfile {
            path: PathBuf::from("broken/package-lock.json"),
            reason: "expected value at line 1 column 1".to_string(),
        });

        let warnings = sink.warnings();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].to_string().contains("broken/package-lock.json"));
    }

    #[test]
    fn test_levels() {
        assert_eq!(Diagnostic::EmptyRuleSet.level(), Level::Info);
        assert_eq!(
            Diagnostic::MalformedRuleEntry {
                index: 0,
                entry: "\"oops\"".to_string()
            }
            .level(),
            Level::Warn
        );
    }
}
