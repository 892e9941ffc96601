//! Lockfile scanning.
//!
//! [`run`] ties the pieces together: it fetches and normalizes the rule
//! feed, lists lockfiles from a [`FileSource`], and walks each one with a
//! [`Scanner`].
//!
//! # Example
//!
//! ```no_run
//! use lockguard::diagnostics::TracingSink;
//! use lockguard::rules::FileRuleSource;
//! use lockguard::scanner::{run, LockfileFinder, ScanOptions, ScanOutcome};
//!
//! #[tokio::main]
//! async fn main() -> lockguard::Result<()> {
//!     let rules = FileRuleSource::new("compromised.json");
//!     let files = LockfileFinder::new(vec![".".into()]);
//!
//!     match run(&rules, &files, ScanOptions::default(), &TracingSink).await? {
//!         ScanOutcome::NothingToCheck => println!("no rules"),
//!         ScanOutcome::Completed(report) => println!("{} findings", report.count()),
//!     }
//!     Ok(())
//! }
//! ```

mod source;

pub use source::{ExplicitFiles, FileSource, LockfileFinder, DEFAULT_EXCLUDE_DIRS, DEFAULT_LOCKFILE_NAMES};

use crate::config::IgnoreConfig;
use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::error::{Error, Result};
use crate::model::{Finding, ScanReport};
use crate::rules::{RuleSet, RuleSource};
use crate::walker::walk;
use futures::stream::{self, StreamExt};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tokio::runtime::{Handle, RuntimeFlavor};

/// Upper bound on lockfiles read at the same time.
const MAX_CONCURRENT_READS: usize = 16;

/// How a scan is carried out.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Read lockfiles concurrently. Results keep file order either way.
    pub parallel: bool,
    /// Findings for these packages are counted as suppressed, not reported.
    pub ignore: IgnoreConfig,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            parallel: true,
            ignore: IgnoreConfig::default(),
        }
    }
}

/// Result of [`run`].
#[derive(Debug)]
pub enum ScanOutcome {
    /// The rule feed held no usable rules. No lockfile was read.
    NothingToCheck,
    Completed(ScanReport),
}

/// Checks lockfiles against one normalized rule set.
pub struct Scanner {
    rules: RuleSet,
    rules_source: String,
    options: ScanOptions,
}

impl Scanner {
    pub fn new(rules: RuleSet, rules_source: impl Into<String>) -> Self {
        Self {
            rules,
            rules_source: rules_source.into(),
            options: ScanOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ScanOptions) -> Self {
        self.options = options;
        self
    }

    /// Walks an already parsed lockfile. Returns the reported findings and
    /// the number suppressed by the ignore list.
    pub fn scan_document(&self, document: &Value, file: &Path) -> (Vec<Finding>, usize) {
        let findings = walk(document, file, &self.rules);
        if self.options.ignore.is_empty() {
            return (findings, 0);
        }

        let total = findings.len();
        let kept: Vec<Finding> = findings
            .into_iter()
            .filter(|f| !self.options.ignore.should_ignore_package(&f.name))
            .collect();
        let suppressed = total - kept.len();
        (kept, suppressed)
    }

    /// Scans `paths` in order. Files that cannot be read or parsed are
    /// reported to `sink` and skipped.
    pub async fn scan_files(&self, paths: &[PathBuf], sink: &dyn DiagnosticSink) -> ScanReport {
        let mut report = ScanReport::new(&self.rules_source);
        report.rule_packages = self.rules.len();

        let concurrency = if self.options.parallel {
            MAX_CONCURRENT_READS
        } else {
            1
        };
        // At most `concurrency` documents are held at once. Each is dropped
        // after its walk.
        let mut loaded = std::pin::pin!(stream::iter(paths)
            .map(|path| async move { (path, load_lockfile(path).await) })
            .buffered(concurrency));

        while let Some((path, document)) = loaded.next().await {
            match document {
                Ok(document) => {
                    let (findings, suppressed) = self.scan_document(&document, path);
                    sink.emit(Diagnostic::LockfileScanned {
                        path: path.clone(),
                        findings: findings.len(),
                    });
                    report.suppressed += suppressed;
                    report.record_file(path, findings);
                }
                Err(err) => {
                    sink.emit(skip_diagnostic(path, err));
                    report.record_skipped(path);
                }
            }
        }

        report
    }
}

/// Reads and parses one lockfile.
///
/// # Errors
///
/// Returns [`Error::Io`] if the file cannot be read and
/// [`Error::InvalidJson`] if it is not JSON.
pub async fn load_lockfile(path: &Path) -> Result<Value> {
    let bytes = tokio::fs::read(path).await.map_err(|source| Error::Io {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_slice(&bytes).map_err(|e| Error::InvalidJson {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

/// Lists lockfiles without stalling the runtime's worker on a large tree.
fn list_files(file_source: &dyn FileSource) -> Result<Vec<PathBuf>> {
    match Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
            tokio::task::block_in_place(|| file_source.list())
        }
        _ => file_source.list(),
    }
}

fn skip_diagnostic(path: &Path, err: Error) -> Diagnostic {
    match err {
        Error::InvalidJson { reason, .. } => Diagnostic::InvalidLockfile {
            path: path.to_path_buf(),
            reason,
        },
        Error::Io { source, .. } => Diagnostic::UnreadableLockfile {
            path: path.to_path_buf(),
            reason: source.to_string(),
        },
        other => Diagnostic::UnreadableLockfile {
            path: path.to_path_buf(),
            reason: other.to_string(),
        },
    }
}

/// Runs a full scan.
///
/// # Errors
///
/// Fails only when the rule feed is unavailable or malformed, or the file
/// source cannot list its roots. Individual bad lockfiles are skipped.
pub async fn run(
    rule_source: &dyn RuleSource,
    file_source: &dyn FileSource,
    options: ScanOptions,
    sink: &dyn DiagnosticSink,
) -> Result<ScanOutcome> {
    let body = rule_source.fetch().await?;
    let rules = RuleSet::from_slice(&body, sink)?;

    if rules.is_empty() {
        sink.emit(Diagnostic::EmptyRuleSet);
        return Ok(ScanOutcome::NothingToCheck);
    }
    tracing::debug!(
        packages = rules.len(),
        patterns = rules.pattern_count(),
        "rule set ready"
    );

    let paths = list_files(file_source)?;
    if paths.is_empty() {
        sink.emit(Diagnostic::NoLockfiles);
    }

    let scanner = Scanner::new(rules, rule_source.describe()).with_options(options);
    Ok(ScanOutcome::Completed(scanner.scan_files(&paths, sink).await))
}
