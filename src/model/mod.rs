//! Core data types for scan results.
//!
//! - [`Finding`] - one banned package version found in a lockfile
//! - [`ScanReport`] - every finding of a run, plus run statistics
//!
//! # Example
//!
//! ```
//! use lockguard::{Finding, ScanReport};
//!
//! let mut report = ScanReport::new("rules.json");
//! report.record_file(
//!     "package-lock.json",
//!     vec![Finding::new(
//!         "package-lock.json",
//!         "packages.@acme/bad",
//!         "@acme/bad",
//!         "1.0.2",
//!         vec!["1.0.*".to_string()],
//!     )],
//! );
//!
//! assert_eq!(report.count(), 1);
//! assert!(report.is_compromised());
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Location rendered for a match on the document root itself.
pub const ROOT_LOCATION: &str = "<root>";

/// One occurrence of a banned package version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    pub file: PathBuf,
    /// Dotted path to the matching node, or `<root>`.
    pub location: String,
    pub name: String,
    pub version: String,
    /// Every rule pattern the version fell into, in rule order.
    pub matched_ranges: Vec<String>,
}

impl Finding {
    pub fn new(
        file: impl Into<PathBuf>,
        location: impl Into<String>,
        name: impl Into<String>,
        version: impl Into<String>,
        matched_ranges: Vec<String>,
    ) -> Self {
        let location = location.into();
        Self {
            file: file.into(),
            location: if location.is_empty() {
                ROOT_LOCATION.to_string()
            } else {
                location
            },
            name: name.into(),
            version: version.into(),
            matched_ranges,
        }
    }

    /// `name@version`, the way npm prints it.
    pub fn package_spec(&self) -> String {
        format!("{}@{}", self.name, self.version)
    }
}

/// Findings of one run, in file scan order then document order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    pub scan_time: DateTime<Utc>,
    /// Where the rules came from.
    pub rules_source: String,
    /// Number of packages with at least one banned range.
    pub rule_packages: usize,
    pub files_scanned: Vec<PathBuf>,
    pub files_skipped: Vec<PathBuf>,
    /// Findings dropped by the ignore list.
    pub suppressed: usize,
    pub findings: Vec<Finding>,
}

impl ScanReport {
    pub fn new(rules_source: impl Into<String>) -> Self {
        Self {
            scan_time: Utc::now(),
            rules_source: rules_source.into(),
            rule_packages: 0,
            files_scanned: Vec::new(),
            files_skipped: Vec::new(),
            suppressed: 0,
            findings: Vec::new(),
        }
    }

    /// Appends the findings of one scanned file.
    pub fn record_file(&mut self, file: impl AsRef<Path>, findings: Vec<Finding>) {
        self.files_scanned.push(file.as_ref().to_path_buf());
        self.findings.extend(findings);
    }

    /// Notes a file that could not be scanned.
    pub fn record_skipped(&mut self, file: impl AsRef<Path>) {
        self.files_skipped.push(file.as_ref().to_path_buf());
    }

    /// Total number of findings.
    pub fn count(&self) -> usize {
        self.findings.len()
    }

    /// True when at least one banned version was found.
    pub fn is_compromised(&self) -> bool {
        !self.findings.is_empty()
    }
}
