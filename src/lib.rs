//! Detect known-compromised npm package versions in lockfiles.
//!
//! A rule feed lists package names with banned version ranges. lockguard
//! normalizes the feed into a [`RuleSet`], walks every `package-lock.json`
//! (or `npm-shrinkwrap.json`) it is given, and reports each occurrence of a
//! banned version as a [`Finding`].
//!
//! ```
//! use lockguard::diagnostics::MemorySink;
//! use lockguard::{walker, RuleSet};
//! use serde_json::json;
//! use std::path::Path;
//!
//! let feed = json!([["@acme/bad", "1.0.*", "^1.1.2"]]);
//! let rules = RuleSet::from_feed(&feed, &MemorySink::new())?;
//!
//! let lockfile = json!({
//!     "packages": {"node_modules/@acme/bad": {"version": "1.1.4"}}
//! });
//! let findings = walker::walk(&lockfile, Path::new("package-lock.json"), &rules);
//!
//! assert_eq!(findings[0].matched_ranges, vec!["^1.1.2"]);
//! # Ok::<(), lockguard::Error>(())
//! ```

pub mod cache;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod logging;
pub mod matcher;
pub mod model;
pub mod output;
pub mod rules;
pub mod scanner;
pub mod walker;

pub use cache::Cache;
pub use config::Config;
pub use error::{Error, Result};
pub use model::{Finding, ScanReport};
pub use rules::RuleSet;
pub use scanner::{ScanOutcome, Scanner};
