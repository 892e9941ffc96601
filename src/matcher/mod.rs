//! Matching concrete package versions against banned version ranges.
//!
//! [`match_version`] is the single entry point: given a package name and the
//! version string found in a lockfile, it returns every pattern from the
//! [`RuleSet`] that the version falls into.
//!
//! # Example
//!
//! ```
//! use lockguard::matcher::match_version;
//! use lockguard::rules::RuleSet;
//!
//! let mut rules = RuleSet::new();
//! rules.insert("@acme/bad", ["1.0.*", "^1.1.2"]);
//!
//! assert_eq!(
//!     match_version(&rules, "@acme/bad", "1.1.3"),
//!     Some(vec!["^1.1.2".to_string()])
//! );
//! assert_eq!(match_version(&rules, "@acme/bad", "2.0.0"), None);
//! ```

mod coerce;
mod range;

pub use coerce::coerce;
pub use range::Range;

use crate::rules::RuleSet;
use semver::Version;

/// The literal pattern that bans every version of a package.
pub const WILDCARD: &str = "*";

#[derive(Debug, Clone, PartialEq, Eq)]
enum PatternKind {
    Wildcard,
    Range(Range),
    Invalid,
}

/// A banned-version pattern from the rule feed, compiled once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangePattern {
    raw: String,
    kind: PatternKind,
}

impl RangePattern {
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let kind = if raw.trim() == WILDCARD {
            PatternKind::Wildcard
        } else {
            match Range::parse(&raw) {
                Some(range) => PatternKind::Range(range),
                None => PatternKind::Invalid,
            }
        };
        Self { raw, kind }
    }

    /// The pattern exactly as it appeared in the feed.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn is_wildcard(&self) -> bool {
        self.kind == PatternKind::Wildcard
    }

    /// False when the pattern could not be parsed; such patterns never match.
    pub fn is_valid(&self) -> bool {
        self.kind != PatternKind::Invalid
    }

    pub fn matches(&self, version: &Version) -> bool {
        match &self.kind {
            PatternKind::Wildcard => true,
            PatternKind::Range(range) => range.satisfies(version),
            PatternKind::Invalid => false,
        }
    }
}

impl std::fmt::Display for RangePattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Returns every pattern banning `version` of `name`, in rule order.
///
/// `None` means "not banned" and also covers the cases where no decision is
/// possible: the package has no rules, the version is empty, or the version
/// cannot be coerced. The one exception is a wildcard rule, which still fires
/// on an uncoercible version and yields `["*"]`.
pub fn match_version(rules: &RuleSet, name: &str, version: &str) -> Option<Vec<String>> {
    let patterns = rules.patterns(name)?;
    if version.is_empty() {
        return None;
    }

    let Some(coerced) = coerce(version) else {
        return patterns
            .iter()
            .any(RangePattern::is_wildcard)
            .then(|| vec![WILDCARD.to_string()]);
    };

    let matched: Vec<String> = patterns
        .iter()
        .filter(|pattern| pattern.matches(&coerced))
        .map(|pattern| pattern.as_str().to_string())
        .collect();

    (!matched.is_empty()).then_some(matched)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn acme_rules() -> RuleSet {
        let mut rules = RuleSet::new();
        rules.insert("@acme/bad", ["1.0.*", "^1.1.2"]);
        rules
    }

    #[test]
    fn test_unknown_package_never_matches() {
        let rules = acme_rules();
        assert_eq!(match_version(&rules, "left-pad", "1.0.5"), None);
        assert_eq!(match_version(&rules, "left-pad", "not-a-version"), None);
        assert_eq!(match_version(&rules, "@acme/BAD", "1.0.5"), None);
    }

    #[test]
    fn test_first_range_matches() {
        assert_eq!(
            match_version(&acme_rules(), "@acme/bad", "1.0.5"),
            Some(vec!["1.0.*".to_string()])
        );
    }

    #[test]
    fn test_second_range_matches() {
        assert_eq!(
            match_version(&acme_rules(), "@acme/bad", "1.1.3"),
            Some(vec!["^1.1.2".to_string()])
        );
    }

    #[test]
    fn test_outside_all_ranges() {
        assert_eq!(match_version(&acme_rules(), "@acme/bad", "2.0.0"), None);
    }

    #[test]
    fn test_prerelease_of_banned_version_matches() {
        assert_eq!(
            match_version(&acme_rules(), "@acme/bad", "1.1.2-beta.1"),
            Some(vec!["^1.1.2".to_string()])
        );
    }

    #[test]
    fn test_all_matching_ranges_are_returned() {
        let mut rules = RuleSet::new();
        rules.insert("evil", [">=1.0.0", "*", "2.x", "1.2.3"]);

        assert_eq!(
            match_version(&rules, "evil", "1.2.3"),
            Some(vec![
                ">=1.0.0".to_string(),
                "*".to_string(),
                "1.2.3".to_string()
            ])
        );
    }

    #[test]
    fn test_wildcard_matches_any_version() {
        let mut rules = RuleSet::new();
        rules.insert("evil-package", ["*"]);

        assert_eq!(
            match_version(&rules, "evil-package", "9.9.9"),
            Some(vec!["*".to_string()])
        );
        assert_eq!(
            match_version(&rules, "evil-package", "not-a-version"),
            Some(vec!["*".to_string()])
        );
    }

    #[test]
    fn test_padded_wildcard_fires_on_uncoercible_version() {
        let mut rules = RuleSet::new();
        rules.insert("evil-package", ["^2.0.0", " * "]);

        assert_eq!(
            match_version(&rules, "evil-package", "github:evil/pkg#main"),
            Some(vec!["*".to_string()])
        );
    }

    #[test]
    fn test_uncoercible_version_without_wildcard() {
        assert_eq!(match_version(&acme_rules(), "@acme/bad", "latest"), None);
    }

    #[test]
    fn test_empty_version_never_matches() {
        let mut rules = RuleSet::new();
        rules.insert("evil-package", ["*"]);
        assert_eq!(match_version(&rules, "evil-package", ""), None);
    }

    #[test]
    fn test_irregular_versions_are_coerced() {
        assert_eq!(
            match_version(&acme_rules(), "@acme/bad", "v1.0.2+build.5"),
            Some(vec!["1.0.*".to_string()])
        );
    }

    #[test]
    fn test_invalid_pattern_is_ignored() {
        let mut rules = RuleSet::new();
        rules.insert("evil", ["what even is this", "1.x"]);

        let patterns = rules.patterns("evil").unwrap();
        assert!(!patterns[0].is_valid());
        assert_eq!(
            match_version(&rules, "evil", "1.4.0"),
            Some(vec!["1.x".to_string()])
        );
    }
}
