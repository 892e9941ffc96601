//! npm-style version ranges.
//!
//! Supported syntax:
//! - `1.2.3`, `=1.2.3`, `v1.2.3` - exact match
//! - `^1.2.3` - compatible with version (>=1.2.3 <2.0.0)
//! - `~1.2.3`, `~>1.2.3` - approximately equivalent (>=1.2.3 <1.3.0)
//! - `>=1.2.3`, `>1.2.3`, `<=1.2.3`, `<1.2.3` - comparison operators
//! - `1.2.x`, `1.0.*`, `1.x`, `1`, `*` - wildcards and partial versions
//! - `1.0.0 - 2.0.0` - hyphen ranges
//! - `>=1.0.0 <2.0.0` - space-separated intersections
//! - `^1.0.0 || ^2.0.0` - unions
//!
//! Ranges are desugared into sets of primitive comparators, then evaluated
//! with pre-release versions included: `^1.0.0` matches `1.5.0-alpha`.

use semver::{Prerelease, Version};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Comparator {
    op: Op,
    version: Version,
}

impl Comparator {
    fn new(op: Op, version: Version) -> Self {
        Self { op, version }
    }

    /// A comparator no version satisfies; nothing sorts below `0.0.0-0`.
    fn never() -> Option<Self> {
        floor(0, 0, 0).map(|v| Self::new(Op::Lt, v))
    }

    fn matches(&self, version: &Version) -> bool {
        match self.op {
            Op::Lt => *version < self.version,
            Op::Le => *version <= self.version,
            Op::Gt => *version > self.version,
            Op::Ge => *version >= self.version,
            Op::Eq => *version == self.version,
        }
    }
}

/// A parsed version range: a union of comparator intersections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Range {
    sets: Vec<Vec<Comparator>>,
}

impl Range {
    /// Parses an npm range expression. Returns `None` if any part is invalid.
    pub fn parse(input: &str) -> Option<Self> {
        let sets = input
            .split("||")
            .map(parse_set)
            .collect::<Option<Vec<_>>>()?;
        Some(Self { sets })
    }

    /// Returns true if `version` falls inside the range.
    pub fn satisfies(&self, version: &Version) -> bool {
        self.sets
            .iter()
            .any(|set| set.iter().all(|c| c.matches(version)))
    }
}

fn parse_set(input: &str) -> Option<Vec<Comparator>> {
    let tokens = tokenize(input);

    if let [from, dash, to] = tokens.as_slice() {
        if dash == "-" {
            let mut set = Partial::parse(from)?.at_least()?;
            set.extend(Partial::parse(to)?.at_most()?);
            return Some(set);
        }
    }

    let mut set = Vec::new();
    for token in &tokens {
        set.extend(parse_comparator(token)?);
    }
    Some(set)
}

/// Splits on whitespace, gluing a bare operator (`>= 1.2.3`) to its operand.
fn tokenize(input: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut pending: Option<&str> = None;

    for word in input.split_whitespace() {
        match pending.take() {
            Some(op) => tokens.push(format!("{}{}", op, word)),
            None if is_operator(word) => pending = Some(word),
            None => tokens.push(word.to_string()),
        }
    }

    if let Some(op) = pending {
        tokens.push(op.to_string());
    }

    tokens
}

fn is_operator(word: &str) -> bool {
    matches!(word, "<" | "<=" | ">" | ">=" | "=" | "^" | "~" | "~>")
}

fn split_operator(token: &str) -> (&str, &str) {
    for op in ["<=", ">=", "~>", "<", ">", "=", "^", "~"] {
        if let Some(rest) = token.strip_prefix(op) {
            return (op, rest);
        }
    }
    ("", token)
}

fn parse_comparator(token: &str) -> Option<Vec<Comparator>> {
    let (op, rest) = split_operator(token);
    let partial = Partial::parse(rest)?;

    match op {
        "" | "=" => partial.x_range(),
        "^" => partial.caret(),
        "~" | "~>" => partial.tilde(),
        ">" => partial.greater_than(),
        ">=" => partial.at_least(),
        "<" => partial.less_than(),
        "<=" => partial.at_most(),
        _ => None,
    }
}

/// `major.minor.patch-0`, the lowest version with that release triple.
fn floor(major: u64, minor: u64, patch: u64) -> Option<Version> {
    let mut version = Version::new(major, minor, patch);
    version.pre = Prerelease::new("0").ok()?;
    Some(version)
}

/// A possibly incomplete version; `None` components are wildcards.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Partial {
    major: Option<u64>,
    minor: Option<u64>,
    patch: Option<u64>,
    pre: Prerelease,
}

impl Partial {
    fn parse(input: &str) -> Option<Self> {
        let input = input.trim().trim_start_matches(['v', 'V', '=']);

        // Build metadata never affects matching.
        let input = input.split_once('+').map_or(input, |(head, _)| head);
        let (core, pre) = match input.split_once('-') {
            Some((core, pre)) => (core, Some(pre)),
            None => (input, None),
        };

        let mut parts = core.split('.');
        let major = component(parts.next())?;
        let minor = component(parts.next())?;
        let patch = component(parts.next())?;
        if parts.next().is_some() {
            return None;
        }

        // Everything after the first wildcard is a wildcard too.
        let minor = major.and(minor);
        let patch = minor.and(patch);

        let pre = match pre {
            Some(_) if patch.is_none() => return None,
            Some(pre) => Prerelease::new(pre).ok()?,
            None => Prerelease::EMPTY,
        };

        Some(Self {
            major,
            minor,
            patch,
            pre,
        })
    }

    fn exact(&self) -> Option<Version> {
        let mut version = Version::new(self.major?, self.minor?, self.patch?);
        version.pre = self.pre.clone();
        Some(version)
    }

    /// The first version after the wildcard part is exhausted, as a floor.
    fn bumped(&self) -> Option<Version> {
        match (self.major, self.minor) {
            (Some(major), None) => floor(major.checked_add(1)?, 0, 0),
            (Some(major), Some(minor)) => floor(major, minor.checked_add(1)?, 0),
            (None, _) => None,
        }
    }

    /// The lowest version the partial covers.
    fn lowest(&self) -> Option<Version> {
        match self.exact() {
            Some(version) => Some(version),
            None => floor(self.major?, self.minor.unwrap_or(0), 0),
        }
    }

    fn is_full(&self) -> bool {
        self.patch.is_some()
    }

    fn is_any(&self) -> bool {
        self.major.is_none()
    }

    fn x_range(&self) -> Option<Vec<Comparator>> {
        if self.is_any() {
            return Some(Vec::new());
        }
        if self.is_full() {
            return Some(vec![Comparator::new(Op::Eq, self.exact()?)]);
        }
        Some(vec![
            Comparator::new(Op::Ge, self.lowest()?),
            Comparator::new(Op::Lt, self.bumped()?),
        ])
    }

    fn caret(&self) -> Option<Vec<Comparator>> {
        let Some(major) = self.major else {
            return Some(Vec::new());
        };

        let upper = match (major, self.minor, self.patch) {
            (0, Some(0), Some(patch)) => floor(0, 0, patch.checked_add(1)?)?,
            (0, Some(minor), _) => floor(0, minor.checked_add(1)?, 0)?,
            _ => floor(major.checked_add(1)?, 0, 0)?,
        };

        Some(vec![
            Comparator::new(Op::Ge, self.lowest()?),
            Comparator::new(Op::Lt, upper),
        ])
    }

    fn tilde(&self) -> Option<Vec<Comparator>> {
        let Some(major) = self.major else {
            return Some(Vec::new());
        };

        let upper = match self.minor {
            Some(minor) => floor(major, minor.checked_add(1)?, 0)?,
            None => floor(major.checked_add(1)?, 0, 0)?,
        };

        Some(vec![
            Comparator::new(Op::Ge, self.lowest()?),
            Comparator::new(Op::Lt, upper),
        ])
    }

    fn greater_than(&self) -> Option<Vec<Comparator>> {
        if self.is_any() {
            return Some(vec![Comparator::never()?]);
        }
        if self.is_full() {
            return Some(vec![Comparator::new(Op::Gt, self.exact()?)]);
        }
        Some(vec![Comparator::new(Op::Ge, self.bumped()?)])
    }

    fn at_least(&self) -> Option<Vec<Comparator>> {
        if self.is_any() {
            return Some(Vec::new());
        }
        Some(vec![Comparator::new(Op::Ge, self.lowest()?)])
    }

    fn less_than(&self) -> Option<Vec<Comparator>> {
        if self.is_any() {
            return Some(vec![Comparator::never()?]);
        }
        Some(vec![Comparator::new(Op::Lt, self.lowest()?)])
    }

    fn at_most(&self) -> Option<Vec<Comparator>> {
        if self.is_any() {
            return Some(Vec::new());
        }
        if self.is_full() {
            return Some(vec![Comparator::new(Op::Le, self.exact()?)]);
        }
        Some(vec![Comparator::new(Op::Lt, self.bumped()?)])
    }
}

/// Parses one dotted component: missing or `x`/`X`/`*` is a wildcard.
fn component(part: Option<&str>) -> Option<Option<u64>> {
    match part {
        None | Some("x") | Some("X") | Some("*") => Some(None),
        Some(digits) if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) => {
            digits.parse().ok().map(Some)
        }
        Some(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn satisfies(range: &str, version: &str) -> bool {
        let range = Range::parse(range).unwrap_or_else(|| panic!("invalid range {range}"));
        range.satisfies(&Version::parse(version).unwrap())
    }

    #[test]
    fn test_exact() {
        assert!(satisfies("1.2.3", "1.2.3"));
        assert!(satisfies("=1.2.3", "1.2.3"));
        assert!(satisfies("v1.2.3", "1.2.3"));
        assert!(!satisfies("1.2.3", "1.2.4"));
    }

    #[test]
    fn test_wildcards() {
        assert!(satisfies("*", "0.0.1"));
        assert!(satisfies("1.0.*", "1.0.5"));
        assert!(!satisfies("1.0.*", "1.1.3"));
        assert!(satisfies("1.x", "1.9.0"));
        assert!(!satisfies("1.x", "2.0.0"));
        assert!(satisfies("2", "2.4.1"));
        assert!(satisfies("1.2.X", "1.2.0"));
    }

    #[test]
    fn test_caret() {
        assert!(satisfies("^1.1.2", "1.1.3"));
        assert!(satisfies("^1.1.2", "1.9.9"));
        assert!(!satisfies("^1.1.2", "1.1.1"));
        assert!(!satisfies("^1.1.2", "2.0.0"));
        assert!(satisfies("^0.2.3", "0.2.9"));
        assert!(!satisfies("^0.2.3", "0.3.0"));
        assert!(satisfies("^0.0.3", "0.0.3"));
        assert!(!satisfies("^0.0.3", "0.0.4"));
        assert!(satisfies("^1.2", "1.5.0"));
        assert!(satisfies("^0.2", "0.2.7"));
        assert!(!satisfies("^0.2", "0.3.0"));
    }

    #[test]
    fn test_tilde() {
        assert!(satisfies("~1.2.3", "1.2.9"));
        assert!(!satisfies("~1.2.3", "1.3.0"));
        assert!(!satisfies("~1.2.3", "1.2.2"));
        assert!(satisfies("~1", "1.8.0"));
        assert!(satisfies("~>1.2.3", "1.2.4"));
    }

    #[test]
    fn test_comparison_operators() {
        assert!(satisfies(">=1.0.0", "1.0.0"));
        assert!(!satisfies(">=1.0.0", "0.9.9"));
        assert!(satisfies(">1.0.0", "1.0.1"));
        assert!(!satisfies(">1.0.0", "1.0.0"));
        assert!(satisfies("<=1.0.0", "1.0.0"));
        assert!(!satisfies("<=1.0.0", "1.0.1"));
        assert!(satisfies("<1.0.0", "0.9.9"));
        assert!(!satisfies("<1.0.0", "1.0.0"));
    }

    #[test]
    fn test_partial_comparisons() {
        assert!(satisfies(">1", "2.0.0"));
        assert!(!satisfies(">1", "1.9.9"));
        assert!(satisfies("<=1.2", "1.2.9"));
        assert!(!satisfies("<=1.2", "1.3.0"));
        assert!(!satisfies("<2", "2.0.0"));
    }

    #[test]
    fn test_intersection_and_union() {
        assert!(satisfies(">=1.0.0 <2.0.0", "1.5.0"));
        assert!(!satisfies(">=1.0.0 <2.0.0", "2.0.0"));
        assert!(satisfies(">= 1.0.0 < 2.0.0", "1.0.0"));
        assert!(satisfies("^1.0.0 || ^3.0.0", "3.1.0"));
        assert!(!satisfies("^1.0.0 || ^3.0.0", "2.1.0"));
    }

    #[test]
    fn test_hyphen() {
        assert!(satisfies("1.0.0 - 2.0.0", "1.0.0"));
        assert!(satisfies("1.0.0 - 2.0.0", "2.0.0"));
        assert!(!satisfies("1.0.0 - 2.0.0", "2.0.1"));
        assert!(satisfies("1.0 - 2", "2.9.9"));
        assert!(!satisfies("1.0 - 2", "3.0.0"));
    }

    #[test]
    fn test_prereleases_are_included() {
        assert!(satisfies("^1.0.0", "1.5.0-alpha"));
        assert!(satisfies(">=1.0.0-beta", "1.0.0-rc.1"));
        assert!(satisfies("1.0.*", "1.0.0-beta.1"));
        assert!(!satisfies("^1.0.0", "2.0.0-alpha"));
    }

    #[test]
    fn test_never_matching() {
        assert!(!satisfies(">*", "1.0.0"));
        assert!(!satisfies("<*", "0.0.0"));
    }

    #[test]
    fn test_invalid_ranges() {
        assert!(Range::parse("banana").is_none());
        assert!(Range::parse("1.2.3.4").is_none());
        assert!(Range::parse(">=1.x-beta").is_none());
        assert!(Range::parse("^1.2.3 || nope").is_none());
    }
}
