//! Recursive lockfile traversal.
//!
//! npm lockfiles come in two shapes: the legacy nested tree
//! (`dependencies.foo.dependencies.bar`) and the flat path-keyed map
//! (`packages["node_modules/foo/node_modules/bar"]`). The walker assumes
//! neither. It visits every JSON object and looks for two kinds of package
//! occurrence:
//!
//! 1. an object carrying both `name` and `version`;
//! 2. an object-valued entry whose key, reduced to its package name, has
//!    rules and whose value carries a `version`.
//!
//! Both kinds are reported independently, so one package can produce several
//! findings within a single document. Objects held in arrays are visited
//! too, addressed by their index (`list.0`).

use crate::matcher::match_version;
use crate::model::Finding;
use crate::rules::RuleSet;
use serde_json::{Map, Value};
use std::path::Path;

/// Walks `document` and returns every banned occurrence, in document order.
///
/// Scalar roots contain no occurrences.
///
/// # Example
///
/// ```
/// use lockguard::rules::RuleSet;
/// use lockguard::walker::walk;
/// use serde_json::json;
/// use std::path::Path;
///
/// let mut rules = RuleSet::new();
/// rules.insert("@acme/bad", ["1.0.*", "^1.1.2"]);
///
/// let doc = json!({"dependencies": {"node_modules/@acme/bad": {"version": "1.0.2"}}});
/// let findings = walk(&doc, Path::new("package-lock.json"), &rules);
///
/// assert_eq!(findings.len(), 1);
/// assert_eq!(findings[0].location, "dependencies.@acme/bad");
/// ```
pub fn walk(document: &Value, file: &Path, rules: &RuleSet) -> Vec<Finding> {
    let mut walker = Walker {
        file,
        rules,
        findings: Vec::new(),
    };
    walker.descend(document, "");
    walker.findings
}

/// Reduces a lockfile key to the package name it refers to.
///
/// The last `/`-separated segment is the name, and the segment before it is
/// kept when it is an npm scope (`@scope`). Only one scope segment is ever
/// kept, so in deeply nested keys such as
/// `node_modules/a/node_modules/@scope/b` everything above the innermost
/// package is dropped.
///
/// ```
/// use lockguard::walker::normalize_package_key;
///
/// assert_eq!(normalize_package_key("node_modules/@acme/bad"), "@acme/bad");
/// assert_eq!(normalize_package_key("node_modules/foo"), "foo");
/// assert_eq!(normalize_package_key("lodash"), "lodash");
/// ```
pub fn normalize_package_key(key: &str) -> &str {
    let mut segments = key.rsplitn(3, '/');
    let name = segments.next().unwrap_or(key);

    match segments.next() {
        Some(scope) if scope.starts_with('@') => {
            let start = key.len() - name.len() - scope.len() - 1;
            &key[start..]
        }
        _ => name,
    }
}

struct Walker<'a> {
    file: &'a Path,
    rules: &'a RuleSet,
    findings: Vec<Finding>,
}

impl Walker<'_> {
    fn descend(&mut self, value: &Value, path: &str) {
        match value {
            Value::Object(node) => self.visit(node, path),
            Value::Array(items) => {
                for (index, item) in items.iter().enumerate() {
                    if item.is_object() || item.is_array() {
                        self.descend(item, &join_path(path, &index.to_string()));
                    }
                }
            }
            _ => {}
        }
    }

    fn visit(&mut self, node: &Map<String, Value>, path: &str) {
        if let (Some(Value::String(name)), Some(version)) = (node.get("name"), node.get("version"))
        {
            self.check(path.to_string(), name, version);
        }

        for (key, child) in node {
            let Value::Object(child) = child else {
                continue;
            };
            let name = normalize_package_key(key);
            if !self.rules.contains(name) {
                continue;
            }
            if let Some(version) = child.get("version") {
                self.check(join_path(path, name), name, version);
            }
        }

        for (key, child) in node {
            if child.is_object() || child.is_array() {
                self.descend(child, &join_path(path, normalize_package_key(key)));
            }
        }
    }

    fn check(&mut self, location: String, name: &str, version: &Value) {
        let Value::String(version) = version else {
            return;
        };
        if let Some(matched_ranges) = match_version(self.rules, name, version) {
            self.findings.push(Finding::new(
                self.file,
                location,
                name,
                version.as_str(),
                matched_ranges,
            ));
        }
    }
}

fn join_path(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", path, key)
    }
}
