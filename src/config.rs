//! Configuration file handling.
//!
//! Settings are read from a TOML file. Every key is optional and command-line
//! flags take precedence over the file.
//!
//! # Configuration Location
//!
//! - Linux: `~/.config/lockguard/config.toml`
//! - macOS: `~/Library/Application Support/lockguard/config.toml`
//! - Windows: `%APPDATA%\lockguard\config.toml`
//!
//! # Example Configuration
//!
//! ```toml
//! rules_url = "https://example.com/compromised.json"
//! cache_ttl_hours = 1
//! default_format = "table"
//! lockfile_names = ["package-lock.json", "npm-shrinkwrap.json"]
//! exclude_dirs = ["node_modules", ".git"]
//! log_format = "pretty"
//!
//! [ignore]
//! packages = ["@internal/*"]
//! ```

use crate::error::{Error, Result};
use crate::scanner::{DEFAULT_EXCLUDE_DIRS, DEFAULT_LOCKFILE_NAMES};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Application configuration.
///
/// ```no_run
/// use lockguard::Config;
///
/// let config = Config::load()?;
/// println!("Rules from: {:?}", config.rules_url);
/// # Ok::<(), lockguard::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// URL of the rule feed.
    pub rules_url: Option<String>,

    /// Local rule feed. Takes precedence over `rules_url`.
    pub rules_file: Option<PathBuf>,

    /// How long a downloaded feed is reused, in hours. 0 disables the cache.
    ///
    /// Default: 1 hour
    pub cache_ttl_hours: u64,

    /// Timeout for the feed download.
    ///
    /// Default: 30 seconds
    pub request_timeout_secs: u64,

    /// File names collected when walking directories.
    pub lockfile_names: Vec<String>,

    /// Directory names never descended into.
    pub exclude_dirs: Vec<String>,

    /// Output format when no `--format` flag is given.
    ///
    /// Valid values: "table", "json", "sarif", "github"
    pub default_format: String,

    /// Read lockfiles concurrently.
    pub parallel: bool,

    /// Log filter used when `RUST_LOG` is unset.
    pub log_level: String,

    /// One of "pretty", "compact", "json".
    pub log_format: String,

    /// Findings to suppress.
    pub ignore: IgnoreConfig,
}

/// Packages whose findings are dropped from the report.
///
/// Use this for accepted risks or known false positives.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IgnoreConfig {
    /// Package names to ignore. Supports glob patterns (e.g., "@internal/*").
    pub packages: Vec<String>,
}

impl IgnoreConfig {
    /// Check if findings for a package should be suppressed.
    pub fn should_ignore_package(&self, name: &str) -> bool {
        self.packages.iter().any(|pattern| {
            if pattern.contains('*') {
                glob_match(pattern, name)
            } else {
                pattern == name
            }
        })
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}

/// Simple glob matching (supports * as wildcard).
fn glob_match(pattern: &str, text: &str) -> bool {
    let parts: Vec<&str> = pattern.split('*').collect();

    if parts.len() == 1 {
        return pattern == text;
    }

    let mut remaining = text;

    let first = parts[0];
    if !first.is_empty() {
        let Some(rest) = remaining.strip_prefix(first) else {
            return false;
        };
        remaining = rest;
    }

    let last = parts[parts.len() - 1];
    if !last.is_empty() {
        let Some(rest) = remaining.strip_suffix(last) else {
            return false;
        };
        remaining = rest;
    }

    for part in &parts[1..parts.len() - 1] {
        if part.is_empty() {
            continue;
        }
        match remaining.find(part) {
            Some(pos) => remaining = &remaining[pos + part.len()..],
            None => return false,
        }
    }

    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rules_url: None,
            rules_file: None,
            cache_ttl_hours: 1,
            request_timeout_secs: crate::rules::source::DEFAULT_TIMEOUT_SECS,
            lockfile_names: DEFAULT_LOCKFILE_NAMES.iter().map(|s| s.to_string()).collect(),
            exclude_dirs: DEFAULT_EXCLUDE_DIRS.iter().map(|s| s.to_string()).collect(),
            default_format: "table".to_string(),
            parallel: true,
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            ignore: IgnoreConfig::default(),
        }
    }
}

impl Config {
    /// Loads configuration from the config file.
    ///
    /// If the config file doesn't exist, returns default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Loads configuration from `path`, falling back to defaults when the
    /// file is absent.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Saves the configuration to the config file.
    ///
    /// Creates the parent directory if it doesn't exist.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let io_err = |source| Error::Io {
            path: path.display().to_string(),
            source,
        };

        if let Some(parent) = path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent).map_err(io_err)?;
            }
        }

        let content = toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))?;
        fs::write(path, content).map_err(io_err)?;
        Ok(())
    }

    /// Checks values the type system cannot.
    pub fn validate(&self) -> Result<()> {
        const LOG_FORMATS: &[&str] = &["pretty", "compact", "json"];

        if !LOG_FORMATS.contains(&self.log_format.as_str()) {
            return Err(Error::Config(format!(
                "unknown log_format '{}', expected one of: {}",
                self.log_format,
                LOG_FORMATS.join(", ")
            )));
        }
        if self.lockfile_names.is_empty() {
            return Err(Error::Config("lockfile_names must not be empty".to_string()));
        }
        self.default_format
            .parse::<crate::output::OutputFormat>()
            .map_err(Error::Config)?;
        Ok(())
    }

    /// Returns the path to the configuration file.
    ///
    /// ```
    /// use lockguard::Config;
    ///
    /// let path = Config::config_path();
    /// assert!(path.ends_with("lockguard/config.toml"));
    /// ```
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("lockguard")
            .join("config.toml")
    }

    /// Generates a string containing the default configuration.
    pub fn generate_default_config() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_glob_match_exact() {
        assert!(glob_match("lodash", "lodash"));
        assert!(!glob_match("lodash", "underscore"));
    }

    #[test]
    fn test_glob_match_prefix() {
        assert!(glob_match("lodash*", "lodash"));
        assert!(glob_match("lodash*", "lodash.debounce"));
        assert!(!glob_match("lodash*", "underscore"));
    }

    #[test]
    fn test_glob_match_suffix() {
        assert!(glob_match("*-cli", "typescript-cli"));
        assert!(!glob_match("*-cli", "typescript"));
    }

    #[test]
    fn test_glob_match_contains() {
        assert!(glob_match("*lodash*", "my-lodash-plugin"));
        assert!(!glob_match("*lodash*", "underscore"));
    }

    #[test]
    fn test_glob_match_scoped() {
        assert!(glob_match("@internal/*", "@internal/ui"));
        assert!(!glob_match("@internal/*", "@acme/bad"));
    }

    #[test]
    fn test_ignore_config_packages() {
        let ignore = IgnoreConfig {
            packages: vec!["left-pad".to_string(), "@internal/*".to_string()],
        };

        assert!(ignore.should_ignore_package("left-pad"));
        assert!(ignore.should_ignore_package("@internal/ui"));
        assert!(!ignore.should_ignore_package("@acme/bad"));
        assert!(!IgnoreConfig::default().should_ignore_package("left-pad"));
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();

        assert_eq!(config.cache_ttl_hours, 1);
        assert_eq!(config.request_timeout_secs, 30);
        assert_eq!(config.default_format, "table");
        assert_eq!(
            config.lockfile_names,
            vec!["package-lock.json", "npm-shrinkwrap.json"]
        );
        assert_eq!(config.exclude_dirs, vec!["node_modules", ".git"]);
        assert!(config.parallel);
        assert!(config.rules_url.is_none());
        assert!(config.ignore.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "rules_url = \"https://example.com/feed.json\"\n\n[ignore]\npackages = [\"left-pad\"]\n",
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();

        assert_eq!(config.rules_url.as_deref(), Some("https://example.com/feed.json"));
        assert_eq!(config.ignore.packages, vec!["left-pad"]);
        assert_eq!(config.cache_ttl_hours, 1);
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "cache_ttl_hours = \"soon\"").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_unknown_format_is_rejected() {
        let config = Config {
            default_format: "xml".to_string(),
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let config = Config {
            log_format: "fancy".to_string(),
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = Config {
            rules_file: Some(PathBuf::from("/srv/rules.json")),
            parallel: false,
            ..Config::default()
        };

        config.save_to(&path).unwrap();

        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_generated_default_config_parses() {
        let text = Config::generate_default_config();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed, Config::default());
    }
}
