//! File-based caching for downloaded rule feeds.
//!
//! Feeds are fetched on every CI run, so the raw body is cached for a short
//! TTL to avoid hammering the feed host when many jobs run in a row.
//!
//! # Cache Location
//!
//! The cache is stored in platform-specific directories:
//! - Linux: `~/.cache/lockguard/`
//! - macOS: `~/Library/Caches/lockguard/`
//! - Windows: `%LOCALAPPDATA%\lockguard\`
//!
//! # Example
//!
//! ```no_run
//! use lockguard::Cache;
//!
//! let cache = Cache::new();
//!
//! cache.set("feed_example", &"[]".to_string()).unwrap();
//!
//! let value: Option<String> = cache.get("feed_example");
//! assert_eq!(value, Some("[]".to_string()));
//! ```

use anyhow::Result;
use serde::{de::DeserializeOwned, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

/// Default cache TTL in hours.
const CACHE_TTL_HOURS: u64 = 1;

/// A file-based cache with TTL support.
///
/// Values are stored as JSON files in the cache directory. Each entry
/// expires after the configured TTL period.
#[derive(Debug, Clone)]
pub struct Cache {
    dir: PathBuf,
    ttl: Duration,
}

impl Cache {
    /// Creates a new cache with the default 1-hour TTL.
    pub fn new() -> Self {
        Self::with_ttl_hours(CACHE_TTL_HOURS)
    }

    /// Creates a new cache in the default directory with a custom TTL.
    ///
    /// # Example
    ///
    /// ```
    /// use lockguard::Cache;
    ///
    /// let cache = Cache::with_ttl_hours(6);
    /// ```
    pub fn with_ttl_hours(hours: u64) -> Self {
        Self::in_dir(cache_dir(), Duration::from_secs(hours * 3600))
    }

    /// Creates a cache rooted at `dir`.
    pub fn in_dir(dir: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            dir: dir.into(),
            ttl,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn ensure_dir(&self) -> Result<()> {
        if !self.dir.exists() {
            fs::create_dir_all(&self.dir)?;
        }
        Ok(())
    }

    /// Converts a cache key to a safe filename.
    fn cache_path(&self, key: &str) -> PathBuf {
        let safe_key: String = key
            .chars()
            .map(|c| {
                if c.is_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{}.json", safe_key))
    }

    /// Retrieves a value from the cache.
    ///
    /// Returns `None` if the key doesn't exist, has expired, or cannot be
    /// decoded as `T`.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let path = self.cache_path(key);

        if !path.exists() {
            return None;
        }

        if let Ok(modified) = fs::metadata(&path).and_then(|m| m.modified()) {
            if let Ok(elapsed) = SystemTime::now().duration_since(modified) {
                if elapsed > self.ttl {
                    let _ = fs::remove_file(&path);
                    return None;
                }
            }
        }

        let content = fs::read_to_string(&path).ok()?;
        serde_json::from_str(&content).ok()
    }

    /// Stores a value in the cache.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache directory cannot be created or
    /// the file cannot be written.
    pub fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        self.ensure_dir()?;
        let path = self.cache_path(key);
        let content = serde_json::to_string(value)?;
        fs::write(&path, content)?;
        Ok(())
    }

    /// Clears all cached entries.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache directory cannot be read.
    pub fn clear(&self) -> Result<()> {
        if self.dir.exists() {
            for entry in fs::read_dir(&self.dir)?.flatten() {
                let path = entry.path();
                if path.extension().map(|e| e == "json").unwrap_or(false) {
                    let _ = fs::remove_file(path);
                }
            }
        }
        Ok(())
    }
}

impl Default for Cache {
    fn default() -> Self {
        Self::new()
    }
}

/// Returns the cache directory for lockguard.
///
/// Falls back to `/tmp/lockguard/` if no cache directory can be determined.
pub fn cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join("lockguard")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_set_then_get() {
        let dir = TempDir::new().unwrap();
        let cache = Cache::in_dir(dir.path(), Duration::from_secs(60));

        cache
            .set("feed_https://example.test/rules.json", &"[]".to_string())
            .unwrap();

        let value: Option<String> = cache.get("feed_https://example.test/rules.json");
        assert_eq!(value.as_deref(), Some("[]"));
    }

    #[test]
    fn test_missing_key() {
        let dir = TempDir::new().unwrap();
        let cache = Cache::in_dir(dir.path(), Duration::from_secs(60));

        assert_eq!(cache.get::<String>("nope"), None);
    }

    #[test]
    fn test_expired_entry_is_removed() {
        let dir = TempDir::new().unwrap();
        let cache = Cache::in_dir(dir.path(), Duration::ZERO);
        cache.set("stale", &"[]".to_string()).unwrap();

        std::thread::sleep(Duration::from_millis(50));

        assert_eq!(cache.get::<String>("stale"), None);
        assert!(!cache.cache_path("stale").exists());
    }

    #[test]
    fn test_clear_removes_entries() {
        let dir = TempDir::new().unwrap();
        let cache = Cache::in_dir(dir.path().join("nested"), Duration::from_secs(60));
        cache.set("a", &1u32).unwrap();
        cache.set("b", &2u32).unwrap();

        cache.clear().unwrap();

        assert_eq!(cache.get::<u32>("a"), None);
        assert_eq!(cache.get::<u32>("b"), None);
    }

    #[test]
    fn test_cache_path_is_sanitized() {
        let cache = Cache::in_dir("/tmp/lockguard-test", Duration::from_secs(1));
        let path = cache.cache_path("feed_https://x.test/a?b=c");
        assert_eq!(
            path.file_name().and_then(|n| n.to_str()),
            Some("feed_https___x_test_a_b_c.json")
        );
    }
}
