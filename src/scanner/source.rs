use crate::error::{Error, Result};
use std::ffi::OsStr;
use std::path::PathBuf;
use walkdir::WalkDir;

/// Lockfile names collected by default.
pub const DEFAULT_LOCKFILE_NAMES: &[&str] = &["package-lock.json", "npm-shrinkwrap.json"];

/// Directory names never descended into by default.
pub const DEFAULT_EXCLUDE_DIRS: &[&str] = &["node_modules", ".git"];

/// Supplies the lockfiles to scan.
pub trait FileSource: Send + Sync {
    /// Returns lockfile paths in scan order. An empty list is not an error.
    ///
    /// Listing is synchronous and may block on the filesystem. [`run`]
    /// calls it through `block_in_place` on a multi-threaded runtime.
    ///
    /// [`run`]: crate::scanner::run
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if a requested root cannot be accessed.
    fn list(&self) -> Result<Vec<PathBuf>>;
}

/// A fixed list of lockfiles.
#[derive(Debug, Clone, Default)]
pub struct ExplicitFiles(pub Vec<PathBuf>);

impl FileSource for ExplicitFiles {
    fn list(&self) -> Result<Vec<PathBuf>> {
        Ok(self.0.clone())
    }
}

/// Finds lockfiles under a set of root paths.
///
/// Roots that are files are returned as-is. Directories are walked in file
/// name order, skipping excluded directory names below the root.
///
/// # Example
///
/// ```no_run
/// use lockguard::scanner::{FileSource, LockfileFinder};
///
/// let finder = LockfileFinder::new(vec![".".into()]);
/// for path in finder.list()? {
///     println!("{}", path.display());
/// }
/// # Ok::<(), lockguard::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct LockfileFinder {
    roots: Vec<PathBuf>,
    lockfile_names: Vec<String>,
    exclude_dirs: Vec<String>,
}

impl LockfileFinder {
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self {
            roots,
            lockfile_names: DEFAULT_LOCKFILE_NAMES.iter().map(|s| s.to_string()).collect(),
            exclude_dirs: DEFAULT_EXCLUDE_DIRS.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn with_lockfile_names(mut self, names: Vec<String>) -> Self {
        self.lockfile_names = names;
        self
    }

    pub fn with_exclude_dirs(mut self, dirs: Vec<String>) -> Self {
        self.exclude_dirs = dirs;
        self
    }

    fn is_lockfile(&self, file_name: &OsStr) -> bool {
        file_name
            .to_str()
            .is_some_and(|name| self.lockfile_names.iter().any(|n| n == name))
    }

    fn is_excluded(&self, dir_name: &OsStr) -> bool {
        dir_name
            .to_str()
            .is_some_and(|name| self.exclude_dirs.iter().any(|d| d == name))
    }
}

impl FileSource for LockfileFinder {
    fn list(&self) -> Result<Vec<PathBuf>> {
        let mut found = Vec::new();

        for root in &self.roots {
            let metadata = std::fs::metadata(root).map_err(|source| Error::Io {
                path: root.display().to_string(),
                source,
            })?;

            if metadata.is_file() {
                found.push(root.clone());
                continue;
            }

            let entries = WalkDir::new(root)
                .sort_by_file_name()
                .into_iter()
                .filter_entry(|entry| {
                    entry.depth() == 0
                        || !(entry.file_type().is_dir() && self.is_excluded(entry.file_name()))
                });

            for entry in entries {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(err) => {
                        tracing::warn!(error = %err, "skipping unreadable directory entry");
                        continue;
                    }
                };
                if entry.file_type().is_file() && self.is_lockfile(entry.file_name()) {
                    found.push(entry.into_path());
                }
            }
        }

        tracing::debug!(count = found.len(), "lockfile discovery finished");
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(dir: &TempDir, relative: &str) -> PathBuf {
        let path = dir.path().join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "{}").unwrap();
        path
    }

    #[test]
    fn test_finds_lockfiles_in_name_order() {
        let dir = TempDir::new().unwrap();
        let b = touch(&dir, "b/package-lock.json");
        let a = touch(&dir, "a/npm-shrinkwrap.json");
        let root = touch(&dir, "package-lock.json");
        touch(&dir, "a/package.json");

        let found = LockfileFinder::new(vec![dir.path().to_path_buf()])
            .list()
            .unwrap();

        assert_eq!(found, vec![a, b, root]);
    }

    #[test]
    fn test_skips_excluded_directories() {
        let dir = TempDir::new().unwrap();
        let kept = touch(&dir, "app/package-lock.json");
        touch(&dir, "app/node_modules/dep/package-lock.json");
        touch(&dir, ".git/package-lock.json");

        let found = LockfileFinder::new(vec![dir.path().to_path_buf()])
            .list()
            .unwrap();

        assert_eq!(found, vec![kept]);
    }

    #[test]
    fn test_custom_names_and_excludes() {
        let dir = TempDir::new().unwrap();
        touch(&dir, "package-lock.json");
        let vendored = touch(&dir, "node_modules/x/custom-lock.json");

        let found = LockfileFinder::new(vec![dir.path().to_path_buf()])
            .with_lockfile_names(vec!["custom-lock.json".to_string()])
            .with_exclude_dirs(Vec::new())
            .list()
            .unwrap();

        assert_eq!(found, vec![vendored]);
    }

    #[test]
    fn test_file_roots_are_taken_as_is() {
        let dir = TempDir::new().unwrap();
        let odd = touch(&dir, "locks/whatever.json");

        let found = LockfileFinder::new(vec![odd.clone()]).list().unwrap();

        assert_eq!(found, vec![odd]);
    }

    #[test]
    fn test_missing_root_is_an_error() {
        let dir = TempDir::new().unwrap();
        let err = LockfileFinder::new(vec![dir.path().join("nope")])
            .list()
            .unwrap_err();

        assert!(matches!(err, Error::Io { .. }));
    }

    #[test]
    fn test_empty_tree_is_not_an_error() {
        let dir = TempDir::new().unwrap();
        let found = LockfileFinder::new(vec![dir.path().to_path_buf()])
            .list()
            .unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn test_explicit_files() {
        let files = ExplicitFiles(vec![PathBuf::from("a.json"), PathBuf::from("b.json")]);
        assert_eq!(files.list().unwrap().len(), 2);
    }
}
