//! Local data set cache.

use std::path::{Path, PathBuf};

/// Maps data set identifiers to local cache directories.
///
/// Existence of an identifier's directory is the sole cache-hit signal:
/// contents are never checksummed or re-validated. A process interrupted
/// between directory creation and complete extraction leaves an entry that
/// reads as populated; such directories must be deleted by hand (or via
/// `clear_cache` on the loaders) before refetching.
#[derive(Debug, Clone)]
pub struct CacheStore {
    root: PathBuf,
}

impl CacheStore {
    /// Create a store rooted at `root`. No I/O is performed.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory holding one entry per data set.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Local directory for `name`. Pure path join, no I/O.
    #[must_use]
    pub fn local_path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    /// Whether `name`'s directory exists.
    #[must_use]
    pub fn is_populated(&self, name: &str) -> bool {
        self.local_path(name).is_dir()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_path_joins_the_identifier() {
        let store = CacheStore::new("/var/cache/tsload");
        assert_eq!(
            store.local_path("ArrowHead"),
            PathBuf::from("/var/cache/tsload/ArrowHead")
        );
    }

    #[test]
    fn is_populated_tracks_directory_existence() {
        let root = tempfile::tempdir().unwrap();
        let store = CacheStore::new(root.path());

        assert!(!store.is_populated("GunPoint"));
        std::fs::create_dir(root.path().join("GunPoint")).unwrap();
        assert!(store.is_populated("GunPoint"));
    }

    #[test]
    fn a_plain_file_is_not_a_populated_entry() {
        let root = tempfile::tempdir().unwrap();
        std::fs::write(root.path().join("GunPoint"), b"not a directory").unwrap();

        let store = CacheStore::new(root.path());
        assert!(!store.is_populated("GunPoint"));
    }
}
