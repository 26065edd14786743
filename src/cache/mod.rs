// src/cache/mod.rs

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::{Arc, RwLock},
};
use tracing::{debug, info};

use crate::decode::{decode_file, RawTable};

/// Memoizing wrapper around the decoder, keyed by file path.
///
/// Both outcomes are memoized: a decoded table and the unavailable
/// sentinel. A missing file is therefore probed once per generation, not on
/// every redraw. `invalidate` starts a new generation; the next request for
/// any path re-runs the decoder against the filesystem.
///
/// The decoder itself stays cache-free; this layer wraps it from outside.
#[derive(Default)]
pub struct DatasetCache {
    entries: RwLock<HashMap<PathBuf, Option<Arc<RawTable>>>>,
}

impl DatasetCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve the memoized decode result for `path`, decoding on first
    /// request. `None` means the source is unavailable.
    pub fn get_or_load(&self, path: &Path) -> Option<Arc<RawTable>> {
        if let Some(entry) = self.entries.read().unwrap().get(path) {
            debug!(path = %path.display(), "cache hit");
            return entry.clone();
        }

        let loaded = decode_file(path).map(Arc::new);
        let mut entries = self.entries.write().unwrap();
        // Another caller may have raced us here; the first insert wins so
        // every holder shares one table.
        entries
            .entry(path.to_path_buf())
            .or_insert(loaded)
            .clone()
    }

    /// Drop every memoized entry, both tables and unavailable sentinels.
    pub fn invalidate(&self) {
        let mut entries = self.entries.write().unwrap();
        info!(entries = entries.len(), "cache invalidated");
        entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_csv(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn serves_memoized_table_after_file_changes() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(&dir, "data.csv", "a,b\n1,2\n");
        let cache = DatasetCache::new();

        let first = cache.get_or_load(&path).unwrap();
        assert_eq!(first.rows.len(), 1);

        // The file grows, but the memoized result is served untouched.
        fs::write(&path, "a,b\n1,2\n3,4\n").unwrap();
        let second = cache.get_or_load(&path).unwrap();
        assert_eq!(second.rows.len(), 1);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn memoizes_unavailable_sentinel() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing.csv");
        let cache = DatasetCache::new();

        assert!(cache.get_or_load(&path).is_none());
        assert_eq!(cache.len(), 1);

        // The file appears afterwards, but the sentinel is still served.
        fs::write(&path, "a,b\n1,2\n").unwrap();
        assert!(cache.get_or_load(&path).is_none());
    }

    #[test]
    fn invalidate_forces_reload() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(&dir, "data.csv", "a,b\n1,2\n");
        let cache = DatasetCache::new();

        assert!(cache.get_or_load(&path).is_some());
        fs::write(&path, "a,b\n1,2\n3,4\n").unwrap();

        cache.invalidate();
        assert!(cache.is_empty());

        let reloaded = cache.get_or_load(&path).unwrap();
        assert_eq!(reloaded.rows.len(), 2);
    }

    #[test]
    fn invalidate_clears_sentinels_too() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("late.csv");
        let cache = DatasetCache::new();

        assert!(cache.get_or_load(&path).is_none());
        fs::write(&path, "a,b\n1,2\n").unwrap();

        cache.invalidate();
        assert!(cache.get_or_load(&path).is_some());
    }
}
