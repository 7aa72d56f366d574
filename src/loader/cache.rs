//! Memoized dataset loading.
//!
//! A loaded table is reused for as long as the file at the same path keeps the
//! same modification time. Entries are only dropped by an explicit refresh.

use super::{load_table, LoadError};
use crate::models::Table;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;
use tracing::debug;

#[derive(Debug, Clone)]
struct CachedTable {
    modified: SystemTime,
    table: Arc<Table>,
}

/// Cache of loaded tables keyed by path and modification time.
#[derive(Debug, Default)]
pub struct TableCache {
    entries: HashMap<PathBuf, CachedTable>,
}

impl TableCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached table for `path`, loading it on a miss.
    ///
    /// A different modification time than the cached one counts as a miss
    /// and replaces the entry.
    pub fn get_or_load(&mut self, path: &Path) -> Result<Arc<Table>, LoadError> {
        let modified = modification_time(path)?;

        if let Some(entry) = self.entries.get(path) {
            if entry.modified == modified {
                debug!("Cache hit for {}", path.display());
                return Ok(Arc::clone(&entry.table));
            }
            debug!("Cache entry for {} is stale", path.display());
        }

        let table = Arc::new(load_table(path)?);
        self.entries.insert(
            path.to_path_buf(),
            CachedTable {
                modified,
                table: Arc::clone(&table),
            },
        );

        Ok(table)
    }

    /// Drop the entry for `path`. Returns whether one existed.
    #[allow(dead_code)] // Explicit invalidation for long-lived callers
    pub fn refresh(&mut self, path: &Path) -> bool {
        self.entries.remove(path).is_some()
    }

    #[allow(dead_code)] // Cache diagnostics
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[allow(dead_code)] // Cache diagnostics
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn modification_time(path: &Path) -> Result<SystemTime, LoadError> {
    std::fs::metadata(path)
        .and_then(|meta| meta.modified())
        .map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::tests::SAMPLE;
    use std::io::Write;
    use std::time::Duration;

    fn sample_file() -> tempfile::NamedTempFile {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        write!(tmp, "{}", SAMPLE).unwrap();
        tmp.flush().unwrap();
        tmp
    }

    #[test]
    fn test_second_load_is_cache_hit() {
        let tmp = sample_file();
        let mut cache = TableCache::new();

        let first = cache.get_or_load(tmp.path()).unwrap();
        let second = cache.get_or_load(tmp.path()).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_refresh_forces_reload() {
        let tmp = sample_file();
        let mut cache = TableCache::new();

        let first = cache.get_or_load(tmp.path()).unwrap();
        assert!(cache.refresh(tmp.path()));
        assert!(cache.is_empty());
        assert!(!cache.refresh(tmp.path()));

        let second = cache.get_or_load(tmp.path()).unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(*first, *second);
    }

    #[test]
    fn test_changed_modification_time_reloads() {
        let tmp = sample_file();
        let mut cache = TableCache::new();

        let first = cache.get_or_load(tmp.path()).unwrap();
        tmp.as_file()
            .set_modified(SystemTime::now() + Duration::from_secs(60))
            .unwrap();
        let second = cache.get_or_load(tmp.path()).unwrap();

        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_failed_load_is_not_cached() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        write!(tmp, "instant,dteday\n").unwrap();
        let mut cache = TableCache::new();

        assert!(matches!(
            cache.get_or_load(tmp.path()),
            Err(LoadError::Schema { .. })
        ));
        assert!(cache.is_empty());
    }
}
