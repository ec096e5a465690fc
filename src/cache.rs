// Process-wide cache of raw source tables.
//
// A table is re-read only when the file's modification time changes, so
// repeated report runs in one session do not re-parse the workbooks.
use crate::error::{ReportError, Result};
use crate::loader::read_table;
use crate::normalize::RawTable;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::SystemTime;
use tracing::debug;

struct CachedTable {
    modified: SystemTime,
    table: Arc<RawTable>,
}

static TABLE_CACHE: Lazy<Mutex<HashMap<PathBuf, CachedTable>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

fn modified_time(path: &Path) -> Result<SystemTime> {
    std::fs::metadata(path)
        .and_then(|m| m.modified())
        .map_err(|e| ReportError::io(path, e))
}

/// Return the raw table for `path`, reading it only if it is not cached or
/// has changed on disk since it was cached.
pub fn load_cached(path: &Path) -> Result<Arc<RawTable>> {
    let modified = modified_time(path)?;
    {
        let cache = TABLE_CACHE.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(entry) = cache.get(path) {
            if entry.modified == modified {
                debug!(path = %path.display(), "source cache hit");
                return Ok(Arc::clone(&entry.table));
            }
        }
    }

    debug!(path = %path.display(), "source cache miss");
    let table = Arc::new(read_table(path)?);
    let mut cache = TABLE_CACHE.lock().unwrap_or_else(|e| e.into_inner());
    cache.insert(
        path.to_path_buf(),
        CachedTable {
            modified,
            table: Arc::clone(&table),
        },
    );
    Ok(table)
}

/// Drop every cached table.
pub fn clear() {
    TABLE_CACHE
        .lock()
        .unwrap_or_else(|e| e.into_inner())
        .clear();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cached_table_is_shared_until_file_changes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("costs.csv");
        std::fs::write(&path, "Cultivo,Tipo Insumo,Total\nMaize,Seed,10\n").unwrap();

        let first = load_cached(&path).unwrap();
        let second = load_cached(&path).unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        // Force a different mtime rather than relying on filesystem timestamp resolution.
        let file = std::fs::OpenOptions::new().write(true).open(&path).unwrap();
        file.set_modified(SystemTime::UNIX_EPOCH).unwrap();
        drop(file);

        let third = load_cached(&path).unwrap();
        assert!(!Arc::ptr_eq(&first, &third));
        assert_eq!(*first, *third);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_cached(&dir.path().join("absent.csv")).unwrap_err();
        assert!(matches!(err, ReportError::Io { .. }));
    }
}
