//! Durable on-disk tier: one JSON document per cache key.

use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

use log::{debug, warn};

use super::CacheRecord;
use crate::errors::CacheError;

const EXTENSION: &str = "json";

#[derive(Debug)]
pub(crate) struct DiskTier {
    dir: PathBuf,
}

impl DiskTier {
    /// Open the tier, creating the directory if needed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, CacheError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| CacheError::io(&dir, e))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", key, EXTENSION))
    }

    /// Read the record for `key`.
    ///
    /// Missing and unreadable files are a miss. A file that does not parse is
    /// removed so that it stops shadowing future writes.
    pub fn load(&self, key: &str) -> Option<CacheRecord> {
        let path = self.path(key);
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return None,
            Err(e) => {
                warn!("Failed to read cache file {}: {}", path.display(), e);
                return None;
            }
        };

        match serde_json::from_str(&contents) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!("Removing corrupted cache file {}: {}", path.display(), e);
                self.remove_path(&path);
                None
            }
        }
    }

    /// Write the record through a temporary file and rename it into place,
    /// so readers never observe a partial document.
    pub fn store(&self, record: &CacheRecord) -> Result<(), CacheError> {
        let path = self.path(&record.cache_key);
        let temp_path = self.dir.join(format!(
            ".{}.{:08x}.tmp",
            record.cache_key,
            rand::random::<u32>()
        ));

        let bytes = serde_json::to_vec_pretty(record)?;
        let written = fs::write(&temp_path, bytes).and_then(|_| fs::rename(&temp_path, &path));
        if let Err(e) = written {
            let _ = fs::remove_file(&temp_path);
            return Err(CacheError::io(&path, e));
        }
        Ok(())
    }

    pub fn remove(&self, key: &str) -> bool {
        self.remove_path(&self.path(key))
    }

    fn remove_path(&self, path: &Path) -> bool {
        match fs::remove_file(path) {
            Ok(()) => true,
            Err(e) if e.kind() == ErrorKind::NotFound => false,
            Err(e) => {
                warn!("Failed to remove cache file {}: {}", path.display(), e);
                false
            }
        }
    }

    fn record_files(&self) -> io::Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == EXTENSION) {
                files.push(path);
            }
        }
        Ok(files)
    }

    /// Remove records, optionally only those of one method. Returns the count removed.
    ///
    /// Filtering by method has to open each file; files that cannot be
    /// parsed are left for the next `load` to clean up.
    pub fn clear(&self, method: Option<&str>) -> usize {
        let files = match self.record_files() {
            Ok(files) => files,
            Err(e) => {
                warn!("Failed to list cache directory {}: {}", self.dir.display(), e);
                return 0;
            }
        };

        let mut removed = 0;
        for path in files {
            if let Some(method) = method {
                let matches = fs::read_to_string(&path)
                    .ok()
                    .and_then(|contents| serde_json::from_str::<CacheRecord>(&contents).ok())
                    .is_some_and(|record| record.method_name == method);
                if !matches {
                    continue;
                }
            }
            if self.remove_path(&path) {
                removed += 1;
            }
        }
        debug!("Removed {} durable cache record(s)", removed);
        removed
    }

    pub fn count(&self) -> usize {
        self.record_files().map(|files| files.len()).unwrap_or(0)
    }
}
