//! Domain-set cache store.
//!
//! Persists the parsed domain set as a flat list, one domain per line, no
//! header, so later launches skip re-parsing the raw block list. The cache is
//! a pure performance shortcut: it is only ever written from a successful
//! fresh parse and is overwritten wholesale.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{AdBlockError, CacheErrorKind, Result};

/// File-backed store for the parsed domain list.
pub struct CacheStore {
    path: PathBuf,
}

impl CacheStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Read the cached domain list, one domain per line. No dedupe guarantee;
    /// engine construction tolerates duplicates. Callers treat any failure as
    /// a cache miss, never as fatal.
    pub fn read(&self) -> Result<Vec<String>> {
        let text = fs::read_to_string(&self.path).map_err(|e| AdBlockError::CacheError {
            kind: CacheErrorKind::ReadFailed,
            message: format!("Failed to read cache '{}': {}", self.path.display(), e),
        })?;

        Ok(text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }

    /// Overwrite the cache wholesale. Goes through a sibling temporary file
    /// and a rename so a crash mid-write never leaves a truncated cache.
    pub fn write<I, S>(&self, domains: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let map_err = |e: std::io::Error| AdBlockError::CacheError {
            kind: CacheErrorKind::WriteFailed,
            message: format!("Failed to write cache '{}': {}", self.path.display(), e),
        };

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(map_err)?;
            }
        }

        let tmp_path = self.path.with_extension("tmp");
        {
            let mut file = fs::File::create(&tmp_path).map_err(map_err)?;
            for domain in domains {
                writeln!(file, "{}", domain.as_ref()).map_err(map_err)?;
            }
            file.flush().map_err(map_err)?;
        }

        fs::rename(&tmp_path, &self.path).map_err(map_err)
    }
}
