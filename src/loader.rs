//! Block-list loading.
//!
//! Builds a [`FilterEngine`] from the raw list, going through the domain
//! cache when possible so later launches skip the full parse.

use std::fs;
use std::io::{BufRead, BufReader, Cursor};
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::cache::CacheStore;
use crate::engine::{FilterEngine, DEFAULT_VERDICT_CACHE_SIZE};
use crate::error::{AdBlockError, ListErrorKind, Result};
use crate::parser::parse_list_from_reader;

/// Source of the raw block-list text.
pub trait BlockListSource: Send + Sync {
    /// Open the raw list for line-by-line reading.
    fn open(&self) -> Result<Box<dyn BufRead + Send>>;
}

/// Reads the raw list from a file on disk.
pub struct FileListSource {
    path: PathBuf,
}

impl FileListSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl BlockListSource for FileListSource {
    fn open(&self) -> Result<Box<dyn BufRead + Send>> {
        let file = fs::File::open(&self.path).map_err(|e| AdBlockError::ListError {
            kind: ListErrorKind::Unreadable,
            message: format!("Failed to open block list '{}': {}", self.path.display(), e),
        })?;
        Ok(Box::new(BufReader::new(file)))
    }
}

/// In-memory source for tests and embedded lists.
pub struct MemoryListSource {
    text: String,
}

impl MemoryListSource {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl BlockListSource for MemoryListSource {
    fn open(&self) -> Result<Box<dyn BufRead + Send>> {
        Ok(Box::new(Cursor::new(self.text.clone().into_bytes())))
    }
}

/// Source that always fails to open; placeholder wiring for hosts that ship
/// without a block list.
pub struct NilListSource;

impl BlockListSource for NilListSource {
    fn open(&self) -> Result<Box<dyn BufRead + Send>> {
        Err(AdBlockError::ListError {
            kind: ListErrorKind::NotConfigured,
            message: "No block list source configured".to_string(),
        })
    }
}

/// One-shot builder for the filtering engine.
pub struct AdBlockLoader {
    source: Box<dyn BlockListSource>,
    cache: Option<CacheStore>,
    verdict_cache_size: usize,
}

impl AdBlockLoader {
    pub fn new(source: impl BlockListSource + 'static) -> Self {
        Self {
            source: Box::new(source),
            cache: None,
            verdict_cache_size: DEFAULT_VERDICT_CACHE_SIZE,
        }
    }

    /// Convenience constructor for the common file-list-plus-cache layout.
    pub fn from_paths(list_path: impl AsRef<Path>, cache_path: impl AsRef<Path>) -> Self {
        Self::new(FileListSource::new(list_path)).with_cache(CacheStore::new(cache_path))
    }

    pub fn with_cache(mut self, cache: CacheStore) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_verdict_cache_size(mut self, size: usize) -> Self {
        self.verdict_cache_size = size;
        self
    }

    /// Build the engine.
    ///
    /// Fast path: a readable cache replaces the parse entirely. Slow path:
    /// parse the raw list (fatal only if the source is unreadable), then
    /// write the cache back best-effort.
    pub fn load(&self) -> Result<FilterEngine> {
        if let Some(ref cache) = self.cache {
            if cache.exists() {
                match cache.read() {
                    Ok(domains) => {
                        let mut engine = self.new_engine();
                        engine.load_domains(&domains);
                        info!(
                            "loaded {} cached domains from '{}'",
                            engine.domain_count(),
                            cache.path().display()
                        );
                        return Ok(engine);
                    }
                    // Unreadable cache is a miss, not a failure.
                    Err(e) => warn!("ignoring unreadable domain cache: {}", e),
                }
            }
        }

        let reader = self.source.open()?;
        let domains = parse_list_from_reader(reader)?;
        info!("parsed block list: {} domains", domains.len());

        if let Some(ref cache) = self.cache {
            // The in-memory set stays usable if this fails; only future
            // launches lose the shortcut.
            if let Err(e) = cache.write(domains.iter()) {
                warn!("failed to write domain cache: {}", e);
            }
        }

        let mut engine = self.new_engine();
        engine.load_domains(domains.iter());
        Ok(engine)
    }

    fn new_engine(&self) -> FilterEngine {
        FilterEngine::with_verdict_cache_size(self.verdict_cache_size)
    }
}
