//! Wiring configuration.
//!
//! The host application builds the whole filtering core from one config
//! value during startup sequencing and injects the returned handles into its
//! renderer adapters; nothing in the crate is reached through global lookup.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cache::CacheStore;
use crate::engine::DEFAULT_VERDICT_CACHE_SIZE;
use crate::error::{AdBlockError, Result};
use crate::lazy::{LazyEngine, DEFAULT_ENGINE_WAIT};
use crate::loader::{AdBlockLoader, FileListSource};
use crate::policy::{InterceptPolicy, PolicyConfig};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Raw block-list file.
    pub list_path: PathBuf,
    /// Parsed-domain cache file.
    pub cache_path: PathBuf,
    /// Bound, in milliseconds, on how long an interception callback waits
    /// for engine construction before failing open.
    pub engine_wait_ms: u64,
    /// Capacity of the per-host verdict cache.
    pub verdict_cache_size: usize,
    /// Hosts served by the in-app content pipeline.
    pub app_hosts: Vec<String>,
    /// Image hosts that bypass the block check.
    pub trusted_image_hosts: Vec<String>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        let policy = PolicyConfig::default();
        Self {
            list_path: PathBuf::from("adblock/easylist.txt"),
            cache_path: PathBuf::from("adblock-domains.cache"),
            engine_wait_ms: DEFAULT_ENGINE_WAIT.as_millis() as u64,
            verdict_cache_size: DEFAULT_VERDICT_CACHE_SIZE,
            app_hosts: policy.app_hosts,
            trusted_image_hosts: policy.trusted_image_hosts,
        }
    }
}

impl FilterConfig {
    /// Load from a JSON file. Absent fields fall back to defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        serde_json::from_str(&text).map_err(|e| {
            AdBlockError::ConfigError(format!(
                "Failed to parse config '{}': {}",
                path.display(),
                e
            ))
        })
    }

    /// Assemble the filtering core: loader → coordinator → policy. The
    /// coordinator handle is shared; clone it into any adapter that needs
    /// direct engine access, and call `prewarm` once startup sequencing
    /// allows.
    pub fn wire(&self) -> (LazyEngine, InterceptPolicy) {
        let loader = AdBlockLoader::new(FileListSource::new(&self.list_path))
            .with_cache(CacheStore::new(&self.cache_path))
            .with_verdict_cache_size(self.verdict_cache_size);
        let engine = LazyEngine::new(loader);
        let policy = InterceptPolicy::with_config(
            engine.clone(),
            PolicyConfig {
                app_hosts: self.app_hosts.clone(),
                trusted_image_hosts: self.trusted_image_hosts.clone(),
                engine_wait: Duration::from_millis(self.engine_wait_ms),
            },
        );
        (engine, policy)
    }
}
