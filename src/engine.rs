//! Filtering engine.
//!
//! Immutable domain matcher queried synchronously from every interception
//! callback. Built once per process from the domain set; after construction
//! the only mutable state is the per-host verdict cache.

use std::num::NonZeroUsize;

use lru::LruCache;
use parking_lot::Mutex;
use url::Url;

use crate::types::DomainSet;

/// Default capacity of the per-host verdict cache.
pub const DEFAULT_VERDICT_CACHE_SIZE: usize = 1024;

/// Hosts that are never blocking candidates: loopback-class addresses and
/// the hosts the embedded-content server serves in-app assets from. Takes
/// precedence over every rule in the domain set.
const INTERNAL_HOSTS: &[&str] = &[
    "localhost",
    "127.0.0.1",
    "::1",
    "[::1]",
    "0.0.0.0",
    "0.0.0.1",
    "appassets.androidplatform.net",
];

/// Schemes whose content never reaches the network.
const LOCAL_SCHEMES: &[&str] = &["file", "about", "data", "blob"];

/// Whether `host` belongs to the fixed always-allow internal set.
pub fn is_internal_host(host: &str) -> bool {
    INTERNAL_HOSTS.iter().any(|h| host.eq_ignore_ascii_case(h))
}

/// Domain matcher with apex-and-subdomain semantics.
///
/// A rule for `doubleclick.net` blocks `track.doubleclick.net` but not
/// `doubleclick.network`: matching only ever strips whole leading labels,
/// never substrings.
#[derive(Debug)]
pub struct FilterEngine {
    domains: DomainSet,
    verdicts: Mutex<LruCache<String, bool>>,
}

impl FilterEngine {
    pub fn new() -> Self {
        Self::with_verdict_cache_size(DEFAULT_VERDICT_CACHE_SIZE)
    }

    pub fn with_verdict_cache_size(size: usize) -> Self {
        let size = NonZeroUsize::new(size).unwrap_or(NonZeroUsize::new(1).unwrap());
        Self {
            domains: DomainSet::new(),
            verdicts: Mutex::new(LruCache::new(size)),
        }
    }

    /// Bulk-replace the matchable set, clearing cached verdicts. Called once
    /// at construction; duplicates and mixed-case input collapse.
    pub fn load_domains<I, S>(&mut self, domains: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = DomainSet::new();
        for domain in domains {
            set.insert(domain.as_ref());
        }
        self.domains = set;
        self.verdicts.lock().clear();
    }

    pub fn domain_count(&self) -> usize {
        self.domains.len()
    }

    /// Decide whether `url` points at a blocked domain.
    ///
    /// Never blocks what it cannot classify: unparsable URLs, non-network
    /// schemes, empty hosts and internal hosts all return `false`.
    pub fn should_block(&self, url: &str) -> bool {
        let parsed = match Url::parse(url) {
            Ok(parsed) => parsed,
            Err(_) => return false,
        };

        // Url::parse lowercases the scheme.
        if LOCAL_SCHEMES.contains(&parsed.scheme()) {
            return false;
        }

        let host = match parsed.host_str() {
            Some(host) if !host.is_empty() => host,
            _ => return false,
        };

        if is_internal_host(host) {
            return false;
        }

        // The url crate already lowercases domain hosts; normalize
        // defensively, only allocating when uppercase bytes are detected.
        let normalized;
        let host = if host.as_bytes().iter().any(|b| b.is_ascii_uppercase()) {
            normalized = host.to_lowercase();
            &normalized
        } else {
            host
        };

        let mut verdicts = self.verdicts.lock();
        if let Some(&blocked) = verdicts.get(host) {
            return blocked;
        }

        // Miss — compute while holding the lock. The walk is CPU-only, so
        // holding it also prevents two threads computing the same host.
        let blocked = self.walk_suffixes(host);
        verdicts.put(host.to_string(), blocked);
        blocked
    }

    /// Test the host and each parent domain against the set. Stops once no
    /// `.` remains in the candidate.
    fn walk_suffixes(&self, host: &str) -> bool {
        let mut candidate = host;
        loop {
            if self.domains.contains(candidate) {
                return true;
            }
            match candidate.find('.') {
                Some(dot) => candidate = &candidate[dot + 1..],
                None => return false,
            }
        }
    }
}

impl Default for FilterEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine_with(domains: &[&str]) -> FilterEngine {
        let mut engine = FilterEngine::new();
        engine.load_domains(domains);
        engine
    }

    #[test]
    fn test_exact_and_subdomain_block() {
        let engine = engine_with(&["doubleclick.net"]);

        assert!(engine.should_block("https://doubleclick.net/pixel"));
        assert!(engine.should_block("https://track.doubleclick.net/p"));
        assert!(engine.should_block("https://a.b.track.doubleclick.net/p"));
    }

    #[test]
    fn test_no_boundary_overlap() {
        let engine = engine_with(&["doubleclick.net"]);

        // Whole-label matching only, never substrings.
        assert!(!engine.should_block("https://doubleclick.network/p"));
        assert!(!engine.should_block("https://notdoubleclick.net.example/p"));
    }

    #[test]
    fn test_case_insensitive_match() {
        let engine = engine_with(&["ads.example.com"]);
        assert!(engine.should_block("https://ADS.EXAMPLE.COM/x"));
    }

    #[test]
    fn test_unparsable_url_never_blocks() {
        let engine = engine_with(&["doubleclick.net"]);
        assert!(!engine.should_block("not a url"));
        assert!(!engine.should_block(""));
        assert!(!engine.should_block("doubleclick.net/relative"));
    }

    #[test]
    fn test_local_schemes_never_block() {
        let engine = engine_with(&["doubleclick.net", "text"]);

        assert!(!engine.should_block("data:text/plain,hello"));
        assert!(!engine.should_block("file:///etc/hosts"));
        assert!(!engine.should_block("about:blank"));
        assert!(!engine.should_block("blob:https://doubleclick.net/uuid"));
    }

    #[test]
    fn test_internal_hosts_take_precedence() {
        // Even artificially present in the set, internal hosts stay allowed.
        let engine = engine_with(&["localhost", "appassets.androidplatform.net", "0.0.0.1"]);

        assert!(!engine.should_block("http://localhost/x"));
        assert!(!engine.should_block("http://localhost:5000/x"));
        assert!(!engine.should_block("https://appassets.androidplatform.net/index.html"));
        assert!(!engine.should_block("http://0.0.0.1/app"));
        assert!(!engine.should_block("http://127.0.0.1:8080/"));
    }

    #[test]
    fn test_load_domains_tolerates_duplicates() {
        let engine = engine_with(&["a.com", "a.com", "A.COM"]);
        assert_eq!(engine.domain_count(), 1);
        assert!(engine.should_block("https://a.com/"));
    }

    #[test]
    fn test_load_domains_resets_verdicts() {
        let mut engine = engine_with(&["a.com"]);
        assert!(engine.should_block("https://a.com/"));

        engine.load_domains(&["b.com"]);
        assert!(!engine.should_block("https://a.com/"));
        assert!(engine.should_block("https://b.com/"));
    }

    #[test]
    fn test_verdict_cache_is_consistent() {
        let engine = engine_with(&["doubleclick.net"]);

        // Same URL twice: second answer comes from the verdict cache.
        assert!(engine.should_block("https://track.doubleclick.net/a"));
        assert!(engine.should_block("https://track.doubleclick.net/b"));
        assert!(!engine.should_block("https://example.com/a"));
        assert!(!engine.should_block("https://example.com/b"));
    }

    #[test]
    fn test_empty_engine_blocks_nothing() {
        let engine = FilterEngine::new();
        assert!(!engine.should_block("https://doubleclick.net/pixel"));
        assert_eq!(engine.domain_count(), 0);
    }
}
