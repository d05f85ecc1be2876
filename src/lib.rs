//! Ad-blocking and navigation interception core for applications embedding a
//! web renderer.
//!
//! The renderer fires synchronous interception callbacks on every network
//! request and navigation; this crate supplies the pieces those callbacks
//! consume:
//!
//! - Block-list parsing (the `||domain^` rule form) into a canonical domain
//!   set, with a flat-file cache so later launches skip the parse
//! - An immutable, thread-safe domain matcher with apex-and-subdomain
//!   semantics
//! - A single-flight lazy coordinator: one asynchronous engine construction
//!   per process, bridged to synchronous callers with a bounded wait
//! - A platform-neutral decision policy producing `Allow`, `Block`,
//!   `DelegateInternal` or `External` per request
//!
//! Failures inside the core degrade to letting requests through; a missed
//! ad is acceptable, a broken page is not.
//!
//! # Example
//!
//! ```rust
//! use adblock_intercept::{
//!     AdBlockLoader, Decision, InterceptPolicy, LazyEngine, MemoryListSource, NavigationKind,
//! };
//!
//! let list = "\
//! ! EasyList-style input; only ||domain^ rules are recognized
//! ||doubleclick.net^
//! ||adsrv.example^
//! ";
//!
//! // Construct once during startup, inject into every renderer adapter.
//! let engine = LazyEngine::new(AdBlockLoader::new(MemoryListSource::new(list)));
//! engine.prewarm();
//! let policy = InterceptPolicy::new(engine.clone());
//!
//! let decision = policy.decide(
//!     "https://track.doubleclick.net/pixel",
//!     NavigationKind::SubResource,
//! );
//! assert_eq!(decision, Decision::Block);
//!
//! let decision = policy.decide("https://news.example.com/", NavigationKind::TopLevel);
//! assert_eq!(decision, Decision::External);
//! ```

pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod lazy;
pub mod loader;
pub mod parser;
pub mod policy;
pub mod types;

// Re-export commonly used items
pub use cache::CacheStore;
pub use config::FilterConfig;
pub use engine::{is_internal_host, FilterEngine, DEFAULT_VERDICT_CACHE_SIZE};
pub use error::{AdBlockError, CacheErrorKind, ListErrorKind, Result};
pub use lazy::{LazyEngine, DEFAULT_ENGINE_WAIT};
pub use loader::{
    AdBlockLoader, BlockListSource, FileListSource, MemoryListSource, NilListSource,
};
pub use parser::{parse_list, parse_list_from_file, parse_list_from_reader};
pub use policy::{blocked_response, InterceptPolicy, PolicyConfig, AD_SWEEP_SCRIPT};
pub use types::{BlockedResponse, Decision, DomainSet, NavigationKind};
