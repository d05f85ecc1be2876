//! Interception decision policy.
//!
//! Platform-neutral decision procedure applied to every intercepted request
//! and navigation. Adapters for a concrete renderer translate the returned
//! [`Decision`] into that renderer's callback contract; a `Block` becomes the
//! empty response from [`blocked_response`] so the page never sees a
//! broken-resource error.

use std::time::Duration;

use log::debug;
use url::Url;

use crate::engine::is_internal_host;
use crate::lazy::{LazyEngine, DEFAULT_ENGINE_WAIT};
use crate::types::{BlockedResponse, Decision, NavigationKind};

/// File extensions the image bypass recognizes.
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "gif"];

/// Policy tuning knobs.
#[derive(Debug, Clone)]
pub struct PolicyConfig {
    /// Hosts the renderer loads its own bundled assets from; requests to
    /// them are handed to the in-app content pipeline untouched.
    pub app_hosts: Vec<String>,
    /// Image hosts trusted enough to bypass the block check entirely
    /// (apex-and-subdomain).
    pub trusted_image_hosts: Vec<String>,
    /// Bound on how long one callback may wait for engine construction
    /// before failing open.
    pub engine_wait: Duration,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            app_hosts: vec![
                "localhost".to_string(),
                "127.0.0.1".to_string(),
                "[::1]".to_string(),
                "0.0.0.0".to_string(),
                "0.0.0.1".to_string(),
                "appassets.androidplatform.net".to_string(),
            ],
            trusted_image_hosts: vec!["tmdb.org".to_string()],
            engine_wait: DEFAULT_ENGINE_WAIT,
        }
    }
}

/// Decision procedure shared by every interception site.
pub struct InterceptPolicy {
    engine: LazyEngine,
    config: PolicyConfig,
}

impl InterceptPolicy {
    pub fn new(engine: LazyEngine) -> Self {
        Self::with_config(engine, PolicyConfig::default())
    }

    pub fn with_config(engine: LazyEngine, config: PolicyConfig) -> Self {
        Self { engine, config }
    }

    pub fn config(&self) -> &PolicyConfig {
        &self.config
    }

    /// Decide what to do with one intercepted request. First match wins.
    /// Any evaluation failure resolves to `Allow`: a missed ad is
    /// acceptable, a broken page is not.
    pub fn decide(&self, url: &str, kind: NavigationKind) -> Decision {
        let parsed = match Url::parse(url) {
            Ok(parsed) => parsed,
            Err(e) => {
                debug!("allowing unparsable url '{}': {}", url, e);
                return Decision::Allow;
            }
        };
        let host = parsed.host_str().unwrap_or("");

        // 1. The app's own assets never go through block rules.
        if !host.is_empty() && self.is_app_host(host) {
            return Decision::DelegateInternal;
        }

        // 2. Image bypass: false-positive blocking of poster art is worse
        // than occasionally missing an image-borne ad.
        if self.is_image(&parsed) {
            return Decision::Allow;
        }

        // 3. Block verdict, failing open while the engine is unavailable.
        if let Some(engine) = self.engine.engine_within(self.config.engine_wait) {
            if engine.should_block(url) {
                return Decision::Block;
            }
        }

        // 4. Web navigations leave the embedded view for the system browser.
        if matches!(parsed.scheme(), "http" | "https")
            && kind.is_top_level()
            && !host.is_empty()
            && !is_internal_host(host)
        {
            return Decision::External;
        }

        Decision::Allow
    }

    fn is_app_host(&self, host: &str) -> bool {
        self.config
            .app_hosts
            .iter()
            .any(|h| host.eq_ignore_ascii_case(h))
    }

    fn is_image(&self, url: &Url) -> bool {
        let path = url.path();
        if let Some((_, ext)) = path.rsplit_once('.') {
            if IMAGE_EXTENSIONS.iter().any(|e| ext.eq_ignore_ascii_case(e)) {
                return true;
            }
        }

        let host = match url.host_str() {
            Some(host) => host,
            None => return false,
        };
        let normalized;
        let host = if host.as_bytes().iter().any(|b| b.is_ascii_uppercase()) {
            normalized = host.to_lowercase();
            &normalized
        } else {
            host
        };
        self.config
            .trusted_image_hosts
            .iter()
            .any(|trusted| host == trusted || host.ends_with(&format!(".{}", trusted)))
    }
}

/// Response an adapter hands back for a [`Decision::Block`]: an empty 200 so
/// the tracker is starved without a visible broken-resource error.
pub fn blocked_response() -> BlockedResponse {
    BlockedResponse {
        status: 200,
        mime_type: "text/plain",
        body: b"",
    }
}

/// Cosmetic sweep the host may inject after a page load. Network-level
/// blocking starves ad content; this clears the placeholder elements left
/// behind.
pub const AD_SWEEP_SCRIPT: &str = r#"(() => {
    const selectors = [
        'iframe[src*="ads"]',
        '[id^="ad"]',
        '[class*="ad"]',
        '[class*="sponsor"]',
        '[class*="banner"]'
    ];
    selectors.forEach(s =>
        document.querySelectorAll(s).forEach(e => e.remove())
    );
})();"#;
