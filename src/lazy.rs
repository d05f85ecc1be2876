//! Single-flight lazy engine construction.
//!
//! Exactly one build happens per process no matter how many interception
//! callbacks race into the first access; every caller observes the same
//! result. A failed build is memoized for the process lifetime so callers
//! fail open instead of re-parsing a multi-hundred-thousand-line list on
//! every request.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use log::warn;
use parking_lot::{Condvar, Mutex};

use crate::engine::FilterEngine;
use crate::error::AdBlockError;
use crate::loader::AdBlockLoader;

/// Default bound on how long an interception callback waits for the engine
/// before failing open.
pub const DEFAULT_ENGINE_WAIT: Duration = Duration::from_secs(5);

enum State {
    Idle(AdBlockLoader),
    Building,
    Ready(Arc<FilterEngine>),
    Failed(Arc<AdBlockError>),
}

struct Shared {
    state: Mutex<State>,
    ready: Condvar,
    #[cfg(feature = "async")]
    done_tx: tokio::sync::watch::Sender<bool>,
    #[cfg(feature = "async")]
    done_rx: tokio::sync::watch::Receiver<bool>,
}

/// Process-wide handle over the one engine construction.
///
/// Construct once during application startup sequencing and clone the handle
/// into every renderer adapter (clones are cheap and observe the same
/// construction). The build itself starts on [`prewarm`] or the first
/// access, whichever comes first.
///
/// [`prewarm`]: LazyEngine::prewarm
#[derive(Clone)]
pub struct LazyEngine {
    shared: Arc<Shared>,
}

impl LazyEngine {
    pub fn new(loader: AdBlockLoader) -> Self {
        #[cfg(feature = "async")]
        let (done_tx, done_rx) = tokio::sync::watch::channel(false);

        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(State::Idle(loader)),
                ready: Condvar::new(),
                #[cfg(feature = "async")]
                done_tx,
                #[cfg(feature = "async")]
                done_rx,
            }),
        }
    }

    /// Kick off construction without waiting for it.
    pub fn prewarm(&self) {
        self.start_if_idle();
    }

    /// Non-blocking accessor: the engine if it is already built.
    pub fn try_engine(&self) -> Option<Arc<FilterEngine>> {
        self.start_if_idle();
        match &*self.shared.state.lock() {
            State::Ready(engine) => Some(engine.clone()),
            _ => None,
        }
    }

    /// Bridging accessor for synchronous interception callbacks: wait up to
    /// `timeout` for construction, then fail open (`None`). A memoized
    /// failure also returns `None`.
    pub fn engine_within(&self, timeout: Duration) -> Option<Arc<FilterEngine>> {
        self.start_if_idle();

        let deadline = Instant::now() + timeout;
        let mut state = self.shared.state.lock();
        loop {
            match &*state {
                State::Ready(engine) => return Some(engine.clone()),
                State::Failed(_) => return None,
                _ => {}
            }
            if self.shared.ready.wait_until(&mut state, deadline).timed_out() {
                // One last look: the build may have finished as the wait
                // timed out.
                return match &*state {
                    State::Ready(engine) => Some(engine.clone()),
                    _ => None,
                };
            }
        }
    }

    /// The memoized construction failure, if any.
    pub fn build_error(&self) -> Option<Arc<AdBlockError>> {
        match &*self.shared.state.lock() {
            State::Failed(error) => Some(error.clone()),
            _ => None,
        }
    }

    /// Await construction. Synchronous callers use [`engine_within`] instead.
    ///
    /// [`engine_within`]: LazyEngine::engine_within
    #[cfg(feature = "async")]
    pub async fn engine(&self) -> std::result::Result<Arc<FilterEngine>, Arc<AdBlockError>> {
        self.start_if_idle();

        // Subscribe before checking state so a completion between the check
        // and the await still wakes us.
        let mut done = self.shared.done_rx.clone();
        loop {
            match &*self.shared.state.lock() {
                State::Ready(engine) => return Ok(engine.clone()),
                State::Failed(error) => return Err(error.clone()),
                _ => {}
            }
            // The sender lives in `self.shared`, so this only resolves on
            // the build-finished notification.
            let _ = done.changed().await;
        }
    }

    /// Take the loader out of `Idle` exactly once and spawn the build.
    fn start_if_idle(&self) {
        let mut state = self.shared.state.lock();
        if !matches!(*state, State::Idle(_)) {
            return;
        }
        let loader = match std::mem::replace(&mut *state, State::Building) {
            State::Idle(loader) => loader,
            _ => unreachable!("checked Idle above"),
        };
        drop(state);

        let shared = Arc::clone(&self.shared);
        let spawned = thread::Builder::new()
            .name("adblock-engine-init".into())
            .spawn(move || shared.build(loader));

        if let Err(e) = spawned {
            warn!("failed to spawn engine construction thread: {}", e);
            self.shared
                .finish(State::Failed(Arc::new(AdBlockError::IoError(e))));
        }
    }
}

impl Shared {
    fn build(&self, loader: AdBlockLoader) {
        let result = catch_unwind(AssertUnwindSafe(|| loader.load()));
        let next = match result {
            Ok(Ok(engine)) => State::Ready(Arc::new(engine)),
            Ok(Err(error)) => {
                warn!("engine construction failed: {}", error);
                State::Failed(Arc::new(error))
            }
            Err(_) => {
                warn!("engine construction panicked");
                State::Failed(Arc::new(AdBlockError::EngineUnavailable(
                    "engine construction panicked".to_string(),
                )))
            }
        };
        self.finish(next);
    }

    fn finish(&self, next: State) {
        *self.state.lock() = next;
        self.ready.notify_all();
        #[cfg(feature = "async")]
        let _ = self.done_tx.send(true);
    }
}


#[cfg(all(test, feature = "async"))]
mod async_tests {
    use super::*;
    use crate::loader::MemoryListSource;

    #[tokio::test]
    async fn test_async_engine_ready() {
        let lazy = LazyEngine::new(AdBlockLoader::new(MemoryListSource::new(
            "||doubleclick.net^\n",
        )));
        let engine = lazy.engine().await.expect("engine should build");
        assert!(engine.should_block("https://doubleclick.net/x"));
    }

    #[tokio::test]
    async fn test_async_engine_failure() {
        let lazy = LazyEngine::new(AdBlockLoader::new(crate::loader::NilListSource));
        let error = lazy.engine().await.expect_err("construction should fail");
        assert!(error.to_string().contains("No block list source"));
    }
}
