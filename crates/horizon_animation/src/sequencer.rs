//! Animation Sequencer
//!
//! Registers the binding catalog with a [`ScrollEngine`] exactly once per
//! cycle and lets other components defer work until that has happened.
//!
//! # State machine
//!
//! ```text
//! Uninitialized --initialize()--> Initializing --success--> Ready
//!                                  |    ^
//!                      failure,    |    | retry after retry_delay
//!                      retries     +----+
//!                      exhausted -> Uninitialized
//! Ready --kill_all()--> Uninitialized
//! ```
//!
//! # Pass
//!
//! 1. Wait for the [`MountSignal`], at most `max_anchor_wait`. Missing anchors
//!    are logged and the pass continues.
//! 2. Scroll to top so trigger offsets are computed from a known position.
//! 3. Settle delay (longer on high-latency hosting).
//! 4. Refresh the engine's trigger geometry.
//! 5. Register every catalog binding.
//! 6. Flip to `Ready` and drain the `on_initialized` queue.
//!
//! Errors and panics from steps 2 to 5 retry the whole pass. Nothing is ever
//! returned to the caller; the outcome is visible through
//! [`status`](AnimationSequencer::status) and the log.
//!
//! The pass runs on its own tokio task. Callers of `initialize` only join it,
//! so a caller that stops waiting does not stall the pass.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use parking_lot::Mutex;

use horizon_core::{SequencerError, Subscription, panic_message, run_isolated};

use crate::binding::BindingCatalog;
use crate::engine::{BindingId, ScrollEngine};
use crate::mount::MountSignal;

#[derive(Debug, Clone, PartialEq)]
pub struct SequencerConfig {
    pub max_anchor_wait: Duration,
    pub settle_delay: Duration,
    pub high_latency_settle_delay: Duration,
    /// Set from the hosting profile.
    pub high_latency: bool,
    pub max_retries: u32,
    pub retry_delay: Duration,
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self {
            max_anchor_wait: Duration::from_secs(5),
            settle_delay: Duration::from_millis(100),
            high_latency_settle_delay: Duration::from_millis(200),
            high_latency: false,
            max_retries: 3,
            retry_delay: Duration::from_millis(1500),
        }
    }
}

impl SequencerConfig {
    #[must_use]
    pub fn effective_settle_delay(&self) -> Duration {
        if self.high_latency {
            self.high_latency_settle_delay
        } else {
            self.settle_delay
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SequencerState {
    #[default]
    Uninitialized,
    Initializing,
    Ready,
}

/// Snapshot returned by [`AnimationSequencer::status`].
#[derive(Debug, Clone, PartialEq)]
pub struct SequencerStatus {
    pub is_initialized: bool,
    pub state: SequencerState,
    /// Retries consumed by the current (or last) cycle.
    pub retry_attempts: u32,
    pub max_retries: u32,
    /// The last pass proceeded without a mount signal.
    pub anchors_missing: bool,
    pub last_error: Option<SequencerError>,
}

type InitFuture = Shared<BoxFuture<'static, ()>>;
type InitCallback = Box<dyn FnOnce() + Send>;

#[derive(Default)]
struct SequencerShared {
    state: SequencerState,
    /// Bumped by `kill_all`; a pass only commits if it still matches.
    generation: u64,
    retry_attempts: u32,
    anchors_missing: bool,
    last_error: Option<SequencerError>,
    pending: Option<InitFuture>,
    registered: Vec<BindingId>,
    next_callback: u64,
    callbacks: Vec<(u64, InitCallback)>,
}

struct Inner {
    engine: Arc<dyn ScrollEngine>,
    mount: MountSignal,
    catalog: BindingCatalog,
    config: SequencerConfig,
    shared: Mutex<SequencerShared>,
}

/// Exactly-once registration of the scroll binding catalog.
///
/// Cloning yields another handle to the same sequencer.
#[derive(Clone)]
pub struct AnimationSequencer {
    inner: Arc<Inner>,
}

impl AnimationSequencer {
    pub fn new(
        engine: Arc<dyn ScrollEngine>,
        mount: MountSignal,
        catalog: BindingCatalog,
        config: SequencerConfig,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                engine,
                mount,
                catalog,
                config,
                shared: Mutex::new(SequencerShared::default()),
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &SequencerConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn catalog(&self) -> &BindingCatalog {
        &self.inner.catalog
    }

    /// Runs the initialization pass.
    ///
    /// Returns immediately when already `Ready`; joins the in-flight pass
    /// when `Initializing`. Never fails: exhausted retries leave the
    /// sequencer `Uninitialized` with the error in [`status`](Self::status).
    ///
    /// Must be called from within a tokio runtime.
    pub async fn initialize(&self) {
        let pass = {
            let mut shared = self.inner.shared.lock();
            match (shared.state, shared.pending.clone()) {
                (SequencerState::Ready, _) => return,
                (SequencerState::Initializing, Some(pending)) => pending,
                _ => {
                    shared.state = SequencerState::Initializing;
                    shared.retry_attempts = 0;
                    shared.anchors_missing = false;
                    shared.last_error = None;

                    let generation = shared.generation;
                    let task = tokio::spawn(Inner::run(Arc::clone(&self.inner), generation));
                    let inner = Arc::clone(&self.inner);
                    let pass = async move {
                        if let Err(err) = task.await {
                            log::error!("Animation initialization task ended early: {err}");
                            inner.abandon(generation, SequencerError::Engine(err.to_string()));
                        }
                    }
                    .boxed()
                    .shared();
                    shared.pending = Some(pass.clone());
                    pass
                }
            }
        };
        pass.await;
    }

    /// Queues `callback` for the next transition to `Ready`, or runs it now
    /// if already `Ready`.
    pub fn on_initialized(&self, callback: impl FnOnce() + Send + 'static) -> Subscription {
        let mut shared = self.inner.shared.lock();
        if shared.state == SequencerState::Ready {
            drop(shared);
            run_isolated("on_initialized", callback);
            return Subscription::noop();
        }

        let id = shared.next_callback;
        shared.next_callback += 1;
        shared.callbacks.push((id, Box::new(callback)));
        drop(shared);

        let inner = Arc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = inner.upgrade() {
                inner.shared.lock().callbacks.retain(|(entry, _)| *entry != id);
            }
        })
    }

    /// Recomputes trigger geometry. No-op while the engine is not ready.
    pub fn refresh(&self) {
        let engine = &self.inner.engine;
        if !engine.is_ready() {
            log::debug!("Scroll engine not ready; skipping refresh");
            return;
        }
        if let Err(err) = guarded(|| engine.refresh()) {
            log::warn!("Scroll refresh failed: {err}");
        }
    }

    /// Tears down every registered binding and returns to `Uninitialized`.
    ///
    /// An in-flight pass is invalidated: it removes whatever it registers
    /// and never flips to `Ready`.
    pub fn kill_all(&self) {
        {
            let mut shared = self.inner.shared.lock();
            shared.generation += 1;
            shared.state = SequencerState::Uninitialized;
            shared.pending = None;
            shared.retry_attempts = 0;
            shared.anchors_missing = false;
            shared.last_error = None;
            shared.registered.clear();
        }

        let engine = &self.inner.engine;
        if let Err(err) = guarded(|| {
            engine.kill_all();
            Ok(())
        }) {
            log::warn!("Scroll engine teardown failed: {err}");
        }
    }

    /// `kill_all` followed by a fresh [`initialize`](Self::initialize).
    pub async fn reset(&self) {
        self.kill_all();
        self.initialize().await;
    }

    #[must_use]
    pub fn status(&self) -> SequencerStatus {
        let shared = self.inner.shared.lock();
        SequencerStatus {
            is_initialized: shared.state == SequencerState::Ready,
            state: shared.state,
            retry_attempts: shared.retry_attempts,
            max_retries: self.inner.config.max_retries,
            anchors_missing: shared.anchors_missing,
            last_error: shared.last_error.clone(),
        }
    }

    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.inner.shared.lock().state == SequencerState::Ready
    }

    /// Bindings registered by the last successful pass.
    #[must_use]
    pub fn registered(&self) -> Vec<BindingId> {
        self.inner.shared.lock().registered.clone()
    }
}

impl Inner {
    async fn run(self: Arc<Self>, generation: u64) {
        loop {
            let err = match self.pass(generation).await {
                Ok(ids) => {
                    self.commit(generation, ids);
                    return;
                }
                Err(err) => err,
            };

            let retry = {
                let mut shared = self.shared.lock();
                if shared.generation != generation {
                    return;
                }
                shared.last_error = Some(err.clone());
                if shared.retry_attempts < self.config.max_retries {
                    shared.retry_attempts += 1;
                    Some(shared.retry_attempts)
                } else {
                    shared.state = SequencerState::Uninitialized;
                    shared.pending = None;
                    None
                }
            };

            let Some(attempt) = retry else {
                log::error!(
                    "Animation initialization failed after {} retries: {err}",
                    self.config.max_retries
                );
                return;
            };

            log::warn!(
                "Animation initialization failed ({err}), retry {attempt}/{} in {:?}",
                self.config.max_retries,
                self.config.retry_delay
            );
            tokio::time::sleep(self.config.retry_delay).await;
        }
    }

    async fn pass(&self, generation: u64) -> Result<Vec<BindingId>, SequencerError> {
        let wait = self.config.max_anchor_wait;
        if tokio::time::timeout(wait, self.mount.wait()).await.is_err() {
            let missing = SequencerError::AnchorsMissing {
                waited_ms: u64::try_from(wait.as_millis()).unwrap_or(u64::MAX),
            };
            log::warn!("{missing}; registering against the current layout");
            let mut shared = self.shared.lock();
            if shared.generation == generation {
                shared.anchors_missing = true;
                shared.last_error = Some(missing);
            }
        }

        guarded(|| self.engine.scroll_to_top())?;
        tokio::time::sleep(self.config.effective_settle_delay()).await;
        guarded(|| self.engine.refresh())?;

        let mut ids = Vec::with_capacity(self.catalog.len());
        for binding in self.catalog.iter() {
            match guarded(|| self.engine.register(binding)) {
                Ok(id) => ids.push(id),
                Err(err) => {
                    self.kill_ids(&ids);
                    return Err(err);
                }
            }
        }
        Ok(ids)
    }

    fn commit(&self, generation: u64, ids: Vec<BindingId>) {
        let callbacks = {
            let mut shared = self.shared.lock();
            if shared.generation != generation {
                drop(shared);
                log::debug!("Discarding bindings of a cancelled initialization pass");
                self.kill_ids(&ids);
                return;
            }
            shared.state = SequencerState::Ready;
            shared.pending = None;
            shared.registered = ids;
            std::mem::take(&mut shared.callbacks)
        };

        log::debug!(
            "Animation sequencer ready: {} bindings, {} queued callbacks",
            self.catalog.len(),
            callbacks.len()
        );
        for (_, callback) in callbacks {
            run_isolated("on_initialized", callback);
        }
    }

    /// Returns a pass that never reached `commit` to `Uninitialized`.
    fn abandon(&self, generation: u64, err: SequencerError) {
        let mut shared = self.shared.lock();
        if shared.generation == generation && shared.state == SequencerState::Initializing {
            shared.state = SequencerState::Uninitialized;
            shared.pending = None;
            shared.last_error = Some(err);
        }
    }

    fn kill_ids(&self, ids: &[BindingId]) {
        for &id in ids {
            if let Err(err) = guarded(|| {
                self.engine.kill(id);
                Ok(())
            }) {
                log::warn!("Failed to remove binding: {err}");
            }
        }
    }
}

/// Runs an engine call, turning a panic into [`SequencerError::Engine`].
fn guarded<T>(call: impl FnOnce() -> Result<T, SequencerError>) -> Result<T, SequencerError> {
    match catch_unwind(AssertUnwindSafe(call)) {
        Ok(result) => result,
        Err(payload) => Err(SequencerError::Engine(panic_message(payload.as_ref()))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mount::mount_signal;
    use slotmap::SlotMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingEngine {
        registrations: AtomicUsize,
        refreshes: AtomicUsize,
        ids: Mutex<SlotMap<BindingId, ()>>,
    }

    impl ScrollEngine for CountingEngine {
        fn is_ready(&self) -> bool {
            true
        }

        fn scroll_to_top(&self) -> Result<(), SequencerError> {
            Ok(())
        }

        fn refresh(&self) -> Result<(), SequencerError> {
            self.refreshes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn register(
            &self,
            _binding: &crate::binding::AnimationBinding,
        ) -> Result<BindingId, SequencerError> {
            self.registrations.fetch_add(1, Ordering::SeqCst);
            Ok(self.ids.lock().insert(()))
        }

        fn kill(&self, id: BindingId) {
            self.ids.lock().remove(id);
        }

        fn kill_all(&self) {
            self.ids.lock().clear();
        }
    }

    #[test]
    fn high_latency_doubles_settle_delay() {
        let mut config = SequencerConfig::default();
        assert_eq!(config.effective_settle_delay(), Duration::from_millis(100));
        config.high_latency = true;
        assert_eq!(config.effective_settle_delay(), Duration::from_millis(200));
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_initialize_registers_once() {
        let engine = Arc::new(CountingEngine::default());
        let sequencer = AnimationSequencer::new(
            engine.clone(),
            MountSignal::already_mounted(),
            BindingCatalog::site_default(),
            SequencerConfig::default(),
        );

        tokio::join!(sequencer.initialize(), sequencer.initialize());
        sequencer.initialize().await;

        assert!(sequencer.is_initialized());
        assert_eq!(engine.registrations.load(Ordering::SeqCst), 3);
        assert_eq!(engine.refreshes.load(Ordering::SeqCst), 1);
        assert_eq!(sequencer.registered().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn unsubscribed_callback_is_not_run() {
        let engine = Arc::new(CountingEngine::default());
        let (notifier, signal) = mount_signal();
        notifier.mounted();
        let sequencer = AnimationSequencer::new(
            engine,
            signal,
            BindingCatalog::site_default(),
            SequencerConfig::default(),
        );

        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let subscription = sequencer.on_initialized(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        subscription.unsubscribe();

        sequencer.initialize().await;
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }
}
