//! Asset Cache & Loader
//!
//! [`AssetCache`] fetches models and textures through an [`AssetReader`],
//! decodes them and keeps the results for the lifetime of the cache.
//!
//! # Guarantees
//!
//! - **Deduplication**: concurrent requests for one URL share a single load
//!   cycle; the reader is never asked for the same URL twice at once.
//! - **Bounded attempts**: every attempt runs under a deadline scaled by the
//!   [`ConnectionProfile`]; transient failures are retried up to
//!   `max_retries` times with exponential backoff, after which the cycle ends
//!   in [`AssetError::LoadFailed`].
//! - **Isolation**: a failed asset never affects other loads. Every future the
//!   cache hands out settles.
//!
//! Each cycle runs on its own tokio task, so it settles (updating records,
//! progress and listeners) even when every caller has stopped waiting.
//! Timeouts abandon an attempt but do not abort the transfer underneath it.
//!
//! ```rust,ignore
//! let cache = AssetCache::new(reader, LoaderConfig::default(), profile);
//! let _sub = cache.on_progress(|event| log::info!("{:.0}%", event.percent));
//! let robot = cache.load_model("model/Robot.glb").await?;
//! ```

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tokio::time::Instant;

use horizon_core::{AssetError, Listeners, Subscription, panic_message};

use crate::connection::{ConnectionProfile, TimeoutPolicy};
use crate::decode::{self, LoadedAsset, ModelHandle, TextureHandle};
use crate::io::{AssetReader, AssetReaderVariant};
use crate::metrics::LoadMetrics;
use crate::progress::{CompleteEvent, ProgressEvent, ProgressTracker};
use crate::record::{AssetKind, AssetRecord, AssetStatus};

/// Tunables for the loader. All durations are configuration, not invariants.
#[derive(Debug, Clone, PartialEq)]
pub struct LoaderConfig {
    pub model_timeout: TimeoutPolicy,
    pub texture_timeout: TimeoutPolicy,
    /// Retries after the first attempt.
    pub max_retries: u32,
    pub base_retry_delay: Duration,
    /// How long `preload_critical` waits on priority-1 work before starting
    /// priority-2 work.
    pub priority_delay: Duration,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            model_timeout: TimeoutPolicy::new(Duration::from_secs(10), Duration::from_secs(30)),
            texture_timeout: TimeoutPolicy::new(Duration::from_secs(7), Duration::from_secs(20)),
            max_retries: 3,
            base_retry_delay: Duration::from_secs(1),
            priority_delay: Duration::from_millis(100),
        }
    }
}

impl LoaderConfig {
    /// Deadline for one attempt at an asset of `kind`.
    #[must_use]
    pub fn attempt_timeout(&self, kind: AssetKind, profile: &ConnectionProfile) -> Duration {
        match kind {
            AssetKind::Model => self.model_timeout.scaled(profile),
            AssetKind::Texture => self.texture_timeout.scaled(profile),
        }
    }

    /// Delay before the retry that follows failed attempt number `attempt`
    /// (1-based): `min(base * 1.5^(attempt-1), base * 2)`.
    #[must_use]
    pub fn retry_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16) as i32;
        let scaled = self.base_retry_delay.mul_f64(1.5_f64.powi(exponent));
        scaled.min(self.base_retry_delay * 2)
    }
}

type SharedLoad = Shared<BoxFuture<'static, Result<LoadedAsset, AssetError>>>;

#[derive(Default)]
struct CacheState {
    records: FxHashMap<String, AssetRecord>,
    in_flight: FxHashMap<String, SharedLoad>,
}

struct CacheInner<R> {
    reader: Arc<R>,
    config: LoaderConfig,
    profile: ConnectionProfile,
    state: Mutex<CacheState>,
    progress: Mutex<ProgressTracker>,
    metrics: Mutex<LoadMetrics>,
    progress_listeners: Listeners<ProgressEvent>,
    complete_listeners: Listeners<CompleteEvent>,
    error_listeners: Listeners<AssetError>,
}

/// Deduplicating, retrying asset cache. Cheap to clone; clones share state.
pub struct AssetCache<R: AssetReader = AssetReaderVariant> {
    inner: Arc<CacheInner<R>>,
}

impl<R: AssetReader> Clone for AssetCache<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R: AssetReader> AssetCache<R> {
    pub fn new(reader: R, config: LoaderConfig, profile: ConnectionProfile) -> Self {
        Self::with_shared_reader(Arc::new(reader), config, profile)
    }

    pub fn with_shared_reader(reader: Arc<R>, config: LoaderConfig, profile: ConnectionProfile) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                reader,
                config,
                profile,
                state: Mutex::new(CacheState::default()),
                progress: Mutex::new(ProgressTracker::default()),
                metrics: Mutex::new(LoadMetrics::default()),
                progress_listeners: Listeners::new("progress"),
                complete_listeners: Listeners::new("complete"),
                error_listeners: Listeners::new("error"),
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &LoaderConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn profile(&self) -> &ConnectionProfile {
        &self.inner.profile
    }

    // ========================================================================
    // Loading
    // ========================================================================

    pub async fn load_model(&self, url: &str) -> Result<ModelHandle, AssetError> {
        let asset = self.load(url, AssetKind::Model).await?;
        asset.into_model().ok_or_else(|| mismatch(url, AssetKind::Texture, AssetKind::Model))
    }

    pub async fn load_texture(&self, url: &str) -> Result<TextureHandle, AssetError> {
        let asset = self.load(url, AssetKind::Texture).await?;
        asset.into_texture().ok_or_else(|| mismatch(url, AssetKind::Model, AssetKind::Texture))
    }

    /// Loads `url` as `kind`, joining an in-flight cycle or returning the
    /// cached payload when there is one.
    ///
    /// Must be called from within a tokio runtime. Dropping the returned
    /// future does not cancel the cycle.
    pub async fn load(&self, url: &str, kind: AssetKind) -> Result<LoadedAsset, AssetError> {
        if url.trim().is_empty() {
            return Err(AssetError::InvalidUrl(url.to_string()));
        }

        let pending = {
            let mut state = self.inner.state.lock();

            if let Some(record) = state.records.get(url) {
                if record.kind != kind && record.status != AssetStatus::Failed {
                    return Err(mismatch(url, record.kind, kind));
                }
                if let Some(payload) = &record.payload {
                    return Ok(payload.clone());
                }
            }

            if let Some(pending) = state.in_flight.get(url) {
                pending.clone()
            } else {
                // Absent or failed: start a fresh cycle.
                state
                    .records
                    .insert(url.to_string(), AssetRecord::pending(url, kind));
                let epoch = self.inner.progress.lock().item_start();
                let task = tokio::spawn(Arc::clone(&self.inner).run_cycle(url.to_string(), kind, epoch));
                let owned = url.to_string();
                let pending = async move {
                    task.await.unwrap_or_else(|err| {
                        Err(AssetError::Transport {
                            url: owned,
                            reason: format!("load task ended early: {err}"),
                        })
                    })
                }
                .boxed()
                .shared();
                state.in_flight.insert(url.to_string(), pending.clone());
                pending
            }
        };

        pending.await
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Snapshot of the record for `url`.
    #[must_use]
    pub fn record(&self, url: &str) -> Option<AssetRecord> {
        self.inner.state.lock().records.get(url).cloned()
    }

    #[must_use]
    pub fn status(&self, url: &str) -> Option<AssetStatus> {
        self.inner.state.lock().records.get(url).map(|r| r.status)
    }

    #[must_use]
    pub fn is_cached(&self, url: &str) -> bool {
        self.status(url) == Some(AssetStatus::Loaded)
    }

    /// Resolved share of requested load cycles, in `[0, 100]`.
    #[must_use]
    pub fn progress(&self) -> f32 {
        self.inner.progress.lock().percent()
    }

    #[must_use]
    pub fn metrics(&self) -> LoadMetrics {
        self.inner.metrics.lock().clone()
    }

    /// Restarts the aggregate progress counters.
    pub fn reset_progress(&self) {
        self.inner.progress.lock().reset();
    }

    /// Drops every settled record. In-flight loads are left alone.
    pub fn clear(&self) {
        let mut state = self.inner.state.lock();
        let CacheState { records, in_flight } = &mut *state;
        records.retain(|url, _| in_flight.contains_key(url));
    }

    // ========================================================================
    // Subscriptions
    // ========================================================================

    pub fn on_progress(&self, listener: impl Fn(&ProgressEvent) + Send + Sync + 'static) -> Subscription {
        self.inner.progress_listeners.subscribe(listener)
    }

    pub fn on_complete(&self, listener: impl Fn(&CompleteEvent) + Send + Sync + 'static) -> Subscription {
        self.inner.complete_listeners.subscribe(listener)
    }

    /// Called once per failed load cycle with its `LoadFailed` error.
    pub fn on_error(&self, listener: impl Fn(&AssetError) + Send + Sync + 'static) -> Subscription {
        self.inner.error_listeners.subscribe(listener)
    }
}

impl<R: AssetReader> CacheInner<R> {
    async fn run_cycle(self: Arc<Self>, url: String, kind: AssetKind, epoch: u64) -> Result<LoadedAsset, AssetError> {
        let timeout = self.config.attempt_timeout(kind, &self.profile);
        let mut attempt = 0;

        let outcome = loop {
            attempt += 1;
            if let Some(record) = self.state.lock().records.get_mut(&url) {
                record.begin_attempt(Instant::now());
            }

            let result = match tokio::time::timeout(timeout, self.reader.read_bytes(&url)).await {
                Ok(Ok(bytes)) => decode_isolated(kind, &url, bytes),
                Ok(Err(err)) => Err(err),
                Err(_) => Err(AssetError::Timeout {
                    url: url.clone(),
                    timeout_ms: timeout.as_millis() as u64,
                }),
            };

            match result {
                Ok(asset) => break Ok(asset),
                Err(err) if err.is_retryable() && attempt <= self.config.max_retries => {
                    let delay = self.config.retry_delay(attempt);
                    log::warn!("Attempt {attempt} for {url} failed ({err}); retrying in {delay:?}");
                    tokio::time::sleep(delay).await;
                }
                Err(err) => {
                    break Err(AssetError::LoadFailed {
                        url: url.clone(),
                        attempts: attempt,
                        source: Box::new(err),
                    });
                }
            }
        };

        self.settle(&url, kind, attempt, epoch, &outcome);
        outcome
    }

    fn settle(&self, url: &str, kind: AssetKind, attempts: u32, epoch: u64, outcome: &Result<LoadedAsset, AssetError>) {
        let now = Instant::now();
        let elapsed = {
            let mut state = self.state.lock();
            state.in_flight.remove(url);
            state.records.get_mut(url).and_then(|record| {
                record.settle(outcome, now);
                record.duration()
            })
        };

        self.metrics.lock().record(
            url,
            kind,
            attempts,
            elapsed.unwrap_or_default(),
            outcome.is_ok(),
        );

        let progress = self.progress.lock().item_end(url, epoch);

        match outcome {
            Ok(_) => log::debug!("Loaded {url} after {attempts} attempt(s)"),
            Err(err) => {
                log::error!("{err}");
                self.error_listeners.emit(err);
            }
        }
        let Some((event, complete)) = progress else {
            return;
        };
        self.progress_listeners.emit(&event);
        if let Some(complete) = complete {
            self.complete_listeners.emit(&complete);
        }
    }
}

/// Decodes on the cycle's task; a decoder panic becomes a decode error.
fn decode_isolated(kind: AssetKind, url: &str, bytes: Vec<u8>) -> Result<LoadedAsset, AssetError> {
    catch_unwind(AssertUnwindSafe(|| decode::decode(kind, url, bytes))).unwrap_or_else(|payload| {
        Err(AssetError::Decode {
            url: url.to_string(),
            reason: panic_message(payload.as_ref()),
        })
    })
}

fn mismatch(url: &str, cached: AssetKind, requested: AssetKind) -> AssetError {
    AssetError::KindMismatch {
        url: url.to_string(),
        cached: cached.as_str(),
        requested: requested.as_str(),
    }
}
