//! Prioritized batch preloading.
//!
//! Priority-1 (critical) assets start immediately. Priority-2 assets start
//! once the critical group has settled or `priority_delay` has passed,
//! whichever is first, so one stuck critical asset cannot hold back the rest
//! of the page. Every load runs as its own task and keeps going after
//! [`AssetCache::preload_critical`] returns; later requests join it through
//! the cache.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;

use crate::cache::AssetCache;
use crate::io::AssetReader;
use crate::record::AssetKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum Priority {
    /// Priority 1: gates the first render.
    Critical,
    /// Priority 2 (and anything else): nice to have early.
    Deferred,
}

impl From<u8> for Priority {
    fn from(value: u8) -> Self {
        if value == 1 {
            Self::Critical
        } else {
            Self::Deferred
        }
    }
}

impl From<Priority> for u8 {
    fn from(value: Priority) -> Self {
        match value {
            Priority::Critical => 1,
            Priority::Deferred => 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreloadRequest {
    pub url: String,
    pub kind: AssetKind,
    pub priority: Priority,
}

impl PreloadRequest {
    pub fn new(url: impl Into<String>, kind: AssetKind, priority: impl Into<Priority>) -> Self {
        Self {
            url: url.into(),
            kind,
            priority: priority.into(),
        }
    }

    pub fn model(url: impl Into<String>, priority: impl Into<Priority>) -> Self {
        Self::new(url, AssetKind::Model, priority)
    }

    pub fn texture(url: impl Into<String>, priority: impl Into<Priority>) -> Self {
        Self::new(url, AssetKind::Texture, priority)
    }
}

impl<R: AssetReader> AssetCache<R> {
    /// Preloads a prioritized batch and reports whether at least one critical
    /// asset had loaded by the time the call returns.
    ///
    /// Returns when the critical group has settled or the deferred group has
    /// settled, whichever comes first. Without deferred work it waits for the
    /// critical group, which always settles through timeouts and retries.
    /// Failures are reported through [`on_error`](Self::on_error) and never
    /// fail the batch.
    ///
    /// Must be called from within a tokio runtime.
    pub async fn preload_critical(&self, requests: &[PreloadRequest]) -> bool {
        let (critical, deferred): (Vec<_>, Vec<_>) = requests
            .iter()
            .cloned()
            .partition(|request| request.priority == Priority::Critical);

        let loaded_critical = Arc::new(AtomicUsize::new(0));
        let critical_tasks: Vec<JoinHandle<()>> = critical
            .into_iter()
            .map(|request| {
                let cache = self.clone();
                let loaded_critical = Arc::clone(&loaded_critical);
                tokio::spawn(async move {
                    match cache.load(&request.url, request.kind).await {
                        Ok(_) => {
                            loaded_critical.fetch_add(1, Ordering::SeqCst);
                        }
                        Err(err) => log::warn!("Critical preload of {} failed: {err}", request.url),
                    }
                })
            })
            .collect();
        let critical_group = join_all(critical_tasks);
        tokio::pin!(critical_group);

        if deferred.is_empty() {
            critical_group.await;
            return loaded_critical.load(Ordering::SeqCst) > 0;
        }

        let critical_settled = tokio::select! {
            _ = &mut critical_group => true,
            () = tokio::time::sleep(self.config().priority_delay) => false,
        };

        let cache = self.clone();
        let deferred_group = tokio::spawn(async move {
            join_all(deferred.into_iter().map(|request| {
                let cache = cache.clone();
                async move {
                    if let Err(err) = cache.load(&request.url, request.kind).await {
                        log::warn!("Deferred preload of {} failed: {err}", request.url);
                    }
                }
            }))
            .await;
        });

        if !critical_settled {
            tokio::select! {
                _ = &mut critical_group => {}
                _ = deferred_group => {}
            }
        }

        loaded_critical.load(Ordering::SeqCst) > 0
    }
}
