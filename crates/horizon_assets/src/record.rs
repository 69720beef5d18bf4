use serde::{Deserialize, Serialize};
use tokio::time::{Duration, Instant};

use horizon_core::AssetError;

use crate::decode::LoadedAsset;

/// Which decoder an asset goes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Model,
    Texture,
}

impl AssetKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Model => "model",
            Self::Texture => "texture",
        }
    }
}

/// Lifecycle of a record. Only moves forward within a load cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AssetStatus {
    Pending,
    Loading,
    Loaded,
    Failed,
}

/// Book-keeping for one URL.
#[derive(Debug, Clone)]
pub struct AssetRecord {
    pub url: String,
    pub kind: AssetKind,
    pub status: AssetStatus,
    /// Attempts made in the current load cycle.
    pub attempts: u32,
    pub started_at: Option<Instant>,
    pub finished_at: Option<Instant>,
    pub(crate) payload: Option<LoadedAsset>,
    /// Set only when `status == Failed`.
    pub last_error: Option<AssetError>,
}

impl AssetRecord {
    pub(crate) fn pending(url: &str, kind: AssetKind) -> Self {
        Self {
            url: url.to_string(),
            kind,
            status: AssetStatus::Pending,
            attempts: 0,
            started_at: None,
            finished_at: None,
            payload: None,
            last_error: None,
        }
    }

    /// Marks the start of an attempt. The first attempt moves
    /// `Pending -> Loading`; later ones are `Loading -> Loading` retries.
    pub(crate) fn begin_attempt(&mut self, now: Instant) {
        if self.status == AssetStatus::Pending {
            self.status = AssetStatus::Loading;
            self.started_at = Some(now);
        }
        self.attempts += 1;
    }

    pub(crate) fn settle(&mut self, outcome: &Result<LoadedAsset, AssetError>, now: Instant) {
        self.finished_at = Some(now);
        match outcome {
            Ok(asset) => {
                self.status = AssetStatus::Loaded;
                self.payload = Some(asset.clone());
                self.last_error = None;
            }
            Err(err) => {
                self.status = AssetStatus::Failed;
                self.payload = None;
                self.last_error = Some(err.clone());
            }
        }
    }

    /// Shared payload, present once loaded.
    #[must_use]
    pub fn payload(&self) -> Option<&LoadedAsset> {
        self.payload.as_ref()
    }

    /// Wall time from first attempt to settlement.
    #[must_use]
    pub fn duration(&self) -> Option<Duration> {
        Some(self.finished_at?.saturating_duration_since(self.started_at?))
    }

    #[must_use]
    pub fn is_settled(&self) -> bool {
        matches!(self.status, AssetStatus::Loaded | AssetStatus::Failed)
    }
}
