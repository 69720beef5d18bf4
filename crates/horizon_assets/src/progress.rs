//! Aggregate load progress.
//!
//! Progress is a per-asset completion ratio: every underlying load cycle
//! counts as one item when it starts and one resolved item when it settles,
//! whether it succeeded or failed. Joined requests for an in-flight URL and
//! cache hits do not count. Byte-weighted progress is left to callers.
//!
//! Items are tagged with the epoch they started in. A reset starts a new
//! epoch, and items from earlier epochs settle without touching the counters.

/// Emitted every time a load cycle settles.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressEvent {
    /// Resolved share of requested items, in `[0, 100]`.
    pub percent: f32,
    pub loaded: usize,
    pub total: usize,
    /// URL of the item that just settled.
    pub url: String,
}

/// Emitted when every requested item has resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompleteEvent {
    pub loaded: usize,
    pub total: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgressTracker {
    requested: usize,
    resolved: usize,
    epoch: u64,
}

impl ProgressTracker {
    /// Counts a new item and returns the epoch to settle it with.
    pub fn item_start(&mut self) -> u64 {
        self.requested += 1;
        self.epoch
    }

    /// Records a settled item and returns the event to publish, plus a
    /// completion event when nothing is outstanding anymore.
    ///
    /// Returns `None` for an item started before the last reset.
    pub fn item_end(&mut self, url: &str, epoch: u64) -> Option<(ProgressEvent, Option<CompleteEvent>)> {
        if epoch != self.epoch {
            return None;
        }
        self.resolved = (self.resolved + 1).min(self.requested);
        let event = ProgressEvent {
            percent: self.percent(),
            loaded: self.resolved,
            total: self.requested,
            url: url.to_string(),
        };
        let complete = (self.resolved == self.requested).then_some(CompleteEvent {
            loaded: self.resolved,
            total: self.requested,
        });
        Some((event, complete))
    }

    /// Resolved share in `[0, 100]`; zero before anything was requested.
    #[must_use]
    pub fn percent(&self) -> f32 {
        if self.requested == 0 {
            return 0.0;
        }
        self.resolved as f32 / self.requested as f32 * 100.0
    }

    #[must_use]
    pub fn requested(&self) -> usize {
        self.requested
    }

    #[must_use]
    pub fn resolved(&self) -> usize {
        self.resolved
    }

    pub fn reset(&mut self) {
        *self = Self {
            epoch: self.epoch.wrapping_add(1),
            ..Self::default()
        };
    }
}
