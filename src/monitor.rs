use std::sync::atomic::{AtomicU32, Ordering};

use parking_lot::Mutex;

use horizon_assets::LoadMetrics;
use horizon_core::time::{Duration, Instant};
use horizon_core::{FpsCounter, FrameClock};

/// Frame-rate and asset-load statistics for the running site.
///
/// The composition root feeds it frames through [`frame`](Self::frame) and
/// counts load failures reported by the cache.
pub struct PerformanceMonitor {
    fps: Mutex<FpsCounter>,
    clock: Mutex<FrameClock>,
    load_errors: AtomicU32,
}

/// Snapshot returned by [`PerformanceMonitor::report`].
#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceReport {
    pub fps: f32,
    pub min_fps: Option<f32>,
    pub frames: u64,
    pub elapsed: Duration,
    pub load_errors: u32,
    pub loads: LoadMetrics,
}

impl Default for PerformanceMonitor {
    fn default() -> Self {
        Self::starting_at(Instant::now())
    }
}

impl PerformanceMonitor {
    #[must_use]
    pub fn starting_at(now: Instant) -> Self {
        Self {
            fps: Mutex::new(FpsCounter::starting_at(now, Duration::from_secs(1))),
            clock: Mutex::new(FrameClock::starting_at(now, Duration::from_millis(100))),
            load_errors: AtomicU32::new(0),
        }
    }

    /// Records a frame at `now` and returns its clamped delta.
    pub fn frame_at(&self, now: Instant) -> Duration {
        if let Some(fps) = self.fps.lock().update_at(now) {
            log::trace!("fps: {fps:.1}");
        }
        self.clock.lock().tick_at(now)
    }

    pub fn frame(&self) -> Duration {
        self.frame_at(Instant::now())
    }

    pub(crate) fn record_load_error(&self) {
        self.load_errors.fetch_add(1, Ordering::Relaxed);
    }

    #[must_use]
    pub fn report(&self, loads: LoadMetrics) -> PerformanceReport {
        let fps = self.fps.lock();
        let clock = self.clock.lock();
        PerformanceReport {
            fps: fps.current_fps,
            min_fps: fps.min_fps,
            frames: clock.frame_count,
            elapsed: clock.elapsed,
            load_errors: self.load_errors.load(Ordering::Relaxed),
            loads,
        }
    }
}
