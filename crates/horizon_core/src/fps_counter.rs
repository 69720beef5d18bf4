use crate::time::{Duration, Instant};

/// Windowed frame-rate sampler used by the performance monitor.
///
/// Frames are accumulated until `window` has elapsed, then the average rate
/// over that window is published and the accumulator restarts.
#[derive(Debug, Clone)]
pub struct FpsCounter {
    window: Duration,
    last_update: Instant,
    frame_count: u32,
    accumulated_time: Duration,
    pub current_fps: f32,
    /// Lowest published rate since creation.
    pub min_fps: Option<f32>,
    /// Number of windows published.
    pub samples: u32,
}

impl Default for FpsCounter {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

impl FpsCounter {
    #[must_use]
    pub fn new(window: Duration) -> Self {
        Self::starting_at(Instant::now(), window)
    }

    #[must_use]
    pub fn starting_at(now: Instant, window: Duration) -> Self {
        Self {
            window,
            last_update: now,
            frame_count: 0,
            accumulated_time: Duration::ZERO,
            current_fps: 0.0,
            min_fps: None,
            samples: 0,
        }
    }

    pub fn update(&mut self) -> Option<f32> {
        self.update_at(Instant::now())
    }

    /// Records one frame at `now`; returns the new rate when a window closes.
    pub fn update_at(&mut self, now: Instant) -> Option<f32> {
        self.frame_count += 1;
        self.accumulated_time += now.saturating_duration_since(self.last_update);
        self.last_update = now;

        if self.accumulated_time < self.window {
            return None;
        }

        let fps = self.frame_count as f32 / self.accumulated_time.as_secs_f32();
        self.current_fps = fps;
        self.min_fps = Some(self.min_fps.map_or(fps, |min| min.min(fps)));
        self.samples += 1;

        self.accumulated_time = Duration::ZERO;
        self.frame_count = 0;

        Some(fps)
    }
}
