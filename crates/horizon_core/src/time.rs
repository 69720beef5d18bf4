#[cfg(not(target_arch = "wasm32"))]
pub use std::time::{Duration, Instant};

#[cfg(target_arch = "wasm32")]
pub use web_time::{Duration, Instant};

/// Per-frame clock driving scroll playheads.
///
/// Deltas larger than `max_delta` are clamped so a backgrounded tab does not
/// fast-forward one-shot animations in a single frame.
#[derive(Debug, Clone)]
pub struct FrameClock {
    start_time: Instant,
    last_tick: Instant,
    max_delta: Duration,
    /// Time since last tick (after clamping)
    pub delta: Duration,
    /// Total elapsed time since creation
    pub elapsed: Duration,
    /// Total number of ticks
    pub frame_count: u64,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new(Duration::from_millis(100))
    }
}

impl FrameClock {
    #[must_use]
    pub fn new(max_delta: Duration) -> Self {
        Self::starting_at(Instant::now(), max_delta)
    }

    #[must_use]
    pub fn starting_at(now: Instant, max_delta: Duration) -> Self {
        Self {
            start_time: now,
            last_tick: now,
            max_delta,
            delta: Duration::ZERO,
            elapsed: Duration::ZERO,
            frame_count: 0,
        }
    }

    /// Advances to `now` and returns the clamped delta.
    pub fn tick_at(&mut self, now: Instant) -> Duration {
        let raw = now.saturating_duration_since(self.last_tick);
        self.delta = raw.min(self.max_delta);
        self.elapsed = now.saturating_duration_since(self.start_time);
        self.last_tick = now;
        self.frame_count += 1;
        self.delta
    }

    pub fn tick(&mut self) -> Duration {
        self.tick_at(Instant::now())
    }

    #[must_use]
    pub fn dt_seconds(&self) -> f32 {
        self.delta.as_secs_f32()
    }
}
