use std::time::Duration;

/// Time cursor of a one-shot binding.
///
/// Advances with frame deltas, stops at the end of the clip and reports
/// normalized progress for sampling the binding's tween.
#[derive(Debug, Clone, PartialEq)]
pub struct Playhead {
    pub time: f32,
    pub duration: f32,
    pub time_scale: f32,
    pub paused: bool,
    finished: bool,
}

impl Playhead {
    #[must_use]
    pub fn new(duration: Duration) -> Self {
        Self {
            time: 0.0,
            duration: duration.as_secs_f32(),
            time_scale: 1.0,
            paused: false,
            finished: false,
        }
    }

    /// Advances by `dt` seconds. Returns `true` while the value is still
    /// changing (including the frame that reaches the end).
    pub fn advance(&mut self, dt: f32) -> bool {
        if self.paused || self.finished {
            return false;
        }

        if self.duration <= 0.0 {
            self.finished = true;
            return true;
        }

        self.time += dt * self.time_scale;
        if self.time >= self.duration {
            self.time = self.duration;
            self.finished = true;
        } else if self.time < 0.0 {
            self.time = 0.0;
            self.finished = true;
        }
        true
    }

    /// Normalized progress in `[0, 1]`.
    #[must_use]
    pub fn progress(&self) -> f32 {
        if self.duration <= 0.0 {
            return if self.finished { 1.0 } else { 0.0 };
        }
        (self.time / self.duration).clamp(0.0, 1.0)
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished
    }
}
