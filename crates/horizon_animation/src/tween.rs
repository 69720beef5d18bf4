use serde::{Deserialize, Serialize};

use crate::easing::Easing;

/// A scalar keyframe track over normalized progress `[0, 1]`.
///
/// The easing applies inside each keyframe segment, so a track such as
/// `[0.0, 0.6, 1.0] -> [1.0, 1.0, 0.0]` holds its value for the first 60% of
/// the trigger and then eases out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tween {
    pub times: Vec<f32>,
    pub values: Vec<f32>,
    #[serde(default)]
    pub easing: Easing,
}

impl Tween {
    /// A two-key tween from `from` to `to`.
    #[must_use]
    pub fn between(from: f32, to: f32, easing: Easing) -> Self {
        Self {
            times: vec![0.0, 1.0],
            values: vec![from, to],
            easing,
        }
    }

    /// Holds `value` until `hold`, then eases to `to`.
    #[must_use]
    pub fn hold_then(value: f32, hold: f32, to: f32, easing: Easing) -> Self {
        Self {
            times: vec![0.0, hold.clamp(0.0, 1.0), 1.0],
            values: vec![value, value, to],
            easing,
        }
    }

    /// Value at the start of the track.
    #[must_use]
    pub fn initial(&self) -> f32 {
        self.values.first().copied().unwrap_or_default()
    }

    /// Samples the track at `progress`, clamped to its first and last keys.
    #[must_use]
    pub fn sample(&self, progress: f32) -> f32 {
        let len = self.times.len().min(self.values.len());
        match len {
            0 => return 0.0,
            1 => return self.values[0],
            _ => {}
        }

        // First index whose time is strictly after `progress`.
        let next = self.times[..len].partition_point(|&t| t <= progress);
        if next == 0 {
            return self.values[0];
        }
        if next >= len {
            return self.values[len - 1];
        }

        let prev = next - 1;
        let (t0, t1) = (self.times[prev], self.times[next]);
        let span = t1 - t0;
        let local = if span > f32::EPSILON {
            (progress - t0) / span
        } else {
            1.0
        };
        let (v0, v1) = (self.values[prev], self.values[next]);
        v0 + (v1 - v0) * self.easing.apply(local)
    }
}
