use serde::{Deserialize, Serialize};

/// Easing curves applied to a normalized progress value.
///
/// `Power*` curves follow the usual `powerN` family: degree 1 is quadratic,
/// degree 2 cubic, and so on.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", content = "degree", rename_all = "snake_case")]
pub enum Easing {
    #[default]
    Linear,
    PowerIn(u8),
    PowerOut(u8),
    PowerInOut(u8),
    SineInOut,
    /// Jumps to the end value once progress reaches 1.
    Step,
}

impl Easing {
    /// Maps `t` (clamped to `[0, 1]`) through the curve.
    #[must_use]
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::PowerIn(degree) => t.powi(i32::from(degree) + 1),
            Self::PowerOut(degree) => 1.0 - (1.0 - t).powi(i32::from(degree) + 1),
            Self::PowerInOut(degree) => {
                let exponent = i32::from(degree) + 1;
                if t < 0.5 {
                    0.5 * (2.0 * t).powi(exponent)
                } else {
                    1.0 - 0.5 * (2.0 * (1.0 - t)).powi(exponent)
                }
            }
            Self::SineInOut => -0.5 * ((std::f32::consts::PI * t).cos() - 1.0),
            Self::Step => {
                if t >= 1.0 {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-5;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < EPSILON
    }

    #[test]
    fn every_curve_pins_the_endpoints() {
        for easing in [
            Easing::Linear,
            Easing::PowerIn(2),
            Easing::PowerOut(2),
            Easing::PowerInOut(1),
            Easing::SineInOut,
        ] {
            assert!(approx(easing.apply(0.0), 0.0), "{easing:?} at 0");
            assert!(approx(easing.apply(1.0), 1.0), "{easing:?} at 1");
        }
    }

    #[test]
    fn out_curves_lead_in_curves() {
        assert!(Easing::PowerOut(2).apply(0.3) > Easing::Linear.apply(0.3));
        assert!(Easing::PowerIn(2).apply(0.3) < Easing::Linear.apply(0.3));
        assert!(approx(Easing::PowerInOut(1).apply(0.5), 0.5));
    }

    #[test]
    fn input_is_clamped() {
        assert!(approx(Easing::Linear.apply(-3.0), 0.0));
        assert!(approx(Easing::PowerOut(1).apply(7.0), 1.0));
        assert!(approx(Easing::Step.apply(0.99), 0.0));
    }
}
