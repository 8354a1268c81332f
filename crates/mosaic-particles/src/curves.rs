//! Easing and value-over-progress curves

use serde::{Deserialize, Serialize};

/// Easing curve applied to formation progress before position interpolation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Easing {
    Linear,
    /// `0.5 * (1 - cos(tπ))`, the soft "falling leaf" curve
    SineInOut,
    /// Quartic ease-in-out
    QuartInOut,
}

impl Easing {
    /// Map `t` in [0, 1] to eased progress in [0, 1]
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::SineInOut => 0.5 * (1.0 - (t * std::f32::consts::PI).cos()),
            Easing::QuartInOut => {
                if t < 0.5 {
                    8.0 * t * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(4) / 2.0
                }
            }
        }
    }
}

impl Default for Easing {
    fn default() -> Self {
        Easing::SineInOut
    }
}

/// Late growth curve: 0 until `start`, then `((t - start) / (1 - start))^exponent`.
///
/// Concentrates size growth in the tail of the formation so particles
/// "materialize" near their target instead of growing linearly.
pub fn late_growth(t: f32, start: f32, exponent: f32) -> f32 {
    if t <= start {
        return 0.0;
    }
    let span = (1.0 - start).max(f32::EPSILON);
    ((t - start) / span).min(1.0).powf(exponent)
}

/// Decay envelope `1 - t^exponent`: 1 at the start, 0 at t = 1
pub fn decay(t: f32, exponent: f32) -> f32 {
    1.0 - t.clamp(0.0, 1.0).powf(exponent)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn easings_hit_endpoints_and_midpoint() {
        for easing in [Easing::Linear, Easing::SineInOut, Easing::QuartInOut] {
            assert!(easing.apply(0.0).abs() < 1e-6, "{easing:?} at 0");
            assert!((easing.apply(1.0) - 1.0).abs() < 1e-6, "{easing:?} at 1");
            assert!((easing.apply(0.5) - 0.5).abs() < 1e-5, "{easing:?} at 0.5");
        }
    }

    #[test]
    fn easings_are_monotonic() {
        for easing in [Easing::Linear, Easing::SineInOut, Easing::QuartInOut] {
            let mut prev = easing.apply(0.0);
            for i in 1..=100 {
                let v = easing.apply(i as f32 / 100.0);
                assert!(v >= prev, "{easing:?} decreased at step {i}");
                prev = v;
            }
        }
    }

    #[test]
    fn late_growth_is_flat_then_rising() {
        assert_eq!(late_growth(0.5, 0.7, 0.6), 0.0);
        assert_eq!(late_growth(0.7, 0.7, 0.6), 0.0);
        assert!((late_growth(1.0, 0.7, 0.6) - 1.0).abs() < 1e-6);
        assert!(late_growth(0.8, 0.7, 0.6) < late_growth(0.9, 0.7, 0.6));
    }

    #[test]
    fn decay_envelope() {
        assert!((decay(0.0, 1.2) - 1.0).abs() < 1e-6);
        assert!(decay(1.0, 1.2).abs() < 1e-6);
    }
}
