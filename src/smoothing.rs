//! Temporal smoothing primitives.
//!
//! [`AdaptiveVectorFilter`] is a velocity-adaptive low-pass filter over a 3D
//! vector stream (the 1-Euro filter): smooth when the signal is slow, low lag
//! when it moves fast. It is used for target positions, hint positions and
//! finger directions.
//!
//! The filter is written here rather than built from `signal_smooth`, whose
//! 1-Euro filter is scalar: it adapts on per-component speed and swaps a
//! non-positive `dt` for 1/60 s. This one adapts on the speed of the whole
//! vector and floors `dt` at `MIN_DT`, so a zero-length tick barely moves
//! the output.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

use crate::config::FilterTuning;

/// Lower bound on the sampling interval used to derive a frequency.
const MIN_DT: f32 = 1e-6;

/// Which smoothing algorithm drives finger directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SmoothingMode {
    /// Adaptive low-pass filter
    OneEuro,
    /// Plain spherical interpolation toward the previous direction
    Slerp,
}

impl SmoothingMode {
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "one_euro" | "oneeuro" | "1euro" => Self::OneEuro,
            "slerp" | "simple" => Self::Slerp,
            _ => Self::OneEuro,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OneEuro => "one_euro",
            Self::Slerp => "slerp",
        }
    }

    pub const ALL: [SmoothingMode; 2] = [Self::OneEuro, Self::Slerp];
}

impl Default for SmoothingMode {
    fn default() -> Self {
        Self::OneEuro
    }
}

/// Per-signal filter history.
#[derive(Debug, Clone, Copy, Default)]
struct FilterState {
    value: Vec3,
    derivative: Vec3,
}

/// Adaptive low-pass filter over a `Vec3` stream.
#[derive(Debug, Clone)]
pub struct AdaptiveVectorFilter {
    /// Baseline cutoff (Hz)
    min_cutoff: f32,
    /// Velocity sensitivity
    beta: f32,
    /// Derivative cutoff (Hz)
    d_cutoff: f32,
    /// `None` until the first sample arrives
    state: Option<FilterState>,
}

impl AdaptiveVectorFilter {
    pub fn new(min_cutoff: f32, beta: f32, d_cutoff: f32) -> Self {
        Self {
            min_cutoff,
            beta,
            d_cutoff,
            state: None,
        }
    }

    pub fn from_tuning(tuning: &FilterTuning) -> Self {
        Self::new(tuning.min_cutoff, tuning.beta, tuning.d_cutoff)
    }

    /// Smoothing coefficient for `cutoff` at sampling frequency `freq`.
    fn alpha(freq: f32, cutoff: f32) -> f32 {
        1.0 / (1.0 + freq / (2.0 * PI * cutoff))
    }

    /// Filter one sample taken `dt` seconds after the previous one.
    ///
    /// The first sample is returned unchanged.
    pub fn filter(&mut self, sample: Vec3, dt: f32) -> Vec3 {
        let state = match self.state.as_mut() {
            Some(s) => s,
            None => {
                self.state = Some(FilterState {
                    value: sample,
                    derivative: Vec3::ZERO,
                });
                return sample;
            }
        };

        let freq = 1.0 / dt.max(MIN_DT);

        let derivative = (sample - state.value) * freq;
        let a_d = Self::alpha(freq, self.d_cutoff);
        state.derivative = state.derivative.lerp(derivative, a_d);

        let cutoff = self.min_cutoff + self.beta * state.derivative.length();
        let a = Self::alpha(freq, cutoff);
        state.value = state.value.lerp(sample, a);

        state.value
    }

    /// Whether any sample has been seen.
    pub fn is_primed(&self) -> bool {
        self.state.is_some()
    }

    /// Forget all history; the next sample passes through.
    pub fn reset(&mut self) {
        self.state = None;
    }
}

/// Spherical interpolation between two directions.
///
/// Lengths are interpolated linearly. Opposite directions rotate about an
/// arbitrary perpendicular axis.
pub fn slerp_direction(from: Vec3, to: Vec3, t: f32) -> Vec3 {
    let (Some(a), Some(b)) = (from.try_normalize(), to.try_normalize()) else {
        return from.lerp(to, t);
    };
    let length = from.length() + (to.length() - from.length()) * t;

    let theta = a.dot(b).clamp(-1.0, 1.0).acos();
    if theta < 1e-5 {
        return a.lerp(b, t).normalize_or_zero() * length;
    }

    let axis = a.cross(b).try_normalize().unwrap_or_else(|| a.any_orthonormal_vector());
    Quat::from_axis_angle(axis, theta * t) * a * length
}

/// Keep `last` when `candidate` is within `deadzone_deg` of it.
///
/// Returns the accepted direction.
pub fn direction_deadzone(last: Vec3, candidate: Vec3, deadzone_deg: f32) -> Vec3 {
    if deadzone_deg > 0.0 && last.angle_between(candidate).to_degrees() < deadzone_deg {
        last
    } else {
        candidate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_sample_passes_through() {
        let mut f = AdaptiveVectorFilter::new(1.0, 0.3, 1.0);
        let v = Vec3::new(0.3, -1.2, 4.0);
        assert_eq!(f.filter(v, 1.0 / 60.0), v);
        assert!(f.is_primed());
    }

    #[test]
    fn test_constant_input_converges() {
        let mut f = AdaptiveVectorFilter::new(1.0, 0.0, 1.0);
        let dt = 1.0 / 60.0;
        f.filter(Vec3::ZERO, dt);

        let target = Vec3::new(1.0, 2.0, -1.0);
        let mut out = Vec3::ZERO;
        for _ in 0..300 {
            out = f.filter(target, dt);
        }
        let err = (out - target).length() / target.length();
        assert!(err < 0.01, "Should be within 1% after 300 ticks, err={}", err);
    }

    #[test]
    fn test_output_stays_between_previous_and_sample() {
        let mut f = AdaptiveVectorFilter::new(1.5, 0.03, 1.0);
        f.filter(Vec3::ZERO, 1.0 / 30.0);
        let out = f.filter(Vec3::X, 1.0 / 30.0);
        assert!(out.x > 0.0 && out.x < 1.0, "Expected partial step, got {}", out.x);
        assert_eq!(out.y, 0.0);
    }

    #[test]
    fn test_beta_reduces_lag_for_fast_motion() {
        let dt = 1.0 / 60.0;
        let mut slow = AdaptiveVectorFilter::new(1.0, 0.0, 1.0);
        let mut fast = AdaptiveVectorFilter::new(1.0, 5.0, 1.0);
        slow.filter(Vec3::ZERO, dt);
        fast.filter(Vec3::ZERO, dt);

        let mut a = Vec3::ZERO;
        let mut b = Vec3::ZERO;
        for i in 1..=10 {
            let x = Vec3::X * i as f32;
            a = slow.filter(x, dt);
            b = fast.filter(x, dt);
        }
        assert!(b.x > a.x, "High beta should track a ramp more closely");
    }

    #[test]
    fn test_zero_dt_does_not_produce_nan() {
        let mut f = AdaptiveVectorFilter::new(1.0, 0.3, 1.0);
        f.filter(Vec3::ZERO, 0.0);
        let out = f.filter(Vec3::ONE, 0.0);
        assert!(out.is_finite());
    }

    #[test]
    fn test_zero_dt_is_floored_not_replaced() {
        let mut f = AdaptiveVectorFilter::new(1.0, 0.0, 1.0);
        f.filter(Vec3::ZERO, 1.0 / 60.0);
        // A 1/60 s step would move about 9% of the way
        let out = f.filter(Vec3::X, 0.0);
        assert!(out.x > 0.0 && out.x < 1e-3, "Zero dt should barely move, got {}", out.x);
    }

    #[test]
    fn test_adapts_on_vector_speed() {
        let dt = 1.0 / 60.0;
        let diagonal = Vec3::ONE.normalize();
        let mut along_x = AdaptiveVectorFilter::new(1.0, 2.0, 1.0);
        let mut along_diag = AdaptiveVectorFilter::new(1.0, 2.0, 1.0);
        along_x.filter(Vec3::ZERO, dt);
        along_diag.filter(Vec3::ZERO, dt);

        for i in 1..=8 {
            let step = 0.1 * i as f32;
            let a = along_x.filter(Vec3::X * step, dt);
            let b = along_diag.filter(diagonal * step, dt);
            // Same speed, same lag, whatever the direction
            assert!((a.length() - b.length()).abs() < 1e-5, "{} vs {}", a.length(), b.length());
        }
    }

    #[test]
    fn test_reset() {
        let mut f = AdaptiveVectorFilter::new(1.0, 0.3, 1.0);
        f.filter(Vec3::ZERO, 0.1);
        f.reset();
        assert!(!f.is_primed());
        assert_eq!(f.filter(Vec3::Y, 0.1), Vec3::Y);
    }

    #[test]
    fn test_slerp_direction_halfway() {
        let mid = slerp_direction(Vec3::X, Vec3::Y, 0.5);
        let expected = Vec3::new(1.0, 1.0, 0.0).normalize();
        assert!((mid - expected).length() < 1e-5);
    }

    #[test]
    fn test_slerp_direction_opposite_stays_unit() {
        let mid = slerp_direction(Vec3::X, -Vec3::X, 0.5);
        assert!((mid.length() - 1.0).abs() < 1e-5);
        assert!(mid.dot(Vec3::X).abs() < 1e-4);
    }

    #[test]
    fn test_deadzone() {
        let last = Vec3::Z;
        let tiny = Quat::from_rotation_x(0.5f32.to_radians()) * Vec3::Z;
        let big = Quat::from_rotation_x(5.0f32.to_radians()) * Vec3::Z;
        assert_eq!(direction_deadzone(last, tiny, 1.0), last);
        assert_eq!(direction_deadzone(last, big, 1.0), big);
    }

    #[test]
    fn test_mode_names() {
        for mode in SmoothingMode::ALL {
            assert_eq!(SmoothingMode::from_str(mode.as_str()), mode);
        }
    }
}
