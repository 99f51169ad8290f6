//! Joint-angle limits, MCP cohesion and soft clamping.
//!
//! Angles are measured on the rest-relative offset `local * rest⁻¹`,
//! decomposed as flexion (X), abduction (Y) and twist (Z) with Y applied
//! outermost. A bone at its rest rotation therefore sits at zero on every
//! axis.

use glam::{EulerRot, Quat};

use super::segment::JointKind;
use crate::config::JointLimitConfig;

/// Softness is capped just below 1 so a violated bound is still approached
const MAX_SOFTNESS: f32 = 0.995;

/// Angle changes below this are not written back (degrees)
const WRITE_EPSILON_DEG: f32 = 1e-4;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AngleRange {
    pub min: f32,
    pub max: f32,
}

impl AngleRange {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, degrees: f32) -> bool {
        (self.min..=self.max).contains(&degrees)
    }

    pub fn clamp(&self, degrees: f32) -> f32 {
        degrees.clamp(self.min, self.max)
    }
}

impl From<[f32; 2]> for AngleRange {
    fn from(range: [f32; 2]) -> Self {
        Self::new(range[0], range[1])
    }
}

/// Per-axis ranges of one joint (degrees).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointRanges {
    pub flex: AngleRange,
    pub abduction: AngleRange,
    pub twist: AngleRange,
}

/// Joint ranges for every [`JointKind`].
#[derive(Debug, Clone)]
pub struct JointLimits {
    mcp_flex: AngleRange,
    pip_flex: AngleRange,
    dip_flex: AngleRange,
    mcp_abduction: AngleRange,
    twist: AngleRange,
    thumb_mcp: AngleRange,
    thumb_ip: AngleRange,
    thumb_twist: AngleRange,
    thumb_abduction: AngleRange,
}

impl JointLimits {
    pub fn from_config(config: &JointLimitConfig) -> Self {
        Self {
            mcp_flex: config.mcp_flex.into(),
            pip_flex: config.pip_flex.into(),
            dip_flex: config.dip_flex.into(),
            mcp_abduction: config.mcp_abduction.into(),
            twist: config.twist.into(),
            thumb_mcp: config.thumb_mcp.into(),
            thumb_ip: config.thumb_ip.into(),
            thumb_twist: config.thumb_twist.into(),
            thumb_abduction: config.thumb_abduction.into(),
        }
    }

    /// Abduction range shared by the four knuckles
    pub fn mcp_abduction(&self) -> AngleRange {
        self.mcp_abduction
    }

    pub fn ranges(&self, joint: JointKind) -> JointRanges {
        // Hinge joints keep a small fixed side play
        let hinge_play = AngleRange::new(-5.0, 5.0);
        match joint {
            JointKind::ThumbMcp => JointRanges {
                flex: self.thumb_mcp,
                abduction: self.thumb_abduction,
                twist: self.thumb_twist,
            },
            JointKind::ThumbIp => JointRanges {
                flex: self.thumb_ip,
                abduction: AngleRange::new(-10.0, 10.0),
                twist: self.thumb_twist,
            },
            JointKind::ThumbDistal => JointRanges {
                flex: AngleRange::new(0.0, 0.0),
                abduction: hinge_play,
                twist: AngleRange::new(-10.0, 10.0),
            },
            JointKind::Mcp => JointRanges {
                flex: self.mcp_flex,
                abduction: self.mcp_abduction,
                twist: self.twist,
            },
            JointKind::Pip => JointRanges {
                flex: self.pip_flex,
                abduction: hinge_play,
                twist: self.twist,
            },
            JointKind::Dip => JointRanges {
                flex: self.dip_flex,
                abduction: hinge_play,
                twist: self.twist,
            },
        }
    }
}

impl Default for JointLimits {
    fn default() -> Self {
        Self::from_config(&JointLimitConfig::default())
    }
}

/// Move `value` toward the violated bound of `range`.
///
/// `softness = 0` snaps to the bound. Higher softness converges more slowly;
/// larger `dt` converges faster. The result never passes the bound.
pub fn soft_clamp_deg(value: f32, range: AngleRange, softness: f32, dt: f32) -> f32 {
    let bound = if value < range.min {
        range.min
    } else if value > range.max {
        range.max
    } else {
        return value;
    };

    if softness <= 0.0 {
        return bound;
    }

    // Fraction of the remaining distance kept after one 60 Hz frame is `softness`
    let keep = softness.min(MAX_SOFTNESS).powf(dt.max(0.0) * 60.0);
    value + (bound - value) * (1.0 - keep)
}

/// Rest-relative joint angles in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointAngles {
    pub flex: f32,
    pub abduction: f32,
    pub twist: f32,
}

impl JointAngles {
    pub fn measure(local: Quat, rest: Quat) -> Self {
        let (y, x, z) = (local * rest.inverse()).to_euler(EulerRot::YXZ);
        Self {
            flex: x.to_degrees(),
            abduction: y.to_degrees(),
            twist: z.to_degrees(),
        }
    }

    pub fn to_local(self, rest: Quat) -> Quat {
        Quat::from_euler(
            EulerRot::YXZ,
            self.abduction.to_radians(),
            self.flex.to_radians(),
            self.twist.to_radians(),
        ) * rest
    }

    /// Whether any axis moved enough to be worth writing back
    pub fn differs_from(&self, other: &JointAngles) -> bool {
        (self.flex - other.flex).abs() > WRITE_EPSILON_DEG
            || (self.abduction - other.abduction).abs() > WRITE_EPSILON_DEG
            || (self.twist - other.twist).abs() > WRITE_EPSILON_DEG
    }

    /// Every axis hard-clamped into `ranges`
    pub fn clamped(self, ranges: &JointRanges) -> Self {
        Self {
            flex: ranges.flex.clamp(self.flex),
            abduction: ranges.abduction.clamp(self.abduction),
            twist: ranges.twist.clamp(self.twist),
        }
    }

    pub fn soft_clamped(self, ranges: &JointRanges, softness: f32, dt: f32) -> Self {
        Self {
            flex: soft_clamp_deg(self.flex, ranges.flex, softness, dt),
            abduction: soft_clamp_deg(self.abduction, ranges.abduction, softness, dt),
            twist: soft_clamp_deg(self.twist, ranges.twist, softness, dt),
        }
    }
}

/// Pull each knuckle's abduction toward the shared average.
///
/// The average is clamped into `range` first. `cohesion` 0 leaves the
/// angles alone, 1 snaps them all to the average.
pub fn apply_cohesion(angles: &mut [JointAngles], range: AngleRange, cohesion: f32) {
    if angles.is_empty() {
        return;
    }
    let average =
        angles.iter().map(|a| a.abduction).sum::<f32>() / angles.len() as f32;
    let target = range.clamp(average);
    let t = cohesion.clamp(0.0, 1.0);
    for a in angles.iter_mut() {
        a.abduction += (target - a.abduction) * t;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RANGE: AngleRange = AngleRange::new(-20.0, 20.0);

    #[test]
    fn test_inside_range_untouched() {
        assert_eq!(soft_clamp_deg(12.5, RANGE, 0.35, 1.0 / 60.0), 12.5);
    }

    #[test]
    fn test_zero_softness_snaps() {
        assert_eq!(soft_clamp_deg(45.0, RANGE, 0.0, 1.0 / 60.0), 20.0);
        assert_eq!(soft_clamp_deg(-45.0, RANGE, 0.0, 1.0 / 60.0), -20.0);
    }

    #[test]
    fn test_soft_clamp_never_overshoots() {
        for softness in [0.1, 0.35, 0.9, 1.0] {
            let mut v = 80.0;
            for _ in 0..2000 {
                let next = soft_clamp_deg(v, RANGE, softness, 1.0 / 60.0);
                assert!(next >= RANGE.max, "softness {} overshot: {}", softness, next);
                assert!(next <= v, "soft clamp must move toward the bound");
                v = next;
            }
            assert!(v - RANGE.max < 1.0, "softness {} stalled at {}", softness, v);
        }
    }

    #[test]
    fn test_larger_dt_converges_faster() {
        let slow = soft_clamp_deg(40.0, RANGE, 0.35, 1.0 / 120.0);
        let fast = soft_clamp_deg(40.0, RANGE, 0.35, 1.0 / 30.0);
        assert!(fast < slow, "fast={} slow={}", fast, slow);
        assert!(fast >= RANGE.max);
    }

    #[test]
    fn test_angles_round_trip_through_rest() {
        let rest = Quat::from_rotation_y(0.4) * Quat::from_rotation_x(-0.2);
        let angles = JointAngles {
            flex: 30.0,
            abduction: -12.0,
            twist: 5.0,
        };
        let measured = JointAngles::measure(angles.to_local(rest), rest);
        assert!((measured.flex - 30.0).abs() < 1e-2);
        assert!((measured.abduction + 12.0).abs() < 1e-2);
        assert!((measured.twist - 5.0).abs() < 1e-2);
    }

    #[test]
    fn test_rest_measures_zero() {
        let rest = Quat::from_rotation_z(1.1);
        let a = JointAngles::measure(rest, rest);
        assert!(a.flex.abs() < 1e-3 && a.abduction.abs() < 1e-3 && a.twist.abs() < 1e-3);
    }

    #[test]
    fn test_cohesion_pulls_toward_clamped_average() {
        let mut angles = [10.0, 30.0, 40.0, 60.0].map(|abduction| JointAngles {
            flex: 0.0,
            abduction,
            twist: 0.0,
        });
        // Average 35 → clamped to 20
        apply_cohesion(&mut angles, RANGE, 0.5);
        assert!((angles[0].abduction - 15.0).abs() < 1e-4);
        assert!((angles[3].abduction - 40.0).abs() < 1e-4);

        let mut same = [5.0; 4].map(|abduction| JointAngles {
            flex: 0.0,
            abduction,
            twist: 0.0,
        });
        apply_cohesion(&mut same, RANGE, 1.0);
        assert!(same.iter().all(|a| (a.abduction - 5.0).abs() < 1e-6));
    }

    #[test]
    fn test_thumb_and_finger_ranges_differ() {
        let limits = JointLimits::default();
        let thumb = limits.ranges(JointKind::ThumbMcp);
        let mcp = limits.ranges(JointKind::Mcp);
        assert_eq!(thumb.flex, AngleRange::new(0.0, 55.0));
        assert_eq!(mcp.flex, AngleRange::new(-10.0, 90.0));
        assert_eq!(limits.ranges(JointKind::Pip).abduction, AngleRange::new(-5.0, 5.0));
    }
}
