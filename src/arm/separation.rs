//! Wrist separation along the shoulder axis.

use glam::Vec3;

use crate::config::SeparationConfig;

/// Gap changes below this are ignored (m)
const MIN_GAP_CORRECTION: f32 = 1e-4;

/// Pushes both wrist targets apart along the shoulder-to-shoulder axis so
/// the hands do not collapse onto each other.
#[derive(Debug, Clone)]
pub struct ArmSeparationAdjuster {
    /// Outward push per wrist (m)
    offset: f32,
    /// Target gap between wrists along the shoulder axis (m)
    desired_gap: Option<f32>,
}

impl ArmSeparationAdjuster {
    pub fn new(offset: f32, desired_gap: Option<f32>) -> Self {
        Self {
            offset,
            desired_gap,
        }
    }

    pub fn from_config(config: &SeparationConfig) -> Self {
        Self::new(
            config.offset,
            config.use_desired_gap.then_some(config.desired_gap),
        )
    }

    /// Adjusted `(left, right)` wrist targets.
    ///
    /// Coincident shoulders leave the targets untouched.
    pub fn apply(
        &self,
        left_wrist: Vec3,
        right_wrist: Vec3,
        left_shoulder: Vec3,
        right_shoulder: Vec3,
    ) -> (Vec3, Vec3) {
        let Some(axis) = (left_shoulder - right_shoulder).try_normalize() else {
            return (left_wrist, right_wrist);
        };

        let mut left = left_wrist;
        let mut right = right_wrist;

        if self.offset > 0.0 {
            left += axis * self.offset;
            right -= axis * self.offset;
        }

        // Crossed wrists stay crossed; only the size of the gap is corrected
        if let Some(desired) = self.desired_gap {
            let signed = (left - right).dot(axis);
            let side = if signed < 0.0 { -1.0 } else { 1.0 };
            let delta = desired - signed.abs();
            if delta.abs() > MIN_GAP_CORRECTION {
                left += axis * (0.5 * delta * side);
                right -= axis * (0.5 * delta * side);
            }
        }

        (left, right)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Camera-facing subject: the subject's left shoulder is on +X
    const LS: Vec3 = Vec3::new(0.2, 1.4, 2.0);
    const RS: Vec3 = Vec3::new(-0.2, 1.4, 2.0);

    #[test]
    fn test_fixed_push() {
        let adj = ArmSeparationAdjuster::new(0.05, None);
        let (l, r) = adj.apply(Vec3::new(0.1, 1.0, 2.0), Vec3::new(-0.1, 1.0, 2.0), LS, RS);
        assert!((l.x - 0.15).abs() < 1e-6);
        assert!((r.x + 0.15).abs() < 1e-6);
        assert_eq!(l.y, 1.0);
    }

    #[test]
    fn test_desired_gap_single_step() {
        let adj = ArmSeparationAdjuster::new(0.0, Some(0.4));
        let (l, r) = adj.apply(Vec3::new(0.05, 1.0, 2.0), Vec3::new(-0.05, 1.0, 2.0), LS, RS);
        let gap = (l - r).dot(Vec3::X);
        assert!((gap - 0.4).abs() < 1e-5, "gap={}", gap);
    }

    #[test]
    fn test_crossed_wrists_widen_in_crossed_order() {
        let adj = ArmSeparationAdjuster::new(0.0, Some(0.4));
        // Left wrist sits on the right shoulder's side
        let (l, r) = adj.apply(Vec3::new(-0.05, 1.0, 2.0), Vec3::new(0.05, 1.0, 2.0), LS, RS);
        assert!((l.x + 0.2).abs() < 1e-5, "left={:?}", l);
        assert!((r.x - 0.2).abs() < 1e-5, "right={:?}", r);

        // Too wide while crossed: pulled in, still crossed
        let (l, r) = adj.apply(Vec3::new(-0.3, 1.0, 2.0), Vec3::new(0.3, 1.0, 2.0), LS, RS);
        let gap = (l - r).dot(Vec3::X);
        assert!((gap + 0.4).abs() < 1e-5, "gap={}", gap);
    }

    #[test]
    fn test_gap_already_met_is_untouched() {
        let adj = ArmSeparationAdjuster::new(0.0, Some(0.4));
        let lw = Vec3::new(0.2, 1.0, 2.0);
        let rw = Vec3::new(-0.2, 1.0, 2.0);
        assert_eq!(adj.apply(lw, rw, LS, RS), (lw, rw));
    }

    #[test]
    fn test_coincident_shoulders() {
        let adj = ArmSeparationAdjuster::new(0.05, Some(0.4));
        let lw = Vec3::new(0.1, 1.0, 2.0);
        let rw = Vec3::new(-0.1, 1.0, 2.0);
        assert_eq!(adj.apply(lw, rw, LS, LS), (lw, rw));
    }

    #[test]
    fn test_from_config() {
        let config = SeparationConfig::default();
        let adj = ArmSeparationAdjuster::from_config(&config);
        assert_eq!(adj.desired_gap, None);
        assert_eq!(adj.offset, 0.05);
    }
}
