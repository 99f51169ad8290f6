//! Elbow pole hint for two-bone IK.

use glam::Vec3;

use crate::landmarks::LandmarkPoint;
use crate::projection::{CameraModel, CameraUnprojector};

/// Places the IK pole target off the elbow along the arm's bend-plane
/// normal, keeping the normal's sign stable across frames.
#[derive(Debug, Clone)]
pub struct ElbowHintSolver {
    /// Offset of the hint from the elbow (m)
    out_of_plane: f32,
    /// Bend angles below this count as a straight arm (degrees)
    straight_threshold_deg: f32,
    previous_normal: Option<Vec3>,
}

impl ElbowHintSolver {
    pub fn new(out_of_plane: f32, straight_threshold_deg: f32) -> Self {
        Self {
            out_of_plane,
            straight_threshold_deg,
            previous_normal: None,
        }
    }

    /// Hint position from world-space shoulder, elbow and wrist points.
    pub fn solve(&mut self, shoulder: Vec3, elbow: Vec3, wrist: Vec3) -> Vec3 {
        let upper = (elbow - shoulder).normalize_or_zero();
        let lower = (wrist - elbow).normalize_or_zero();

        // A zero-length segment reads as a straight arm
        let bend_deg = if upper == Vec3::ZERO || lower == Vec3::ZERO {
            0.0
        } else {
            upper.dot(lower).clamp(-1.0, 1.0).acos().to_degrees()
        };

        if bend_deg < self.straight_threshold_deg {
            if let Some(previous) = self.previous_normal {
                return elbow + previous * self.out_of_plane;
            }
        }

        let Some(mut normal) = upper.cross(lower).try_normalize() else {
            tracing::trace!("Degenerate elbow plane with no previous normal");
            return elbow;
        };

        if let Some(previous) = self.previous_normal {
            if previous.dot(normal) < 0.0 {
                normal = -normal;
            }
        }
        self.previous_normal = Some(normal);

        elbow + normal * self.out_of_plane
    }

    /// Unproject the three pose landmarks at `depth` and solve.
    pub fn solve_landmarks(
        &mut self,
        unprojector: &CameraUnprojector,
        camera: &CameraModel,
        depth: f32,
        shoulder: &LandmarkPoint,
        elbow: &LandmarkPoint,
        wrist: &LandmarkPoint,
    ) -> Vec3 {
        let s = unprojector.unproject(camera, shoulder.x, shoulder.y, depth);
        let e = unprojector.unproject(camera, elbow.x, elbow.y, depth);
        let w = unprojector.unproject(camera, wrist.x, wrist.y, depth);
        self.solve(s, e, w)
    }

    /// Last stored bend-plane normal, if any
    pub fn continuity(&self) -> Option<Vec3> {
        self.previous_normal
    }

    pub fn reset(&mut self) {
        self.previous_normal = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OFFSET: f32 = 0.07;

    fn solver() -> ElbowHintSolver {
        ElbowHintSolver::new(OFFSET, 8.0)
    }

    #[test]
    fn test_bent_arm_offsets_along_plane_normal() {
        let mut s = solver();
        let elbow = Vec3::new(0.3, 0.0, 0.0);
        let hint = s.solve(Vec3::ZERO, elbow, Vec3::new(0.3, 0.3, 0.0));
        // X × Y = +Z
        assert!((hint - (elbow + Vec3::Z * OFFSET)).length() < 1e-5, "got {:?}", hint);
    }

    #[test]
    fn test_normal_sign_is_continuous() {
        let mut s = solver();
        let elbow = Vec3::new(0.3, 0.0, 0.0);
        s.solve(Vec3::ZERO, elbow, Vec3::new(0.3, 0.3, 0.0));
        // Bending the other way would give -Z; continuity keeps +Z
        let hint = s.solve(Vec3::ZERO, elbow, Vec3::new(0.3, -0.3, 0.0));
        assert!(hint.z > 0.0, "Hint should not flip sides, got {:?}", hint);
    }

    #[test]
    fn test_straight_arm_reuses_previous_normal() {
        let mut s = solver();
        let elbow = Vec3::new(0.3, 0.0, 0.0);
        s.solve(Vec3::ZERO, elbow, Vec3::new(0.3, 0.3, 0.0));

        // 2° bend toward -Y: below the threshold
        let wrist = elbow + Vec3::new(0.3, -0.3 * 2f32.to_radians().tan(), 0.0);
        let hint = s.solve(Vec3::ZERO, elbow, wrist);
        assert!((hint - (elbow + Vec3::Z * OFFSET)).length() < 1e-5);
        assert_eq!(s.continuity(), Some(Vec3::Z));
    }

    #[test]
    fn test_straight_arm_without_history() {
        let mut s = solver();
        let elbow = Vec3::new(0.3, 0.0, 0.0);
        let hint = s.solve(Vec3::ZERO, elbow, Vec3::new(0.6, 0.0, 0.0));
        assert_eq!(hint, elbow);
        assert!(s.continuity().is_none(), "A zero normal must not become history");

        // Coincident points behave the same
        let hint = s.solve(elbow, elbow, elbow);
        assert_eq!(hint, elbow);
    }

    #[test]
    fn test_reset_forgets_normal() {
        let mut s = solver();
        s.solve(Vec3::ZERO, Vec3::X, Vec3::new(1.0, 1.0, 0.0));
        s.reset();
        assert!(s.continuity().is_none());
    }
}
