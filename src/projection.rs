//! Pinhole unprojection of normalized landmarks into world space.
//!
//! Camera space is +X right, +Y up, +Z forward. Landmarks use a top-left
//! origin with `y` growing downward, so `v` is flipped.

use glam::{Affine3A, Vec3};

/// Closest depth a landmark can be placed at (m)
const MIN_DEPTH: f32 = 0.01;

/// Live camera parameters supplied by the host every tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraModel {
    pub vertical_fov_degrees: f32,
    /// Width / height
    pub aspect: f32,
    pub camera_to_world: Affine3A,
}

impl CameraModel {
    pub fn new(vertical_fov_degrees: f32, aspect: f32, camera_to_world: Affine3A) -> Self {
        Self {
            vertical_fov_degrees,
            aspect,
            camera_to_world,
        }
    }
}

impl Default for CameraModel {
    fn default() -> Self {
        Self::new(60.0, 16.0 / 9.0, Affine3A::IDENTITY)
    }
}

/// Projection parameters frozen at sequence start.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReferenceProjection {
    vertical_fov_degrees: f32,
    aspect: f32,
    camera_to_world: Affine3A,
}

impl ReferenceProjection {
    pub fn capture(camera: &CameraModel) -> Self {
        Self {
            vertical_fov_degrees: camera.vertical_fov_degrees,
            aspect: camera.aspect,
            camera_to_world: camera.camera_to_world,
        }
    }

    pub fn vertical_fov_degrees(&self) -> f32 {
        self.vertical_fov_degrees
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn camera_to_world(&self) -> Affine3A {
        self.camera_to_world
    }
}

/// Maps `(nx, ny, depth)` to a world-space point, through either the live
/// camera or a locked [`ReferenceProjection`].
#[derive(Debug, Clone, Default)]
pub struct CameraUnprojector {
    lock_mapping: bool,
    reference: Option<ReferenceProjection>,
}

impl CameraUnprojector {
    pub fn new(lock_mapping: bool) -> Self {
        Self {
            lock_mapping,
            reference: None,
        }
    }

    /// Snapshot `camera`. Later changes to the live camera are ignored while
    /// mapping is locked.
    pub fn lock(&mut self, camera: &CameraModel) {
        let reference = ReferenceProjection::capture(camera);
        tracing::info!(
            "Locked reference projection: fov={:.1}° aspect={:.3}",
            reference.vertical_fov_degrees,
            reference.aspect
        );
        self.reference = Some(reference);
    }

    pub fn is_locked(&self) -> bool {
        self.lock_mapping && self.reference.is_some()
    }

    pub fn reference(&self) -> Option<&ReferenceProjection> {
        self.reference.as_ref()
    }

    /// Unproject a normalized landmark at `depth` meters in front of the camera.
    pub fn unproject(&self, live: &CameraModel, nx: f32, ny: f32, depth: f32) -> Vec3 {
        match self.reference.filter(|_| self.lock_mapping) {
            Some(r) => unproject_point(
                r.vertical_fov_degrees,
                r.aspect,
                &r.camera_to_world,
                nx,
                ny,
                depth,
            ),
            None => unproject_point(
                live.vertical_fov_degrees,
                live.aspect,
                &live.camera_to_world,
                nx,
                ny,
                depth,
            ),
        }
    }
}

/// Core pinhole unprojection.
pub fn unproject_point(
    vertical_fov_degrees: f32,
    aspect: f32,
    camera_to_world: &Affine3A,
    nx: f32,
    ny: f32,
    depth: f32,
) -> Vec3 {
    let nx = nx.clamp(0.0, 1.0);
    let ny = ny.clamp(0.0, 1.0);

    // Normalized device coordinates
    let u = 2.0 * nx - 1.0;
    let v = 1.0 - 2.0 * ny;

    let tan_half = (vertical_fov_degrees.to_radians() * 0.5).tan();
    let ray = Vec3::new(u * aspect * tan_half, v * tan_half, 1.0);

    // ray.z == 1, so scaling by depth puts the point on the z = depth plane
    let point_cam = ray * depth.max(MIN_DEPTH);

    camera_to_world.transform_point3(point_cam)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Quat;

    #[test]
    fn test_center_maps_to_optical_axis() {
        let cam = CameraModel::default();
        let p = CameraUnprojector::new(false).unproject(&cam, 0.5, 0.5, 2.0);
        assert!((p - Vec3::new(0.0, 0.0, 2.0)).length() < 1e-6);
    }

    #[test]
    fn test_top_left_is_up_and_left() {
        let cam = CameraModel::new(90.0, 1.0, Affine3A::IDENTITY);
        let p = CameraUnprojector::new(false).unproject(&cam, 0.0, 0.0, 1.0);
        // tan(45°) = 1 → corners of the z=1 plane at ±1
        assert!((p - Vec3::new(-1.0, 1.0, 1.0)).length() < 1e-5, "got {:?}", p);
    }

    #[test]
    fn test_inputs_are_clamped() {
        let cam = CameraModel::default();
        let un = CameraUnprojector::new(false);
        assert_eq!(un.unproject(&cam, 1.7, -0.2, 1.0), un.unproject(&cam, 1.0, 0.0, 1.0));
        // Depth floor
        let p = un.unproject(&cam, 0.5, 0.5, -3.0);
        assert!((p.z - MIN_DEPTH).abs() < 1e-6);
    }

    #[test]
    fn test_camera_transform_is_applied() {
        let transform = Affine3A::from_rotation_translation(
            Quat::from_rotation_y(std::f32::consts::PI),
            Vec3::new(0.0, 1.5, 0.0),
        );
        let cam = CameraModel::new(60.0, 1.0, transform);
        let p = CameraUnprojector::new(false).unproject(&cam, 0.5, 0.5, 2.0);
        assert!((p - Vec3::new(0.0, 1.5, -2.0)).length() < 1e-5, "got {:?}", p);
    }

    #[test]
    fn test_locked_mapping_ignores_live_changes() {
        let start = CameraModel::new(60.0, 16.0 / 9.0, Affine3A::IDENTITY);
        let mut un = CameraUnprojector::new(true);
        un.lock(&start);
        let before = un.unproject(&start, 0.2, 0.7, 1.8);

        let zoomed = CameraModel::new(
            35.0,
            4.0 / 3.0,
            Affine3A::from_translation(Vec3::new(3.0, 0.0, 0.0)),
        );
        let after = un.unproject(&zoomed, 0.2, 0.7, 1.8);
        assert_eq!(before, after);
        assert!(un.is_locked());
    }

    #[test]
    fn test_unlocked_mapping_follows_live_camera() {
        let mut un = CameraUnprojector::new(false);
        let start = CameraModel::default();
        un.lock(&start);
        let zoomed = CameraModel::new(30.0, 16.0 / 9.0, Affine3A::IDENTITY);
        assert_ne!(
            un.unproject(&start, 0.1, 0.1, 1.0),
            un.unproject(&zoomed, 0.1, 0.1, 1.0)
        );
    }

    #[test]
    fn test_monotonic_in_nx() {
        let cam = CameraModel::default();
        let un = CameraUnprojector::new(false);
        let mut prev = f32::NEG_INFINITY;
        for i in 0..=10 {
            let x = un.unproject(&cam, i as f32 / 10.0, 0.4, 1.5).x;
            assert!(x > prev, "x should grow with nx");
            prev = x;
        }
    }
}
