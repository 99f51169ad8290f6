//! Wrist target orientation from the 21 hand landmarks.
//!
//! The hand frame is built from the wrist → middle MCP direction (forward)
//! and the index MCP ↔ pinky MCP direction (across). The palm normal is
//! their cross product, kept sign-continuous across frames.

use glam::{EulerRot, Mat3, Quat, Vec3};

use crate::landmarks::{HandLandmark, LandmarkId};
use crate::smoothing::slerp_direction;

/// Below this squared length the palm normal counts as degenerate
const DEGENERATE_NORMAL_SQ: f32 = 1e-8;

/// Blend factor toward the new normal when updating continuity
const CONTINUITY_BLEND: f32 = 0.5;

/// Rotation whose local +Z looks along `forward` with local +Y as close to
/// `up` as possible.
///
/// Falls back to an arbitrary perpendicular up when `up` is parallel to
/// `forward`, and to the identity for a zero `forward`.
pub fn look_rotation(forward: Vec3, up: Vec3) -> Quat {
    let Some(z) = forward.try_normalize() else {
        return Quat::IDENTITY;
    };
    let x = up
        .cross(z)
        .try_normalize()
        .unwrap_or_else(|| z.any_orthonormal_vector());
    let y = z.cross(x);
    Quat::from_mat3(&Mat3::from_cols(x, y, z)).normalize()
}

/// Solves a stable wrist orientation for one hand.
///
/// Owns the palm-normal continuity state of that hand.
#[derive(Debug, Clone, Default)]
pub struct WristOrientationSolver {
    previous_normal: Option<Vec3>,
}

impl WristOrientationSolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Orientation for a full 21-point hand in world space.
    ///
    /// `is_left` mirrors the across axis so both hands share a palm-relative
    /// convention. `show_back_of_hand` reverses the palm normal.
    pub fn solve(
        &mut self,
        points: &[Vec3; HandLandmark::COUNT],
        is_left: bool,
        show_back_of_hand: bool,
    ) -> Quat {
        let wrist = points[HandLandmark::Wrist.index()];
        let index_mcp = points[HandLandmark::IndexMcp.index()];
        let middle_mcp = points[HandLandmark::MiddleMcp.index()];
        let pinky_mcp = points[HandLandmark::PinkyMcp.index()];

        let forward = (middle_mcp - wrist).try_normalize().unwrap_or(Vec3::Z);
        let mut across = (index_mcp - pinky_mcp).normalize_or_zero();
        if is_left {
            across = -across;
        }

        let raw = across.cross(forward);
        let mut normal = if raw.length_squared() < DEGENERATE_NORMAL_SQ {
            tracing::trace!("Degenerate palm normal, reusing previous");
            self.previous_normal.unwrap_or(Vec3::Y)
        } else {
            raw.normalize()
        };

        if show_back_of_hand {
            normal = -normal;
        }

        if let Some(previous) = self.previous_normal {
            if previous.dot(normal) < 0.0 {
                normal = -normal;
            }
        }

        self.previous_normal = Some(match self.previous_normal {
            Some(previous) => slerp_direction(previous, normal, CONTINUITY_BLEND),
            None => normal,
        });

        look_rotation(forward, normal)
    }

    /// Last stored palm normal, if any
    pub fn continuity(&self) -> Option<Vec3> {
        self.previous_normal
    }

    pub fn reset(&mut self) {
        self.previous_normal = None;
    }
}

/// Offsets and smoothing applied to a solved wrist rotation.
#[derive(Debug, Clone)]
pub struct WristRotationPost {
    /// Applied in the solved frame (right-multiplied)
    euler_offset: Quat,
    roll_degrees: f32,
    /// Slerp factor toward the new rotation; `None` disables smoothing
    smoothing: Option<f32>,
    previous: Option<Quat>,
}

impl WristRotationPost {
    /// `euler_offset_deg` is `[x, y, z]` in degrees, applied Z first, then X,
    /// then Y.
    pub fn new(euler_offset_deg: [f32; 3], roll_degrees: f32, smoothing: Option<f32>) -> Self {
        let [x, y, z] = euler_offset_deg;
        Self {
            euler_offset: Quat::from_euler(
                EulerRot::YXZ,
                y.to_radians(),
                x.to_radians(),
                z.to_radians(),
            ),
            roll_degrees,
            smoothing: smoothing.map(|t| t.clamp(0.0, 1.0)),
            previous: None,
        }
    }

    pub fn apply(&mut self, solved: Quat) -> Quat {
        let mut rotation = solved * self.euler_offset;

        if self.roll_degrees.abs() > 0.001 {
            let forward = rotation * Vec3::Z;
            rotation = Quat::from_axis_angle(forward, self.roll_degrees.to_radians()) * rotation;
        }

        if let Some(t) = self.smoothing {
            if let Some(previous) = self.previous {
                rotation = previous.slerp(rotation, t);
            }
            self.previous = Some(rotation);
        }

        rotation.normalize()
    }

    pub fn reset(&mut self) {
        self.previous = None;
    }
}
