//! Finger retargeting.
//!
//! Drives up to 15 finger-segment bones per hand from 21 world-space hand
//! landmarks. Rotations are composed on a cached rest pose, velocity-limited,
//! then post-processed with MCP cohesion and soft joint limits.

pub mod bindings;
pub mod limits;
pub mod retarget;
pub mod segment;
pub mod skeleton;

pub use bindings::{HandBindings, HandRig, RestPoseMap};
pub use limits::{soft_clamp_deg, AngleRange, JointLimits, JointRanges};
pub use retarget::{rotate_towards, FingerRetargeter};
pub use segment::{Finger, FingerSegment, JointKind};
pub use skeleton::{BoneId, RigSkeleton, Skeleton};

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Local axis a finger bone points along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AimAxis {
    X,
    Y,
    Z,
}

impl AimAxis {
    pub fn vector(self) -> Vec3 {
        match self {
            Self::X => Vec3::X,
            Self::Y => Vec3::Y,
            Self::Z => Vec3::Z,
        }
    }
}

impl Default for AimAxis {
    fn default() -> Self {
        Self::Z
    }
}
