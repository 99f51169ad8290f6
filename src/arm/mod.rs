//! Arm IK target and hint computation.
//!
//! Produces the inputs of an external two-bone IK solver: a wrist target
//! (position + rotation) and an elbow pole hint per arm.

pub mod elbow;
pub mod separation;
pub mod wrist;

pub use elbow::ElbowHintSolver;
pub use separation::ArmSeparationAdjuster;
pub use wrist::{look_rotation, WristOrientationSolver, WristRotationPost};

use serde::{Deserialize, Serialize};

use crate::landmarks::PoseLandmark;

/// Which arm / hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArmSide {
    Left,
    Right,
}

impl ArmSide {
    pub const ALL: [ArmSide; 2] = [Self::Left, Self::Right];

    pub fn is_left(self) -> bool {
        matches!(self, Self::Left)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
        }
    }

    pub fn shoulder(self) -> PoseLandmark {
        match self {
            Self::Left => PoseLandmark::LeftShoulder,
            Self::Right => PoseLandmark::RightShoulder,
        }
    }

    pub fn elbow(self) -> PoseLandmark {
        match self {
            Self::Left => PoseLandmark::LeftElbow,
            Self::Right => PoseLandmark::RightElbow,
        }
    }

    pub fn wrist(self) -> PoseLandmark {
        match self {
            Self::Left => PoseLandmark::LeftWrist,
            Self::Right => PoseLandmark::RightWrist,
        }
    }
}

impl std::fmt::Display for ArmSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
