//! Landmark identifiers, frames and sequences.

pub mod frame;
pub mod ids;
pub mod interpolate;
pub mod sequence;

pub use frame::{HandPoints, LandmarkFrame, LandmarkPoint, LandmarkSet, PosePoints};
pub use ids::{HandLandmark, LandmarkId, PoseLandmark};
pub use interpolate::blend;
pub use sequence::{LandmarkSequence, SequenceInfo};
