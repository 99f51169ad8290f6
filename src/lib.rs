//! mp-retarget - MediaPipe landmark retargeting
//!
//! Drives a humanoid arm/hand rig from recorded MediaPipe landmarks:
//! - Plays back landmark sequences with frame interpolation
//! - Unprojects normalized image points through a locked camera mapping
//! - Computes wrist IK targets, wrist rotations and elbow hints per arm
//! - Retargets finger bones with smoothing, velocity and joint limits
//!
//! Rendering, IK solving and skeleton ownership stay with the host; see
//! [`RetargetingOrchestrator`] for the per-tick contract.

pub mod arm;
pub mod config;
pub mod error;
pub mod hand;
pub mod landmarks;
pub mod orchestrator;
pub mod playback;
pub mod projection;
pub mod smoothing;

pub use arm::ArmSide;
pub use config::Config;
pub use error::{ConfigError, Result, RetargetError, SequenceError};
pub use hand::{HandBindings, RigSkeleton, Skeleton};
pub use landmarks::{LandmarkFrame, LandmarkSequence};
pub use orchestrator::{ArmTargets, ArmUpdate, RetargetingOrchestrator};
pub use projection::CameraModel;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
