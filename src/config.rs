//! Configuration parsing and management for mp-retarget

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, RetargetError};
use crate::hand::AimAxis;
use crate::smoothing::SmoothingMode;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub playback: PlaybackConfig,
    pub projection: ProjectionConfig,
    pub arm: ArmConfig,
    pub wrist: WristConfig,
    pub hands: HandsConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, RetargetError> {
        let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            ConfigError::ReadFile(format!("{}: {}", path.as_ref().display(), e))
        })?;

        Self::from_str(&contents)
    }

    /// Parse configuration from a TOML string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Result<Self, RetargetError> {
        toml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()).into())
    }

    /// Load configuration from default paths
    pub fn load() -> Result<Self, RetargetError> {
        let paths = [
            PathBuf::from("retarget.toml"),
            PathBuf::from("config/retarget.toml"),
        ];

        for path in &paths {
            if path.exists() {
                tracing::info!("Loading config from: {}", path.display());
                return Self::from_file(path);
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), RetargetError> {
        if self.playback.fps <= 0.0 {
            return Err(invalid("playback.fps", "Frame rate must be greater than 0"));
        }
        if self.playback.speed < 0.0 {
            return Err(invalid("playback.speed", "Speed must not be negative"));
        }

        for (field, depth) in [
            ("arm.wrist_depth", self.arm.wrist_depth),
            ("arm.elbow_depth", self.arm.elbow_depth),
        ] {
            if depth <= 0.0 {
                return Err(invalid(field, "Depth must be greater than 0"));
            }
        }
        if self.arm.elbow_out_of_plane < 0.0 {
            return Err(invalid("arm.elbow_out_of_plane", "Offset must not be negative"));
        }
        if self.arm.separation.offset < 0.0 || self.arm.separation.desired_gap < 0.0 {
            return Err(invalid("arm.separation", "Offsets must not be negative"));
        }

        for (field, filter) in [
            ("arm.position_filter", &self.arm.position_filter),
            ("arm.hint_filter", &self.arm.hint_filter),
            ("hands.filter", &self.hands.filter),
        ] {
            if filter.min_cutoff <= 0.0 || filter.d_cutoff <= 0.0 {
                return Err(invalid(field, "Cutoff frequencies must be greater than 0"));
            }
            if filter.beta < 0.0 {
                return Err(invalid(field, "Beta must not be negative"));
            }
        }

        for (field, value) in [
            ("wrist.rotation_slerp", self.wrist.rotation_slerp),
            ("hands.simple_smoothing", self.hands.simple_smoothing),
            ("hands.clamp_softness", self.hands.clamp_softness),
            ("hands.cohesion", self.hands.cohesion),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(invalid(field, "Value must be between 0.0 and 1.0"));
            }
        }

        if self.hands.max_degrees_per_second <= 0.0 {
            return Err(invalid(
                "hands.max_degrees_per_second",
                "Angular speed limit must be greater than 0",
            ));
        }

        for (name, range) in self.hands.limits.named_ranges() {
            if range[0] > range[1] {
                return Err(invalid(
                    &format!("hands.limits.{name}"),
                    "Minimum must not exceed maximum",
                ));
            }
        }

        Ok(())
    }
}

fn invalid(field: &str, message: &str) -> RetargetError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        message: message.to_string(),
    }
    .into()
}

/// Sequence playback configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Sample rate used when the sequence does not declare one
    pub fps: f32,
    /// Playback speed multiplier (1.0 = real time)
    pub speed: f32,
    /// Blend between neighbouring frames
    pub interpolate_frames: bool,
    /// Wrap to the first frame at the end instead of holding the last one
    pub looped: bool,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            fps: 30.0,
            speed: 1.0,
            interpolate_frames: true,
            looped: true,
        }
    }
}

/// Camera mapping configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectionConfig {
    /// Snapshot the camera once at sequence start and ignore later changes
    pub lock_mapping: bool,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self { lock_mapping: true }
    }
}

/// Adaptive filter parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterTuning {
    /// Baseline cutoff (Hz), lower = smoother but laggier
    pub min_cutoff: f32,
    /// Velocity sensitivity
    pub beta: f32,
    /// Cutoff for the derivative estimate (Hz)
    pub d_cutoff: f32,
}

impl FilterTuning {
    pub const fn new(min_cutoff: f32, beta: f32) -> Self {
        Self {
            min_cutoff,
            beta,
            d_cutoff: 1.0,
        }
    }
}

impl Default for FilterTuning {
    fn default() -> Self {
        Self::new(1.0, 0.0)
    }
}

/// Arm target / hint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArmConfig {
    /// Assumed camera distance of the wrist (m)
    pub wrist_depth: f32,
    /// Assumed camera distance of shoulder/elbow (m)
    pub elbow_depth: f32,
    /// Pole offset from the elbow along the bend-plane normal (m)
    pub elbow_out_of_plane: f32,
    /// Below this bend angle the arm counts as straight (degrees)
    pub elbow_straight_threshold_deg: f32,
    /// Use pose LEFT_WRIST/RIGHT_WRIST for the target when the hand is tracked
    pub prefer_pose_wrist: bool,
    /// Filter left target/hint
    pub stabilize_left: bool,
    /// Filter right target/hint
    pub stabilize_right: bool,
    pub position_filter: FilterTuning,
    pub hint_filter: FilterTuning,
    pub separation: SeparationConfig,
    /// Log target displacement every tick
    pub log_target_motion: bool,
}

impl Default for ArmConfig {
    fn default() -> Self {
        Self {
            wrist_depth: 1.8,
            elbow_depth: 1.8,
            elbow_out_of_plane: 0.07,
            elbow_straight_threshold_deg: 8.0,
            prefer_pose_wrist: true,
            stabilize_left: false,
            stabilize_right: true,
            position_filter: FilterTuning::new(1.5, 0.03),
            hint_filter: FilterTuning::new(1.5, 0.03),
            separation: SeparationConfig::default(),
            log_target_motion: false,
        }
    }
}

/// Shoulder-axis wrist separation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SeparationConfig {
    pub enabled: bool,
    /// Outward push per wrist (m)
    pub offset: f32,
    /// Correct the wrist gap toward `desired_gap`
    pub use_desired_gap: bool,
    pub desired_gap: f32,
}

impl Default for SeparationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            offset: 0.05,
            use_desired_gap: false,
            desired_gap: 0.40,
        }
    }
}

/// Wrist target rotation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WristConfig {
    pub left_show_back_of_hand: bool,
    pub right_show_back_of_hand: bool,
    /// Extra roll about the solved forward axis (degrees)
    pub left_roll_deg: f32,
    pub right_roll_deg: f32,
    /// Euler offset (x, y, z degrees) applied in the solved frame
    pub left_euler_offset_deg: [f32; 3],
    pub right_euler_offset_deg: [f32; 3],
    /// Slerp toward the previous emitted rotation
    pub smooth_rotation: bool,
    pub rotation_slerp: f32,
}

impl Default for WristConfig {
    fn default() -> Self {
        Self {
            left_show_back_of_hand: true,
            right_show_back_of_hand: true,
            left_roll_deg: 180.0,
            right_roll_deg: 180.0,
            left_euler_offset_deg: [0.0; 3],
            right_euler_offset_deg: [0.0; 3],
            smooth_rotation: true,
            rotation_slerp: 0.2,
        }
    }
}

/// Finger retargeting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HandsConfig {
    pub drive_left: bool,
    pub drive_right: bool,
    /// Local axis each finger bone points along
    pub aim_axis: AimAxis,
    pub smoothing_mode: SmoothingMode,
    /// Slerp smoothing used in `slerp` mode (higher = smoother)
    pub simple_smoothing: f32,
    pub filter: FilterTuning,
    /// Angular speed limit per bone (deg/s)
    pub max_degrees_per_second: f32,
    /// Direction changes below this are ignored (degrees)
    pub deadzone_deg: f32,
    pub enable_angle_limits: bool,
    /// 0 = snap to the limit, 1 = approach very slowly
    pub clamp_softness: f32,
    pub enable_cohesion: bool,
    /// 0 = independent MCP spread, 1 = shared average
    pub cohesion: f32,
    pub limits: JointLimitConfig,
}

impl Default for HandsConfig {
    fn default() -> Self {
        Self {
            drive_left: true,
            drive_right: true,
            aim_axis: AimAxis::Z,
            smoothing_mode: SmoothingMode::OneEuro,
            simple_smoothing: 0.15,
            filter: FilterTuning::new(1.0, 0.30),
            max_degrees_per_second: 360.0,
            deadzone_deg: 1.0,
            enable_angle_limits: true,
            clamp_softness: 0.35,
            enable_cohesion: true,
            cohesion: 0.45,
            limits: JointLimitConfig::default(),
        }
    }
}

/// Joint ranges in degrees, `[min, max]`.
/// Flexion is local X, abduction local Y, twist local Z.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JointLimitConfig {
    pub mcp_flex: [f32; 2],
    pub pip_flex: [f32; 2],
    pub dip_flex: [f32; 2],
    pub mcp_abduction: [f32; 2],
    pub twist: [f32; 2],
    pub thumb_mcp: [f32; 2],
    pub thumb_ip: [f32; 2],
    pub thumb_twist: [f32; 2],
    pub thumb_abduction: [f32; 2],
}

impl JointLimitConfig {
    fn named_ranges(&self) -> [(&'static str, [f32; 2]); 9] {
        [
            ("mcp_flex", self.mcp_flex),
            ("pip_flex", self.pip_flex),
            ("dip_flex", self.dip_flex),
            ("mcp_abduction", self.mcp_abduction),
            ("twist", self.twist),
            ("thumb_mcp", self.thumb_mcp),
            ("thumb_ip", self.thumb_ip),
            ("thumb_twist", self.thumb_twist),
            ("thumb_abduction", self.thumb_abduction),
        ]
    }
}

impl Default for JointLimitConfig {
    fn default() -> Self {
        Self {
            mcp_flex: [-10.0, 90.0],
            pip_flex: [0.0, 110.0],
            dip_flex: [0.0, 80.0],
            mcp_abduction: [-20.0, 20.0],
            twist: [-25.0, 25.0],
            thumb_mcp: [0.0, 55.0],
            thumb_ip: [0.0, 80.0],
            thumb_twist: [-20.0, 20.0],
            thumb_abduction: [-25.0, 25.0],
        }
    }
}
