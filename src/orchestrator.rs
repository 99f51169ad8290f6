//! Per-tick retargeting driver.
//!
//! A tick has two phases that must run in order:
//! 1. [`update_targets`](RetargetingOrchestrator::update_targets) advances
//!    playback and computes the IK target/hint of each arm.
//! 2. The host runs its IK solver on those targets, then calls
//!    [`drive_fingers`](RetargetingOrchestrator::drive_fingers), which
//!    overwrites the finger bones.
//!
//! [`tick`](RetargetingOrchestrator::tick) runs both phases around a
//! caller-supplied IK callback.

use glam::{Quat, Vec3};
use serde::Serialize;

use crate::arm::{ArmSeparationAdjuster, ArmSide, ElbowHintSolver, WristOrientationSolver, WristRotationPost};
use crate::config::Config;
use crate::hand::{FingerRetargeter, HandBindings, Skeleton};
use crate::landmarks::{self, HandLandmark, HandPoints, LandmarkFrame, LandmarkId, LandmarkSequence};
use crate::playback::{PlaybackClock, PlaybackPosition};
use crate::projection::{CameraModel, CameraUnprojector};
use crate::smoothing::AdaptiveVectorFilter;

/// Target movements below this are not logged (m)
const MOTION_LOG_THRESHOLD: f32 = 1e-4;

/// World-space hand landmarks in MediaPipe order
pub type HandPositions = [Vec3; HandLandmark::COUNT];

/// IK inputs for one arm. `None` fields were not updated this tick and the
/// host should keep their previous values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ArmUpdate {
    pub target_position: Option<Vec3>,
    pub target_rotation: Option<Quat>,
    pub hint_position: Option<Vec3>,
}

/// Result of the target phase of a tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ArmTargets {
    #[serde(flatten)]
    pub position: PlaybackPosition,
    pub left: ArmUpdate,
    pub right: ArmUpdate,
}

impl ArmTargets {
    pub fn side(&self, side: ArmSide) -> &ArmUpdate {
        match side {
            ArmSide::Left => &self.left,
            ArmSide::Right => &self.right,
        }
    }

    fn side_mut(&mut self, side: ArmSide) -> &mut ArmUpdate {
        match side {
            ArmSide::Left => &mut self.left,
            ArmSide::Right => &mut self.right,
        }
    }
}

/// Per-arm solvers and filters.
#[derive(Debug, Clone)]
struct ArmChannel {
    side: ArmSide,
    drive_hand: bool,
    show_back_of_hand: bool,
    wrist: WristOrientationSolver,
    wrist_post: WristRotationPost,
    elbow: ElbowHintSolver,
    /// Present when this arm is stabilised
    position_filter: Option<AdaptiveVectorFilter>,
    hint_filter: Option<AdaptiveVectorFilter>,
    /// Last emitted target, for motion logging
    last_target: Option<Vec3>,
    /// Unprojected hand of the current tick
    hand: Option<HandPositions>,
}

impl ArmChannel {
    fn new(side: ArmSide, config: &Config) -> Self {
        let (drive_hand, show_back, roll, euler, stabilize) = match side {
            ArmSide::Left => (
                config.hands.drive_left,
                config.wrist.left_show_back_of_hand,
                config.wrist.left_roll_deg,
                config.wrist.left_euler_offset_deg,
                config.arm.stabilize_left,
            ),
            ArmSide::Right => (
                config.hands.drive_right,
                config.wrist.right_show_back_of_hand,
                config.wrist.right_roll_deg,
                config.wrist.right_euler_offset_deg,
                config.arm.stabilize_right,
            ),
        };

        let smoothing = config
            .wrist
            .smooth_rotation
            .then_some(config.wrist.rotation_slerp);

        Self {
            side,
            drive_hand,
            show_back_of_hand: show_back,
            wrist: WristOrientationSolver::new(),
            wrist_post: WristRotationPost::new(euler, roll, smoothing),
            elbow: ElbowHintSolver::new(
                config.arm.elbow_out_of_plane,
                config.arm.elbow_straight_threshold_deg,
            ),
            position_filter: stabilize
                .then(|| AdaptiveVectorFilter::from_tuning(&config.arm.position_filter)),
            hint_filter: stabilize.then(|| AdaptiveVectorFilter::from_tuning(&config.arm.hint_filter)),
            last_target: None,
            hand: None,
        }
    }

    fn reset(&mut self) {
        self.wrist.reset();
        self.wrist_post.reset();
        self.elbow.reset();
        if let Some(f) = self.position_filter.as_mut() {
            f.reset();
        }
        if let Some(f) = self.hint_filter.as_mut() {
            f.reset();
        }
        self.last_target = None;
        self.hand = None;
    }
}

/// Top-level per-frame driver.
pub struct RetargetingOrchestrator {
    config: Config,
    sequence: LandmarkSequence,
    clock: PlaybackClock,
    unprojector: CameraUnprojector,
    separation: Option<ArmSeparationAdjuster>,
    left: ArmChannel,
    right: ArmChannel,
    fingers: FingerRetargeter,
}

impl RetargetingOrchestrator {
    /// Start playing `sequence`. With locked mapping, `camera` becomes the
    /// reference projection for the whole sequence.
    pub fn new(config: Config, sequence: LandmarkSequence, camera: &CameraModel) -> Self {
        let clock = Self::make_clock(&config, &sequence);
        let mut unprojector = CameraUnprojector::new(config.projection.lock_mapping);
        if config.projection.lock_mapping {
            unprojector.lock(camera);
        }

        let separation = config
            .arm
            .separation
            .enabled
            .then(|| ArmSeparationAdjuster::from_config(&config.arm.separation));

        Self {
            left: ArmChannel::new(ArmSide::Left, &config),
            right: ArmChannel::new(ArmSide::Right, &config),
            fingers: FingerRetargeter::new(&config.hands),
            separation,
            unprojector,
            clock,
            sequence,
            config,
        }
    }

    fn make_clock(config: &Config, sequence: &LandmarkSequence) -> PlaybackClock {
        PlaybackClock::new(
            sequence.len(),
            sequence.frame_rate(config.playback.fps),
            config.playback.speed,
            config.playback.interpolate_frames,
            config.playback.looped,
        )
    }

    /// Replace the sequence and restart from its first frame.
    ///
    /// Filter and continuity state is cleared; the projection is re-locked
    /// against `camera`. Finger bindings and rest pose are kept.
    pub fn load_sequence(&mut self, sequence: LandmarkSequence, camera: &CameraModel) {
        self.clock = Self::make_clock(&self.config, &sequence);
        self.sequence = sequence;
        if self.config.projection.lock_mapping {
            self.unprojector.lock(camera);
        }
        self.left.reset();
        self.right.reset();
        self.fingers.reset();

        tracing::info!(
            "Sequence loaded: {} frames at {:.1} fps",
            self.sequence.len(),
            self.clock.frame_rate()
        );
    }

    /// Rebind finger bones and recapture their rest pose. Call whenever the
    /// host rewires the skeleton, never during a tick.
    pub fn rebuild_rest_pose<S: Skeleton>(&mut self, bindings: HandBindings, skeleton: &S) {
        self.fingers.rebuild(bindings, skeleton);
    }

    /// Phase one: advance playback and compute IK targets and hints.
    pub fn update_targets(&mut self, dt: f32, camera: &CameraModel) -> ArmTargets {
        let position = self.clock.advance(dt);
        let frame = landmarks::blend(
            self.sequence.frame(position.frame_a),
            self.sequence.frame(position.frame_b),
            position.alpha,
        );

        let wrist_depth = self.config.arm.wrist_depth;
        let elbow_depth = self.config.arm.elbow_depth;

        for channel in [&mut self.left, &mut self.right] {
            channel.hand = if channel.drive_hand {
                frame
                    .hand(channel.side)
                    .and_then(|h| unproject_hand(&self.unprojector, camera, h, wrist_depth))
            } else {
                None
            };
        }

        let mut left_base = self.wrist_target(&frame, ArmSide::Left, camera);
        let mut right_base = self.wrist_target(&frame, ArmSide::Right, camera);

        if let (Some(adjuster), Some(l), Some(r), true, true) = (
            self.separation.as_ref(),
            left_base,
            right_base,
            self.left.hand.is_some(),
            self.right.hand.is_some(),
        ) {
            let shoulders = (
                frame.pose_point(ArmSide::Left.shoulder()),
                frame.pose_point(ArmSide::Right.shoulder()),
            );
            if let (Some(ls), Some(rs)) = shoulders {
                let ls = self.unprojector.unproject(camera, ls.x, ls.y, elbow_depth);
                let rs = self.unprojector.unproject(camera, rs.x, rs.y, elbow_depth);
                let (l, r) = adjuster.apply(l, r, ls, rs);
                left_base = Some(l);
                right_base = Some(r);
            }
        }

        let mut targets = ArmTargets {
            position,
            left: ArmUpdate::default(),
            right: ArmUpdate::default(),
        };

        let log_motion = self.config.arm.log_target_motion;
        for (channel, base) in [(&mut self.left, left_base), (&mut self.right, right_base)] {
            let update = targets.side_mut(channel.side);

            if let Some(mut p) = base {
                if let Some(filter) = channel.position_filter.as_mut() {
                    p = filter.filter(p, dt);
                }
                if log_motion {
                    if let Some(last) = channel.last_target {
                        let moved = last.distance(p);
                        if moved > MOTION_LOG_THRESHOLD {
                            tracing::debug!("{} target moved {:.3} m", channel.side, moved);
                        }
                    }
                }
                channel.last_target = Some(p);
                update.target_position = Some(p);
            }

            if let Some(points) = channel.hand.as_ref() {
                let solved = channel.wrist.solve(points, channel.side.is_left(), channel.show_back_of_hand);
                update.target_rotation = Some(channel.wrist_post.apply(solved));
            }

            let side = channel.side;
            if let (Some(s), Some(e), Some(w)) = (
                frame.pose_point(side.shoulder()),
                frame.pose_point(side.elbow()),
                frame.pose_point(side.wrist()),
            ) {
                let mut hint = channel
                    .elbow
                    .solve_landmarks(&self.unprojector, camera, elbow_depth, s, e, w);
                if let Some(filter) = channel.hint_filter.as_mut() {
                    hint = filter.filter(hint, dt);
                }
                update.hint_position = Some(hint);
            }
        }

        targets
    }

    /// Wrist target position before separation and filtering.
    ///
    /// The hand's own WRIST must be observed; the pose wrist is preferred
    /// when configured and present.
    fn wrist_target(&self, frame: &LandmarkFrame, side: ArmSide, camera: &CameraModel) -> Option<Vec3> {
        let hand_wrist = frame.hand_point(side, HandLandmark::Wrist)?;
        let depth = self.config.arm.wrist_depth;

        let point = self
            .config
            .arm
            .prefer_pose_wrist
            .then(|| frame.pose_point(side.wrist()))
            .flatten()
            .unwrap_or(hand_wrist);

        Some(self.unprojector.unproject(camera, point.x, point.y, depth))
    }

    /// Phase two: drive finger bones from this tick's hands. Run after the
    /// host's IK solve.
    pub fn drive_fingers<S: Skeleton>(&mut self, skeleton: &mut S, dt: f32) {
        let left = self.left.hand.as_ref().map(|h| &h[..]);
        let right = self.right.hand.as_ref().map(|h| &h[..]);
        if left.is_none() && right.is_none() {
            return;
        }
        self.fingers.drive(skeleton, left, right, dt);
    }

    /// Run a full tick: targets, then `solve_ik`, then fingers.
    pub fn tick<S, F>(&mut self, dt: f32, camera: &CameraModel, skeleton: &mut S, solve_ik: F) -> ArmTargets
    where
        S: Skeleton,
        F: FnOnce(&ArmTargets, &mut S),
    {
        let targets = self.update_targets(dt, camera);
        solve_ik(&targets, skeleton);
        self.drive_fingers(skeleton, dt);
        targets
    }

    /// Unprojected hand of the current tick, if complete
    pub fn hand_positions(&self, side: ArmSide) -> Option<&HandPositions> {
        match side {
            ArmSide::Left => self.left.hand.as_ref(),
            ArmSide::Right => self.right.hand.as_ref(),
        }
    }

    pub fn fingers(&self) -> &FingerRetargeter {
        &self.fingers
    }

    pub fn sequence(&self) -> &LandmarkSequence {
        &self.sequence
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn unprojector(&self) -> &CameraUnprojector {
        &self.unprojector
    }

    pub fn position(&self) -> PlaybackPosition {
        self.clock.position()
    }
}

/// Unproject a complete hand; `None` if any landmark is missing.
fn unproject_hand(
    unprojector: &CameraUnprojector,
    camera: &CameraModel,
    hand: &HandPoints,
    depth: f32,
) -> Option<HandPositions> {
    let mut out = [Vec3::ZERO; HandLandmark::COUNT];
    for id in HandLandmark::ALL {
        let p = hand.get(*id)?;
        out[id.index()] = unprojector.unproject(camera, p.x, p.y, depth);
    }
    Some(out)
}
