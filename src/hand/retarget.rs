//! Direction-to-rotation finger retargeting.

use glam::{Quat, Vec3};
use std::collections::HashMap;

use super::bindings::{HandBindings, RestPoseMap};
use super::limits::{apply_cohesion, JointAngles, JointLimits};
use super::segment::FingerSegment;
use super::skeleton::Skeleton;
use crate::arm::ArmSide;
use crate::config::{FilterTuning, HandsConfig};
use crate::landmarks::{HandLandmark, LandmarkId};
use crate::smoothing::{direction_deadzone, slerp_direction, AdaptiveVectorFilter, SmoothingMode};

/// Frame time assumed when the host passes a non-positive `dt`
const FALLBACK_DT: f32 = 1.0 / 60.0;

/// Lowest accepted angular speed limit (deg/s)
const MIN_DEGREES_PER_SECOND: f32 = 1.0;

/// Rotate `current` toward `target` by at most `max_radians`, never past it.
pub fn rotate_towards(current: Quat, target: Quat, max_radians: f32) -> Quat {
    let angle = current.angle_between(target);
    if angle <= max_radians || angle <= f32::EPSILON {
        return target;
    }
    current.slerp(target, max_radians / angle)
}

/// Smoothing state of one finger bone.
#[derive(Debug, Clone)]
struct BoneState {
    filter: AdaptiveVectorFilter,
    /// Last accepted parent-local direction; starts on the aim axis
    last_direction: Vec3,
    /// Set once a valid direction has been observed
    driven: bool,
}

impl BoneState {
    fn new(tuning: &FilterTuning, aim: Vec3) -> Self {
        Self {
            filter: AdaptiveVectorFilter::from_tuning(tuning),
            last_direction: aim,
            driven: false,
        }
    }
}

/// Drives finger-segment bones of both hands from 21-point hand arrays.
pub struct FingerRetargeter {
    config: HandsConfig,
    limits: JointLimits,
    bindings: HandBindings,
    rest: RestPoseMap,
    states: HashMap<(ArmSide, FingerSegment), BoneState>,
}

impl FingerRetargeter {
    /// An unbound retargeter; call [`rebuild`](Self::rebuild) before driving.
    pub fn new(config: &HandsConfig) -> Self {
        Self {
            config: config.clone(),
            limits: JointLimits::from_config(&config.limits),
            bindings: HandBindings::new(),
            rest: RestPoseMap::default(),
            states: HashMap::new(),
        }
    }

    /// Replace the bone bindings and recapture the rest pose from the
    /// skeleton's current local rotations. Clears all smoothing state.
    ///
    /// Must not overlap a `drive` call.
    pub fn rebuild<S: Skeleton>(&mut self, bindings: HandBindings, skeleton: &S) {
        self.rest = RestPoseMap::capture(&bindings, skeleton);
        self.bindings = bindings;
        self.states.clear();

        tracing::info!(
            "Rebuilt finger rest pose: left={} right={}",
            self.rest.count(ArmSide::Left),
            self.rest.count(ArmSide::Right)
        );
    }

    /// Drive both hands for one tick. A hand whose array is missing or
    /// shorter than 21 points is left untouched.
    pub fn drive<S: Skeleton>(
        &mut self,
        skeleton: &mut S,
        left: Option<&[Vec3]>,
        right: Option<&[Vec3]>,
        dt: f32,
    ) {
        let dt = if dt > 0.0 { dt } else { FALLBACK_DT };

        for (side, points) in [(ArmSide::Left, left), (ArmSide::Right, right)] {
            match points {
                Some(points) if points.len() >= HandLandmark::COUNT => {
                    self.drive_hand(skeleton, side, points, dt);
                }
                _ => {}
            }
        }
    }

    fn drive_hand<S: Skeleton>(&mut self, skeleton: &mut S, side: ArmSide, points: &[Vec3], dt: f32) {
        let aim = self.config.aim_axis.vector();
        let max_step = (self.config.max_degrees_per_second.max(MIN_DEGREES_PER_SECOND) * dt).to_radians();

        // Proximal segments first so children see this tick's parent rotation
        for seg in FingerSegment::ALL {
            let Some(bone) = self.bindings.rig(side).bone(seg) else {
                continue;
            };
            let Some(rest) = self.rest.get(side, seg) else {
                continue;
            };
            let (Some(parent), Some(current)) =
                (skeleton.parent_world_rotation(bone), skeleton.local_rotation(bone))
            else {
                continue;
            };

            let (from, to) = seg.landmarks();
            let world_dir = points[to.index()] - points[from.index()];
            let Some(parent_dir) = (parent.inverse() * world_dir).try_normalize() else {
                tracing::trace!("Zero-length {} {:?} segment", side, seg);
                continue;
            };

            let state = self
                .states
                .entry((side, seg))
                .or_insert_with(|| BoneState::new(&self.config.filter, aim));

            let smoothed = match self.config.smoothing_mode {
                SmoothingMode::OneEuro => state.filter.filter(parent_dir, dt),
                SmoothingMode::Slerp => slerp_direction(
                    state.last_direction,
                    parent_dir,
                    1.0 - self.config.simple_smoothing,
                ),
            };
            let smoothed = smoothed.try_normalize().unwrap_or(state.last_direction);
            let accepted = direction_deadzone(state.last_direction, smoothed, self.config.deadzone_deg);
            state.last_direction = accepted;
            state.driven = true;

            let mut target = Quat::from_rotation_arc(aim, accepted) * rest;
            if self.config.enable_angle_limits {
                target = self.limit_target(seg, target, rest);
            }
            skeleton.set_local_rotation(bone, rotate_towards(current, target, max_step));
        }

        if self.config.enable_cohesion {
            self.apply_cohesion(skeleton, side);
        }
        if self.config.enable_angle_limits {
            self.apply_limits(skeleton, side, dt);
        }
    }

    /// Runs only when all four knuckle bones are bound.
    fn apply_cohesion<S: Skeleton>(&self, skeleton: &mut S, side: ArmSide) {
        let mut bones = Vec::with_capacity(FingerSegment::MCP.len());
        for seg in FingerSegment::MCP {
            let bone = self.bindings.rig(side).bone(seg);
            let rest = self.rest.get(side, seg);
            let local = bone.and_then(|b| skeleton.local_rotation(b));
            match (bone, rest, local) {
                (Some(bone), Some(rest), Some(local)) => bones.push((bone, rest, local)),
                _ => return,
            }
        }

        let before: Vec<JointAngles> = bones
            .iter()
            .map(|(_, rest, local)| JointAngles::measure(*local, *rest))
            .collect();
        let mut after = before.clone();
        apply_cohesion(&mut after, self.limits.mcp_abduction(), self.config.cohesion);

        for ((bone, rest, _), (old, new)) in bones.iter().zip(before.iter().zip(&after)) {
            if new.differs_from(old) {
                skeleton.set_local_rotation(*bone, new.to_local(*rest));
            }
        }
    }

    /// Pull the aim target inside the joint range, so the velocity step
    /// never carries the bone past a bound.
    fn limit_target(&self, seg: FingerSegment, target: Quat, rest: Quat) -> Quat {
        let angles = JointAngles::measure(target, rest);
        let clamped = angles.clamped(&self.limits.ranges(seg.joint()));
        if clamped.differs_from(&angles) {
            clamped.to_local(rest)
        } else {
            target
        }
    }

    /// Soft-clamp the pose itself; catches whatever cohesion or an
    /// out-of-range starting pose left outside the bounds.
    fn apply_limits<S: Skeleton>(&self, skeleton: &mut S, side: ArmSide, dt: f32) {
        for seg in FingerSegment::ALL {
            let (Some(bone), Some(rest)) = (self.bindings.rig(side).bone(seg), self.rest.get(side, seg)) else {
                continue;
            };
            let Some(local) = skeleton.local_rotation(bone) else {
                continue;
            };

            let angles = JointAngles::measure(local, rest);
            let ranges = self.limits.ranges(seg.joint());
            let clamped = angles.soft_clamped(&ranges, self.config.clamp_softness, dt);
            if clamped.differs_from(&angles) {
                skeleton.set_local_rotation(bone, clamped.to_local(rest));
            }
        }
    }

    /// Whether `segment` of `side` has left its rest state
    pub fn is_driven(&self, side: ArmSide, segment: FingerSegment) -> bool {
        self.states.get(&(side, segment)).is_some_and(|s| s.driven)
    }

    pub fn bindings(&self) -> &HandBindings {
        &self.bindings
    }

    pub fn rest_pose(&self) -> &RestPoseMap {
        &self.rest
    }

    /// Forget smoothing history; bindings and rest pose are kept.
    pub fn reset(&mut self) {
        self.states.clear();
    }
}
