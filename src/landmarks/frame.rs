//! Landmark observations for a single frame.

use serde::{Deserialize, Serialize};
use std::marker::PhantomData;

use super::ids::{HandLandmark, LandmarkId, PoseLandmark};
use crate::arm::ArmSide;

/// One normalized observation. `x`/`y` are in [0, 1] with a top-left origin;
/// `z` is informational only.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LandmarkPoint {
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub z: f32,
    #[serde(default)]
    pub visibility: f32,
}

impl LandmarkPoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            z: 0.0,
            visibility: 1.0,
        }
    }

    /// Component-wise linear blend. `t = 0` yields `self`, `t = 1` yields
    /// `other`, and blending a point with itself yields the point exactly.
    pub fn lerp(&self, other: &LandmarkPoint, t: f32) -> LandmarkPoint {
        LandmarkPoint {
            x: lerp_exact(self.x, other.x, t),
            y: lerp_exact(self.y, other.y, t),
            z: lerp_exact(self.z, other.z, t),
            visibility: lerp_exact(self.visibility, other.visibility, t),
        }
    }
}

fn lerp_exact(a: f32, b: f32, t: f32) -> f32 {
    if a == b {
        a
    } else {
        a * (1.0 - t) + b * t
    }
}

/// Dense per-id storage. Absent entries mean "not observed this frame".
#[derive(Debug, Clone, PartialEq)]
pub struct LandmarkSet<I: LandmarkId> {
    points: Vec<Option<LandmarkPoint>>,
    _id: PhantomData<I>,
}

pub type HandPoints = LandmarkSet<HandLandmark>;
pub type PosePoints = LandmarkSet<PoseLandmark>;

impl<I: LandmarkId> Default for LandmarkSet<I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: LandmarkId> LandmarkSet<I> {
    pub fn new() -> Self {
        Self {
            points: vec![None; I::COUNT],
            _id: PhantomData,
        }
    }

    pub fn get(&self, id: I) -> Option<&LandmarkPoint> {
        self.points[id.index()].as_ref()
    }

    pub fn set(&mut self, id: I, point: LandmarkPoint) {
        self.points[id.index()] = Some(point);
    }

    /// Store `point` unless `id` is already observed. Returns whether it was stored.
    pub fn insert_first(&mut self, id: I, point: LandmarkPoint) -> bool {
        let slot = &mut self.points[id.index()];
        if slot.is_some() {
            return false;
        }
        *slot = Some(point);
        true
    }

    pub fn remove(&mut self, id: I) -> Option<LandmarkPoint> {
        self.points[id.index()].take()
    }

    pub fn with(mut self, id: I, point: LandmarkPoint) -> Self {
        self.set(id, point);
        self
    }

    /// Number of observed landmarks
    pub fn len(&self) -> usize {
        self.points.iter().filter(|p| p.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.points.iter().all(Option::is_none)
    }

    /// Every landmark of the set is observed
    pub fn is_complete(&self) -> bool {
        self.points.iter().all(Option::is_some)
    }

    /// Observed landmarks in id order
    pub fn iter(&self) -> impl Iterator<Item = (I, &LandmarkPoint)> + '_ {
        I::ALL
            .iter()
            .zip(self.points.iter())
            .filter_map(|(id, p)| p.as_ref().map(|p| (*id, p)))
    }
}

/// Observations for one frame. Any sub-set may be absent or partial.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LandmarkFrame {
    pub left_hand: Option<HandPoints>,
    pub right_hand: Option<HandPoints>,
    pub pose: Option<PosePoints>,
}

impl LandmarkFrame {
    pub fn hand(&self, side: ArmSide) -> Option<&HandPoints> {
        match side {
            ArmSide::Left => self.left_hand.as_ref(),
            ArmSide::Right => self.right_hand.as_ref(),
        }
    }

    pub fn pose_point(&self, id: PoseLandmark) -> Option<&LandmarkPoint> {
        self.pose.as_ref().and_then(|p| p.get(id))
    }

    pub fn hand_point(&self, side: ArmSide, id: HandLandmark) -> Option<&LandmarkPoint> {
        self.hand(side).and_then(|h| h.get(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lerp_endpoints_are_exact() {
        let a = LandmarkPoint {
            x: 0.1,
            y: 0.7,
            z: -0.03,
            visibility: 0.9,
        };
        let b = LandmarkPoint {
            x: 0.35,
            y: 0.2,
            z: 0.01,
            visibility: 0.4,
        };
        assert_eq!(a.lerp(&b, 0.0), a);
        assert_eq!(a.lerp(&b, 1.0), b);
        assert_eq!(a.lerp(&a, 0.37), a);
    }

    #[test]
    fn test_insert_first_keeps_first() {
        let mut set = HandPoints::new();
        assert!(set.insert_first(HandLandmark::Wrist, LandmarkPoint::new(0.1, 0.1)));
        assert!(!set.insert_first(HandLandmark::Wrist, LandmarkPoint::new(0.9, 0.9)));
        assert_eq!(set.get(HandLandmark::Wrist).unwrap().x, 0.1);
    }

    #[test]
    fn test_completeness() {
        let mut set = HandPoints::new();
        assert!(set.is_empty());
        for id in HandLandmark::ALL {
            set.set(*id, LandmarkPoint::new(0.5, 0.5));
        }
        assert!(set.is_complete());
        assert_eq!(set.len(), 21);
        set.remove(HandLandmark::ThumbTip);
        assert!(!set.is_complete());
        assert_eq!(set.iter().count(), 20);
    }

    #[test]
    fn test_frame_accessors() {
        let frame = LandmarkFrame {
            left_hand: None,
            right_hand: Some(HandPoints::new().with(HandLandmark::Wrist, LandmarkPoint::new(0.6, 0.4))),
            pose: Some(PosePoints::new().with(PoseLandmark::LeftShoulder, LandmarkPoint::new(0.6, 0.3))),
        };
        assert!(frame.hand(ArmSide::Left).is_none());
        assert!(frame.hand_point(ArmSide::Right, HandLandmark::Wrist).is_some());
        assert!(frame.pose_point(PoseLandmark::LeftShoulder).is_some());
        assert!(frame.pose_point(PoseLandmark::RightShoulder).is_none());
    }
}
