//! Finger segment table.
//!
//! Each segment is one bone driven by a pair of MediaPipe hand landmarks
//! (proximal → distal).

use crate::landmarks::HandLandmark;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Finger {
    Thumb,
    Index,
    Middle,
    Ring,
    Pinky,
}

impl Finger {
    pub const ALL: [Finger; 5] = [
        Self::Thumb,
        Self::Index,
        Self::Middle,
        Self::Ring,
        Self::Pinky,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Thumb => "Thumb",
            Self::Index => "Index",
            Self::Middle => "Middle",
            Self::Ring => "Ring",
            Self::Pinky => "Pinky",
        }
    }
}

/// Joint type, selects the angle limits applied to a segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JointKind {
    ThumbMcp,
    ThumbIp,
    ThumbDistal,
    Mcp,
    Pip,
    Dip,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FingerSegment {
    Thumb1,
    Thumb2,
    Thumb3,
    Index1,
    Index2,
    Index3,
    Middle1,
    Middle2,
    Middle3,
    Ring1,
    Ring2,
    Ring3,
    Pinky1,
    Pinky2,
    Pinky3,
}

impl FingerSegment {
    /// Proximal to distal, thumb first
    pub const ALL: [FingerSegment; 15] = [
        Self::Thumb1,
        Self::Thumb2,
        Self::Thumb3,
        Self::Index1,
        Self::Index2,
        Self::Index3,
        Self::Middle1,
        Self::Middle2,
        Self::Middle3,
        Self::Ring1,
        Self::Ring2,
        Self::Ring3,
        Self::Pinky1,
        Self::Pinky2,
        Self::Pinky3,
    ];

    /// Knuckle segments of the four fingers, used for cohesion
    pub const MCP: [FingerSegment; 4] = [Self::Index1, Self::Middle1, Self::Ring1, Self::Pinky1];

    pub fn finger(self) -> Finger {
        Finger::ALL[self as usize / 3]
    }

    /// 1 = proximal, 3 = distal
    pub fn ordinal(self) -> u8 {
        (self as usize % 3) as u8 + 1
    }

    /// `(from, to)` landmarks whose difference gives the segment direction.
    pub fn landmarks(self) -> (HandLandmark, HandLandmark) {
        use HandLandmark::*;
        match self {
            Self::Thumb1 => (ThumbCmc, ThumbMcp),
            Self::Thumb2 => (ThumbMcp, ThumbIp),
            Self::Thumb3 => (ThumbIp, ThumbTip),
            Self::Index1 => (IndexMcp, IndexPip),
            Self::Index2 => (IndexPip, IndexDip),
            Self::Index3 => (IndexDip, IndexTip),
            Self::Middle1 => (MiddleMcp, MiddlePip),
            Self::Middle2 => (MiddlePip, MiddleDip),
            Self::Middle3 => (MiddleDip, MiddleTip),
            Self::Ring1 => (RingMcp, RingPip),
            Self::Ring2 => (RingPip, RingDip),
            Self::Ring3 => (RingDip, RingTip),
            Self::Pinky1 => (PinkyMcp, PinkyPip),
            Self::Pinky2 => (PinkyPip, PinkyDip),
            Self::Pinky3 => (PinkyDip, PinkyTip),
        }
    }

    pub fn joint(self) -> JointKind {
        match (self.finger(), self.ordinal()) {
            (Finger::Thumb, 1) => JointKind::ThumbMcp,
            (Finger::Thumb, 2) => JointKind::ThumbIp,
            (Finger::Thumb, _) => JointKind::ThumbDistal,
            (_, 1) => JointKind::Mcp,
            (_, 2) => JointKind::Pip,
            _ => JointKind::Dip,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::LandmarkId;

    #[test]
    fn test_segments_follow_landmark_chain() {
        for seg in FingerSegment::ALL {
            let (from, to) = seg.landmarks();
            assert_eq!(to.index(), from.index() + 1, "{:?} should span adjacent landmarks", seg);
        }
    }

    #[test]
    fn test_finger_and_ordinal() {
        assert_eq!(FingerSegment::Thumb3.finger(), Finger::Thumb);
        assert_eq!(FingerSegment::Ring2.finger(), Finger::Ring);
        assert_eq!(FingerSegment::Ring2.ordinal(), 2);
        assert_eq!(FingerSegment::Pinky3.finger(), Finger::Pinky);
    }

    #[test]
    fn test_joint_kinds() {
        assert_eq!(FingerSegment::Thumb1.joint(), JointKind::ThumbMcp);
        assert_eq!(FingerSegment::Thumb2.joint(), JointKind::ThumbIp);
        assert_eq!(FingerSegment::Thumb3.joint(), JointKind::ThumbDistal);
        for seg in FingerSegment::MCP {
            assert_eq!(seg.joint(), JointKind::Mcp);
        }
        assert_eq!(FingerSegment::Middle2.joint(), JointKind::Pip);
        assert_eq!(FingerSegment::Index3.joint(), JointKind::Dip);
    }
}
