//! Bone bindings and the rest-pose cache.

use glam::Quat;
use std::collections::HashMap;

use super::segment::{Finger, FingerSegment};
use super::skeleton::{BoneId, Skeleton};
use crate::arm::ArmSide;

/// Finger-segment → bone mapping for one hand. Unbound segments are skipped.
#[derive(Debug, Clone)]
pub struct HandRig {
    pub side: ArmSide,
    pub segments: HashMap<FingerSegment, BoneId>,
}

impl HandRig {
    pub fn new(side: ArmSide) -> Self {
        Self {
            side,
            segments: HashMap::new(),
        }
    }

    pub fn bind(&mut self, segment: FingerSegment, bone: BoneId) {
        self.segments.insert(segment, bone);
    }

    pub fn bone(&self, segment: FingerSegment) -> Option<BoneId> {
        self.segments.get(&segment).copied()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

/// Bindings for both hands.
#[derive(Debug, Clone)]
pub struct HandBindings {
    pub left: HandRig,
    pub right: HandRig,
}

impl Default for HandBindings {
    fn default() -> Self {
        Self {
            left: HandRig::new(ArmSide::Left),
            right: HandRig::new(ArmSide::Right),
        }
    }
}

impl HandBindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rig(&self, side: ArmSide) -> &HandRig {
        match side {
            ArmSide::Left => &self.left,
            ArmSide::Right => &self.right,
        }
    }

    pub fn rig_mut(&mut self, side: ArmSide) -> &mut HandRig {
        match side {
            ArmSide::Left => &mut self.left,
            ArmSide::Right => &mut self.right,
        }
    }

    /// Bind finger segments by bone name.
    ///
    /// A bone matches when its name ends with one of the segment's candidate
    /// names, ignoring case (Mixamo `LeftHandIndex1`, `Index1_L`, VRM
    /// `leftIndexProximal`, `LeftHandLittle1`). Candidates are tried in
    /// order and the first matching bone wins, so `LeftHandIndex1_end` never
    /// stands in for `LeftHandIndex1`.
    ///
    /// VRM thumbs are named two ways: 1.0 rigs have
    /// `ThumbMetacarpal/Proximal/Distal`, 0.x rigs
    /// `ThumbProximal/Intermediate/Distal`. A side with a `ThumbMetacarpal`
    /// bone is read as 1.0.
    ///
    /// Call `rebuild` on the retargeter afterwards.
    pub fn auto_bind<'a, I>(bones: I) -> Self
    where
        I: IntoIterator<Item = (BoneId, &'a str)>,
    {
        let bones: Vec<(BoneId, String)> = bones
            .into_iter()
            .map(|(id, name)| (id, name.to_lowercase()))
            .collect();

        let mut bindings = Self::new();
        for side in ArmSide::ALL {
            let metacarpal = format!("{}thumbmetacarpal", side.as_str());
            let thumb_metacarpal = bones.iter().any(|(_, name)| name.ends_with(&metacarpal));

            for seg in FingerSegment::ALL {
                let found = candidate_names(side, seg, thumb_metacarpal)
                    .iter()
                    .find_map(|candidate| {
                        let candidate = candidate.to_lowercase();
                        bones
                            .iter()
                            .find(|(_, name)| name.ends_with(&candidate))
                            .map(|(id, _)| *id)
                    });

                match found {
                    Some(bone) => bindings.rig_mut(side).bind(seg, bone),
                    None => tracing::debug!("No bone found for {} {:?}", side, seg),
                }
            }
        }

        tracing::info!(
            "Auto-bound finger bones: left={}/15 right={}/15",
            bindings.left.len(),
            bindings.right.len()
        );

        bindings
    }
}

/// Name patterns for one segment, most specific first.
fn candidate_names(side: ArmSide, segment: FingerSegment, thumb_metacarpal: bool) -> Vec<String> {
    let (long, short, lower) = match side {
        ArmSide::Left => ("Left", "L", "left"),
        ArmSide::Right => ("Right", "R", "right"),
    };
    let finger = segment.finger().as_str();
    let n = segment.ordinal();

    let vrm_joint = match (segment.finger(), n) {
        (Finger::Thumb, 1) if thumb_metacarpal => "Metacarpal",
        (Finger::Thumb, 2) if thumb_metacarpal => "Proximal",
        (_, 1) => "Proximal",
        (_, 2) => "Intermediate",
        _ => "Distal",
    };
    let vrm_finger = match segment.finger() {
        Finger::Pinky => "Little",
        _ => finger,
    };

    let mut names = vec![
        format!("{long}Hand{finger}{n}"),
        format!("{finger}{n}_{short}"),
        format!("{lower}{vrm_finger}{vrm_joint}"),
    ];
    if segment.finger() == Finger::Pinky {
        names.push(format!("{long}HandLittle{n}"));
    }
    names
}

/// Cached bind-time local rotation of every driven bone, per side.
///
/// Holds exactly one entry per bound bone that exists in the skeleton and
/// has a parent.
#[derive(Debug, Clone, Default)]
pub struct RestPoseMap {
    left: HashMap<FingerSegment, Quat>,
    right: HashMap<FingerSegment, Quat>,
}

impl RestPoseMap {
    /// Snapshot the current local rotations of all bound bones.
    pub fn capture<S: Skeleton>(bindings: &HandBindings, skeleton: &S) -> Self {
        let mut map = Self::default();
        for side in ArmSide::ALL {
            for (&seg, &bone) in &bindings.rig(side).segments {
                if skeleton.parent_world_rotation(bone).is_none() {
                    continue;
                }
                if let Some(rotation) = skeleton.local_rotation(bone) {
                    map.side_mut(side).insert(seg, rotation);
                }
            }
        }
        map
    }

    pub fn get(&self, side: ArmSide, segment: FingerSegment) -> Option<Quat> {
        self.side(side).get(&segment).copied()
    }

    /// Number of cached bones for `side`
    pub fn count(&self, side: ArmSide) -> usize {
        self.side(side).len()
    }

    fn side(&self, side: ArmSide) -> &HashMap<FingerSegment, Quat> {
        match side {
            ArmSide::Left => &self.left,
            ArmSide::Right => &self.right,
        }
    }

    fn side_mut(&mut self, side: ArmSide) -> &mut HashMap<FingerSegment, Quat> {
        match side {
            ArmSide::Left => &mut self.left,
            ArmSide::Right => &mut self.right,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hand::RigSkeleton;

    #[test]
    fn test_auto_bind_reference_rig() {
        let rig = RigSkeleton::reference_hands();
        let bindings = HandBindings::auto_bind(rig.bones());
        assert_eq!(bindings.left.len(), 15);
        assert_eq!(bindings.right.len(), 15);
        assert_eq!(
            bindings.left.bone(FingerSegment::Index1),
            rig.find("mixamorig:LeftHandIndex1")
        );
        assert_eq!(
            bindings.right.bone(FingerSegment::Pinky3),
            rig.find("mixamorig:RightHandPinky3")
        );
    }

    #[test]
    fn test_auto_bind_name_styles() {
        let names = [
            (0, "Armature"),
            (1, "thumb1_l"),
            (2, "LeftHandLittle2"),
            (3, "J_Bip_rightIndexIntermediate"),
            (4, "leftThumbMetacarpal"),
        ];
        let bindings = HandBindings::auto_bind(names.iter().map(|(i, n)| (*i, *n)));
        assert_eq!(bindings.left.bone(FingerSegment::Thumb1), Some(1));
        assert_eq!(bindings.left.bone(FingerSegment::Pinky2), Some(2));
        assert_eq!(bindings.right.bone(FingerSegment::Index2), Some(3));
        assert_eq!(bindings.left.len(), 2);
        assert_eq!(bindings.right.len(), 1);
    }

    #[test]
    fn test_auto_bind_vrm0_thumb() {
        let names = [
            (0, "J_Bip_leftThumbProximal"),
            (1, "J_Bip_leftThumbIntermediate"),
            (2, "J_Bip_leftThumbDistal"),
        ];
        let bindings = HandBindings::auto_bind(names.iter().map(|(i, n)| (*i, *n)));
        assert_eq!(bindings.left.bone(FingerSegment::Thumb1), Some(0));
        assert_eq!(bindings.left.bone(FingerSegment::Thumb2), Some(1));
        assert_eq!(bindings.left.bone(FingerSegment::Thumb3), Some(2));
    }

    #[test]
    fn test_auto_bind_vrm1_thumb() {
        let names = [
            (0, "leftThumbMetacarpal"),
            (1, "leftThumbProximal"),
            (2, "leftThumbDistal"),
            (3, "rightThumbProximal"),
            (4, "rightThumbIntermediate"),
        ];
        let bindings = HandBindings::auto_bind(names.iter().map(|(i, n)| (*i, *n)));
        assert_eq!(bindings.left.bone(FingerSegment::Thumb1), Some(0));
        assert_eq!(bindings.left.bone(FingerSegment::Thumb2), Some(1));
        assert_eq!(bindings.left.bone(FingerSegment::Thumb3), Some(2));
        // The right side has no metacarpal, so it reads as 0.x
        assert_eq!(bindings.right.bone(FingerSegment::Thumb1), Some(3));
        assert_eq!(bindings.right.bone(FingerSegment::Thumb2), Some(4));
    }

    #[test]
    fn test_auto_bind_matches_name_suffix() {
        let names = [
            (0, "mixamorig:LeftHandIndex1_end"),
            (1, "mixamorig:LeftHandIndex1"),
        ];
        let bindings = HandBindings::auto_bind(names.iter().map(|(i, n)| (*i, *n)));
        assert_eq!(bindings.left.bone(FingerSegment::Index1), Some(1));
    }

    #[test]
    fn test_rest_map_skips_missing_and_root_bones() {
        let mut rig = RigSkeleton::new();
        let root = rig.add_bone("root", None, Quat::IDENTITY);
        let index1 = rig.add_bone("index1", Some(root), Quat::from_rotation_x(0.3));

        let mut bindings = HandBindings::new();
        bindings.left.bind(FingerSegment::Index1, index1);
        bindings.left.bind(FingerSegment::Thumb1, root);
        bindings.right.bind(FingerSegment::Index1, 99);

        let rest = RestPoseMap::capture(&bindings, &rig);
        assert_eq!(rest.count(ArmSide::Left), 1);
        assert_eq!(rest.count(ArmSide::Right), 0);
        assert_eq!(
            rest.get(ArmSide::Left, FingerSegment::Index1),
            Some(Quat::from_rotation_x(0.3))
        );
    }
}
