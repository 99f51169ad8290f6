//! Skeleton access used by the finger retargeter.
//!
//! The host owns its skeleton; [`Skeleton`] is the minimal view the
//! retargeter needs. [`RigSkeleton`] is an in-memory implementation used by
//! the replay CLI and tests.

use glam::Quat;

use super::segment::{Finger, FingerSegment};
use crate::arm::ArmSide;

/// Index of a bone within its skeleton
pub type BoneId = usize;

pub trait Skeleton {
    /// Current local rotation, `None` for unknown bones
    fn local_rotation(&self, bone: BoneId) -> Option<Quat>;

    /// Ignored for unknown bones
    fn set_local_rotation(&mut self, bone: BoneId, rotation: Quat);

    /// World rotation of the bone's parent, `None` for roots and unknown
    /// bones. Must reflect local rotations set earlier in the same tick.
    fn parent_world_rotation(&self, bone: BoneId) -> Option<Quat>;
}

/// Rotation-only bone hierarchy.
///
/// Bones are stored parent-before-child, so forward kinematics is a single
/// walk up the parent chain.
#[derive(Debug, Clone, Default)]
pub struct RigSkeleton {
    names: Vec<String>,
    parents: Vec<Option<BoneId>>,
    rest_rotations: Vec<Quat>,
    local_rotations: Vec<Quat>,
}

impl RigSkeleton {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a bone. A `parent` that does not exist yet makes the bone a root.
    pub fn add_bone(&mut self, name: &str, parent: Option<BoneId>, rest_rotation: Quat) -> BoneId {
        let id = self.names.len();
        self.names.push(name.to_string());
        self.parents.push(parent.filter(|p| *p < id));
        self.rest_rotations.push(rest_rotation);
        self.local_rotations.push(rest_rotation);
        id
    }

    /// Exact name lookup
    pub fn find(&self, name: &str) -> Option<BoneId> {
        self.names.iter().position(|n| n == name)
    }

    pub fn name(&self, bone: BoneId) -> Option<&str> {
        self.names.get(bone).map(String::as_str)
    }

    pub fn parent(&self, bone: BoneId) -> Option<BoneId> {
        self.parents.get(bone).copied().flatten()
    }

    /// `(id, name)` for every bone
    pub fn bones(&self) -> impl Iterator<Item = (BoneId, &str)> + '_ {
        self.names.iter().enumerate().map(|(i, n)| (i, n.as_str()))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Accumulated rotation from the root down to `bone`.
    pub fn world_rotation(&self, bone: BoneId) -> Option<Quat> {
        let mut rotation = *self.local_rotations.get(bone)?;
        let mut current = self.parents[bone];
        while let Some(parent) = current {
            rotation = self.local_rotations[parent] * rotation;
            current = self.parents[parent];
        }
        Some(rotation)
    }

    pub fn rest_rotation(&self, bone: BoneId) -> Option<Quat> {
        self.rest_rotations.get(bone).copied()
    }

    /// Put every bone back at its rest rotation.
    pub fn reset_pose(&mut self) {
        self.local_rotations.clone_from(&self.rest_rotations);
    }

    /// A minimal humanoid with Mixamo-style hand bones, all at identity
    /// rest rotation: `Hips → {Left,Right}Hand → {Side}Hand{Finger}{1..3}`.
    pub fn reference_hands() -> Self {
        let mut rig = Self::new();
        let hips = rig.add_bone("mixamorig:Hips", None, Quat::IDENTITY);

        for side in ArmSide::ALL {
            let prefix = match side {
                ArmSide::Left => "Left",
                ArmSide::Right => "Right",
            };
            let hand = rig.add_bone(&format!("mixamorig:{prefix}Hand"), Some(hips), Quat::IDENTITY);

            for finger in Finger::ALL {
                let mut parent = hand;
                for seg in FingerSegment::ALL.iter().filter(|s| s.finger() == finger) {
                    let name = format!(
                        "mixamorig:{prefix}Hand{}{}",
                        finger.as_str(),
                        seg.ordinal()
                    );
                    parent = rig.add_bone(&name, Some(parent), Quat::IDENTITY);
                }
            }
        }

        rig
    }
}

impl Skeleton for RigSkeleton {
    fn local_rotation(&self, bone: BoneId) -> Option<Quat> {
        self.local_rotations.get(bone).copied()
    }

    fn set_local_rotation(&mut self, bone: BoneId, rotation: Quat) {
        if let Some(slot) = self.local_rotations.get_mut(bone) {
            *slot = rotation;
        }
    }

    fn parent_world_rotation(&self, bone: BoneId) -> Option<Quat> {
        self.world_rotation(self.parent(bone)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn test_reference_hands_layout() {
        let rig = RigSkeleton::reference_hands();
        // hips + 2 hands + 2 * 15 finger bones
        assert_eq!(rig.len(), 33);

        let tip = rig.find("mixamorig:LeftHandIndex3").unwrap();
        let mid = rig.find("mixamorig:LeftHandIndex2").unwrap();
        assert_eq!(rig.parent(tip), Some(mid));
        assert!(rig.find("mixamorig:RightHandPinky1").is_some());
    }

    #[test]
    fn test_world_rotation_accumulates() {
        let mut rig = RigSkeleton::new();
        let root = rig.add_bone("root", None, Quat::from_rotation_z(0.5));
        let child = rig.add_bone("child", Some(root), Quat::from_rotation_z(0.25));

        let world = rig.world_rotation(child).unwrap();
        assert!(world.angle_between(Quat::from_rotation_z(0.75)) < 1e-5);
        assert!(rig
            .parent_world_rotation(child)
            .unwrap()
            .angle_between(Quat::from_rotation_z(0.5))
            < 1e-5);
        assert!(rig.parent_world_rotation(root).is_none());
    }

    #[test]
    fn test_set_rotation_affects_children() {
        let mut rig = RigSkeleton::new();
        let root = rig.add_bone("root", None, Quat::IDENTITY);
        let child = rig.add_bone("child", Some(root), Quat::IDENTITY);

        rig.set_local_rotation(root, Quat::from_rotation_y(std::f32::consts::FRAC_PI_2));
        let dir = rig.world_rotation(child).unwrap() * Vec3::Z;
        assert!((dir - Vec3::X).length() < 1e-5);

        rig.reset_pose();
        assert_eq!(rig.local_rotation(root), Some(Quat::IDENTITY));
    }

    #[test]
    fn test_forward_parent_reference_becomes_root() {
        let mut rig = RigSkeleton::new();
        let a = rig.add_bone("a", Some(5), Quat::IDENTITY);
        assert_eq!(rig.parent(a), None);
        // Unknown bones are ignored
        rig.set_local_rotation(42, Quat::from_rotation_x(1.0));
        assert!(rig.local_rotation(42).is_none());
    }
}
