// src/angles.rs
use std::fmt::Debug;
use std::hash::Hash;

use crate::geometry::Plane;
use crate::keypoint::JointName;

/// Which keypoints define a named angle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AngleRule<J> {
    /// Angle at `vertex` between the rays to `start` and `end`.
    Triple { start: J, vertex: J, end: J },
    /// Angle between the limb `proximal -> distal` and a torso reference.
    PlaneRelative { proximal: J, distal: J, plane: Plane },
}

impl<J: JointName> AngleRule<J> {
    /// Keypoints that must survive the confidence gate for the rule to
    /// yield a value. Plane-relative rules additionally need the torso axis.
    pub fn required_joints(&self) -> Vec<J> {
        match *self {
            AngleRule::Triple { start, vertex, end } => vec![start, vertex, end],
            AngleRule::PlaneRelative {
                proximal, distal, ..
            } => {
                let mut joints = vec![proximal, distal];
                if let Some((neck, root)) = J::torso_axis() {
                    joints.push(neck);
                    joints.push(root);
                }
                joints
            }
        }
    }

    pub fn is_plane_relative(&self) -> bool {
        matches!(self, AngleRule::PlaneRelative { .. })
    }
}

/// A static, total table of named angles over one joint set.
pub trait AngleSet: Copy + Eq + Hash + Ord + Debug + Send + Sync + 'static {
    type Joint: JointName;

    /// Every angle of the table, in reporting order.
    const ALL: &'static [Self];

    /// Human readable name, e.g. "Right Shoulder Flexion/Extension".
    fn label(&self) -> &'static str;

    fn rule(&self) -> AngleRule<Self::Joint>;

    fn from_label(label: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|angle| angle.label() == label)
    }

    fn labels() -> Vec<&'static str> {
        Self::ALL.iter().map(|angle| angle.label()).collect()
    }
}
