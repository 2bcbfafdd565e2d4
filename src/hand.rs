// src/hand.rs
use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::angles::{AngleRule, AngleSet};
use crate::keypoint::JointName;

/// Hand landmarks, ordered wrist first and then base-to-tip per finger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HandJoint {
    Wrist,
    ThumbCmc,
    ThumbMp,
    ThumbIp,
    ThumbTip,
    IndexMcp,
    IndexPip,
    IndexDip,
    IndexTip,
    MiddleMcp,
    MiddlePip,
    MiddleDip,
    MiddleTip,
    RingMcp,
    RingPip,
    RingDip,
    RingTip,
    LittleMcp,
    LittlePip,
    LittleDip,
    LittleTip,
}

static HAND_JOINTS_BY_NAME: Lazy<HashMap<&'static str, HandJoint>> = Lazy::new(|| {
    HandJoint::ALL
        .iter()
        .map(|joint| (joint.name(), *joint))
        .collect()
});

impl JointName for HandJoint {
    const ALL: &'static [Self] = &[
        HandJoint::Wrist,
        HandJoint::ThumbCmc,
        HandJoint::ThumbMp,
        HandJoint::ThumbIp,
        HandJoint::ThumbTip,
        HandJoint::IndexMcp,
        HandJoint::IndexPip,
        HandJoint::IndexDip,
        HandJoint::IndexTip,
        HandJoint::MiddleMcp,
        HandJoint::MiddlePip,
        HandJoint::MiddleDip,
        HandJoint::MiddleTip,
        HandJoint::RingMcp,
        HandJoint::RingPip,
        HandJoint::RingDip,
        HandJoint::RingTip,
        HandJoint::LittleMcp,
        HandJoint::LittlePip,
        HandJoint::LittleDip,
        HandJoint::LittleTip,
    ];

    const KIND: &'static str = "hand";

    fn name(&self) -> &'static str {
        match self {
            HandJoint::Wrist => "wrist",
            HandJoint::ThumbCmc => "thumbCMC",
            HandJoint::ThumbMp => "thumbMP",
            HandJoint::ThumbIp => "thumbIP",
            HandJoint::ThumbTip => "thumbTip",
            HandJoint::IndexMcp => "indexMCP",
            HandJoint::IndexPip => "indexPIP",
            HandJoint::IndexDip => "indexDIP",
            HandJoint::IndexTip => "indexTip",
            HandJoint::MiddleMcp => "middleMCP",
            HandJoint::MiddlePip => "middlePIP",
            HandJoint::MiddleDip => "middleDIP",
            HandJoint::MiddleTip => "middleTip",
            HandJoint::RingMcp => "ringMCP",
            HandJoint::RingPip => "ringPIP",
            HandJoint::RingDip => "ringDIP",
            HandJoint::RingTip => "ringTip",
            HandJoint::LittleMcp => "littleMCP",
            HandJoint::LittlePip => "littlePIP",
            HandJoint::LittleDip => "littleDIP",
            HandJoint::LittleTip => "littleTip",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        HAND_JOINTS_BY_NAME.get(name).copied()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Finger {
    Thumb,
    Index,
    Middle,
    Ring,
    Little,
}

impl Finger {
    pub const ALL: [Finger; 5] = [
        Finger::Thumb,
        Finger::Index,
        Finger::Middle,
        Finger::Ring,
        Finger::Little,
    ];

    /// The finger's four landmarks from the base of the palm to the tip.
    /// For the thumb that is CMC, MP, IP, tip.
    pub fn chain(&self) -> [HandJoint; 4] {
        use HandJoint::*;
        match self {
            Finger::Thumb => [ThumbCmc, ThumbMp, ThumbIp, ThumbTip],
            Finger::Index => [IndexMcp, IndexPip, IndexDip, IndexTip],
            Finger::Middle => [MiddleMcp, MiddlePip, MiddleDip, MiddleTip],
            Finger::Ring => [RingMcp, RingPip, RingDip, RingTip],
            Finger::Little => [LittleMcp, LittlePip, LittleDip, LittleTip],
        }
    }
}

/// Which of the two measured finger joints an angle belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FingerJoint {
    /// Joint nearest the fingertip (DIP, or IP for the thumb).
    Distal,
    /// The next joint toward the palm (PIP, or MP for the thumb).
    Proximal,
}

/// Flexion at one finger joint; 180° is a fully extended finger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HandAngle {
    pub finger: Finger,
    pub joint: FingerJoint,
}

impl HandAngle {
    pub const fn new(finger: Finger, joint: FingerJoint) -> Self {
        Self { finger, joint }
    }
}

impl AngleSet for HandAngle {
    type Joint = HandJoint;

    const ALL: &'static [Self] = &[
        HandAngle::new(Finger::Thumb, FingerJoint::Distal),
        HandAngle::new(Finger::Thumb, FingerJoint::Proximal),
        HandAngle::new(Finger::Index, FingerJoint::Distal),
        HandAngle::new(Finger::Index, FingerJoint::Proximal),
        HandAngle::new(Finger::Middle, FingerJoint::Distal),
        HandAngle::new(Finger::Middle, FingerJoint::Proximal),
        HandAngle::new(Finger::Ring, FingerJoint::Distal),
        HandAngle::new(Finger::Ring, FingerJoint::Proximal),
        HandAngle::new(Finger::Little, FingerJoint::Distal),
        HandAngle::new(Finger::Little, FingerJoint::Proximal),
    ];

    fn label(&self) -> &'static str {
        match (self.finger, self.joint) {
            (Finger::Thumb, FingerJoint::Distal) => "Thumb IP",
            (Finger::Thumb, FingerJoint::Proximal) => "Thumb MP",
            (Finger::Index, FingerJoint::Distal) => "Index DIP",
            (Finger::Index, FingerJoint::Proximal) => "Index PIP",
            (Finger::Middle, FingerJoint::Distal) => "Middle DIP",
            (Finger::Middle, FingerJoint::Proximal) => "Middle PIP",
            (Finger::Ring, FingerJoint::Distal) => "Ring DIP",
            (Finger::Ring, FingerJoint::Proximal) => "Ring PIP",
            (Finger::Little, FingerJoint::Distal) => "Little DIP",
            (Finger::Little, FingerJoint::Proximal) => "Little PIP",
        }
    }

    fn rule(&self) -> AngleRule<HandJoint> {
        let [base, second, third, tip] = self.finger.chain();
        match self.joint {
            FingerJoint::Distal => AngleRule::Triple {
                start: tip,
                vertex: third,
                end: second,
            },
            FingerJoint::Proximal => AngleRule::Triple {
                start: third,
                vertex: second,
                end: base,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joint_names_round_trip() {
        assert_eq!(HandJoint::ALL.len(), 21);
        for joint in HandJoint::ALL {
            assert_eq!(HandJoint::from_name(joint.name()), Some(*joint));
        }
        assert_eq!(HandJoint::from_name("indexPIP"), Some(HandJoint::IndexPip));
        assert_eq!(HandJoint::torso_axis(), None);
    }

    #[test]
    fn ten_angles_two_per_finger() {
        assert_eq!(HandAngle::ALL.len(), 10);
        for finger in Finger::ALL {
            let count = HandAngle::ALL.iter().filter(|a| a.finger == finger).count();
            assert_eq!(count, 2);
        }
    }

    #[test]
    fn index_rules() {
        let dip = HandAngle::new(Finger::Index, FingerJoint::Distal).rule();
        assert_eq!(
            dip,
            AngleRule::Triple {
                start: HandJoint::IndexTip,
                vertex: HandJoint::IndexDip,
                end: HandJoint::IndexPip,
            }
        );

        let pip = HandAngle::new(Finger::Index, FingerJoint::Proximal).rule();
        assert_eq!(
            pip,
            AngleRule::Triple {
                start: HandJoint::IndexDip,
                vertex: HandJoint::IndexPip,
                end: HandJoint::IndexMcp,
            }
        );
    }

    #[test]
    fn thumb_uses_ip_and_mp() {
        let ip = HandAngle::new(Finger::Thumb, FingerJoint::Distal).rule();
        assert_eq!(
            ip,
            AngleRule::Triple {
                start: HandJoint::ThumbTip,
                vertex: HandJoint::ThumbIp,
                end: HandJoint::ThumbMp,
            }
        );
        let mp = HandAngle::new(Finger::Thumb, FingerJoint::Proximal).rule();
        assert_eq!(
            mp.required_joints(),
            vec![HandJoint::ThumbIp, HandJoint::ThumbMp, HandJoint::ThumbCmc]
        );
        assert_eq!(
            HandAngle::from_label("Thumb MP"),
            Some(HandAngle::new(Finger::Thumb, FingerJoint::Proximal))
        );
    }
}
