// src/body.rs
use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::angles::{AngleRule, AngleSet};
use crate::geometry::Plane;
use crate::keypoint::JointName;

/// Full-body landmarks reported by the pose detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BodyJoint {
    Nose,
    LeftEye,
    RightEye,
    LeftEar,
    RightEar,
    Neck,
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftWrist,
    RightWrist,
    /// Centre of the hips.
    Root,
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
    LeftAnkle,
    RightAnkle,
}

static BODY_JOINTS_BY_NAME: Lazy<HashMap<&'static str, BodyJoint>> = Lazy::new(|| {
    BodyJoint::ALL
        .iter()
        .map(|joint| (joint.name(), *joint))
        .collect()
});

impl JointName for BodyJoint {
    const ALL: &'static [Self] = &[
        BodyJoint::Nose,
        BodyJoint::LeftEye,
        BodyJoint::RightEye,
        BodyJoint::LeftEar,
        BodyJoint::RightEar,
        BodyJoint::Neck,
        BodyJoint::LeftShoulder,
        BodyJoint::RightShoulder,
        BodyJoint::LeftElbow,
        BodyJoint::RightElbow,
        BodyJoint::LeftWrist,
        BodyJoint::RightWrist,
        BodyJoint::Root,
        BodyJoint::LeftHip,
        BodyJoint::RightHip,
        BodyJoint::LeftKnee,
        BodyJoint::RightKnee,
        BodyJoint::LeftAnkle,
        BodyJoint::RightAnkle,
    ];

    const KIND: &'static str = "body";

    fn name(&self) -> &'static str {
        match self {
            BodyJoint::Nose => "nose",
            BodyJoint::LeftEye => "leftEye",
            BodyJoint::RightEye => "rightEye",
            BodyJoint::LeftEar => "leftEar",
            BodyJoint::RightEar => "rightEar",
            BodyJoint::Neck => "neck",
            BodyJoint::LeftShoulder => "leftShoulder",
            BodyJoint::RightShoulder => "rightShoulder",
            BodyJoint::LeftElbow => "leftElbow",
            BodyJoint::RightElbow => "rightElbow",
            BodyJoint::LeftWrist => "leftWrist",
            BodyJoint::RightWrist => "rightWrist",
            BodyJoint::Root => "root",
            BodyJoint::LeftHip => "leftHip",
            BodyJoint::RightHip => "rightHip",
            BodyJoint::LeftKnee => "leftKnee",
            BodyJoint::RightKnee => "rightKnee",
            BodyJoint::LeftAnkle => "leftAnkle",
            BodyJoint::RightAnkle => "rightAnkle",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        BODY_JOINTS_BY_NAME.get(name).copied()
    }

    fn torso_axis() -> Option<(Self, Self)> {
        Some((BodyJoint::Neck, BodyJoint::Root))
    }
}

/// Flexion/extension and abduction/adduction angles of the limbs.
///
/// Limb vectors run from the proximal to the distal joint and the sagittal
/// reference runs from neck to hip centre, so a limb hanging alongside the
/// torso reads close to 0° and one raised overhead close to 180°. The value
/// is unsigned: flexion and extension of the same magnitude are not told
/// apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BodyAngle {
    LeftShoulderFlexion,
    RightShoulderFlexion,
    LeftShoulderAbduction,
    RightShoulderAbduction,
    LeftElbowFlexion,
    RightElbowFlexion,
    LeftHipFlexion,
    RightHipFlexion,
    LeftHipAbduction,
    RightHipAbduction,
    LeftKneeFlexion,
    RightKneeFlexion,
}

impl AngleSet for BodyAngle {
    type Joint = BodyJoint;

    const ALL: &'static [Self] = &[
        BodyAngle::LeftShoulderFlexion,
        BodyAngle::RightShoulderFlexion,
        BodyAngle::LeftShoulderAbduction,
        BodyAngle::RightShoulderAbduction,
        BodyAngle::LeftElbowFlexion,
        BodyAngle::RightElbowFlexion,
        BodyAngle::LeftHipFlexion,
        BodyAngle::RightHipFlexion,
        BodyAngle::LeftHipAbduction,
        BodyAngle::RightHipAbduction,
        BodyAngle::LeftKneeFlexion,
        BodyAngle::RightKneeFlexion,
    ];

    fn label(&self) -> &'static str {
        match self {
            BodyAngle::LeftShoulderFlexion => "Left Shoulder Flexion/Extension",
            BodyAngle::RightShoulderFlexion => "Right Shoulder Flexion/Extension",
            BodyAngle::LeftShoulderAbduction => "Left Shoulder Abduction/Adduction",
            BodyAngle::RightShoulderAbduction => "Right Shoulder Abduction/Adduction",
            BodyAngle::LeftElbowFlexion => "Left Elbow Flexion/Extension",
            BodyAngle::RightElbowFlexion => "Right Elbow Flexion/Extension",
            BodyAngle::LeftHipFlexion => "Left Hip Flexion/Extension",
            BodyAngle::RightHipFlexion => "Right Hip Flexion/Extension",
            BodyAngle::LeftHipAbduction => "Left Hip Abduction/Adduction",
            BodyAngle::RightHipAbduction => "Right Hip Abduction/Adduction",
            BodyAngle::LeftKneeFlexion => "Left Knee Flexion/Extension",
            BodyAngle::RightKneeFlexion => "Right Knee Flexion/Extension",
        }
    }

    fn rule(&self) -> AngleRule<BodyJoint> {
        use BodyJoint::*;

        let (proximal, distal, plane) = match self {
            BodyAngle::LeftShoulderFlexion => (LeftShoulder, LeftElbow, Plane::Sagittal),
            BodyAngle::RightShoulderFlexion => (RightShoulder, RightElbow, Plane::Sagittal),
            BodyAngle::LeftShoulderAbduction => (LeftShoulder, LeftElbow, Plane::Frontal),
            BodyAngle::RightShoulderAbduction => (RightShoulder, RightElbow, Plane::Frontal),
            BodyAngle::LeftElbowFlexion => (LeftElbow, LeftWrist, Plane::Sagittal),
            BodyAngle::RightElbowFlexion => (RightElbow, RightWrist, Plane::Sagittal),
            BodyAngle::LeftHipFlexion => (LeftHip, LeftKnee, Plane::Sagittal),
            BodyAngle::RightHipFlexion => (RightHip, RightKnee, Plane::Sagittal),
            BodyAngle::LeftHipAbduction => (LeftHip, LeftKnee, Plane::Frontal),
            BodyAngle::RightHipAbduction => (RightHip, RightKnee, Plane::Frontal),
            BodyAngle::LeftKneeFlexion => (LeftKnee, LeftAnkle, Plane::Sagittal),
            BodyAngle::RightKneeFlexion => (RightKnee, RightAnkle, Plane::Sagittal),
        };

        AngleRule::PlaneRelative {
            proximal,
            distal,
            plane,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn joint_names_round_trip() {
        assert_eq!(BodyJoint::ALL.len(), 19);
        for joint in BodyJoint::ALL {
            assert_eq!(BodyJoint::from_name(joint.name()), Some(*joint));
        }
        assert_eq!(BodyJoint::from_name("LeftShoulder"), None);
    }

    #[test]
    fn serde_uses_detector_names() {
        let json = serde_json::to_string(&BodyJoint::LeftShoulder).unwrap();
        assert_eq!(json, "\"leftShoulder\"");
    }

    #[test]
    fn table_is_total_and_unique() {
        assert_eq!(BodyAngle::ALL.len(), 12);
        let labels: HashSet<_> = BodyAngle::ALL.iter().map(|a| a.label()).collect();
        assert_eq!(labels.len(), 12);

        for angle in BodyAngle::ALL {
            let rule = angle.rule();
            assert!(rule.is_plane_relative());
            let required = rule.required_joints();
            assert!(required.contains(&BodyJoint::Neck));
            assert!(required.contains(&BodyJoint::Root));
            assert_eq!(BodyAngle::from_label(angle.label()), Some(*angle));
        }
    }

    #[test]
    fn abduction_only_for_ball_joints() {
        let frontal: Vec<_> = BodyAngle::ALL
            .iter()
            .filter(|a| {
                matches!(
                    a.rule(),
                    AngleRule::PlaneRelative {
                        plane: Plane::Frontal,
                        ..
                    }
                )
            })
            .map(|a| a.label())
            .collect();
        assert_eq!(frontal.len(), 4);
        assert!(frontal.iter().all(|l| l.contains("Shoulder") || l.contains("Hip")));
    }
}
