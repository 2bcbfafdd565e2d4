// src/engine.rs
//! Per-frame angle evaluation.
//!
//! Everything here is a pure function of the frame it is handed and the
//! static angle table, so it can run on any thread against a shared
//! snapshot. A value that cannot be computed (keypoint gated out, torso
//! missing, zero-length vector) comes back as `None` for that angle only.

use std::collections::BTreeMap;

use crate::angles::{AngleRule, AngleSet};
use crate::geometry::{angle_at, angle_between, BodyPlanes};
use crate::keypoint::{JointName, KeypointFrame};

/// Torso reference for `frame`, if its joint set has one and both ends of
/// the torso passed the confidence gate.
pub fn body_planes<J: JointName>(frame: &KeypointFrame<J>) -> Option<BodyPlanes> {
    let (neck, root) = J::torso_axis()?;
    BodyPlanes::from_torso(&frame.position(neck)?, &frame.position(root)?)
}

fn evaluate<J: JointName>(
    frame: &KeypointFrame<J>,
    planes: Option<&BodyPlanes>,
    rule: AngleRule<J>,
) -> Option<f64> {
    match rule {
        AngleRule::Triple { start, vertex, end } => angle_at(
            &frame.position(start)?,
            &frame.position(vertex)?,
            &frame.position(end)?,
        ),
        AngleRule::PlaneRelative {
            proximal,
            distal,
            plane,
        } => {
            let limb = frame.position(distal)? - frame.position(proximal)?;
            angle_between(&limb, planes?.reference(plane))
        }
    }
}

/// Computes a single named angle, in degrees.
pub fn compute_angle<A: AngleSet>(frame: &KeypointFrame<A::Joint>, angle: A) -> Option<f64> {
    let rule = angle.rule();
    let planes = if rule.is_plane_relative() {
        body_planes(frame)
    } else {
        None
    };
    evaluate(frame, planes.as_ref(), rule)
}

/// Computes every angle of the table for one frame.
pub fn compute_all<A: AngleSet>(frame: &KeypointFrame<A::Joint>) -> AngleReport<A> {
    let planes = body_planes(frame);
    let values = A::ALL
        .iter()
        .map(|angle| (*angle, evaluate(frame, planes.as_ref(), angle.rule())))
        .collect();
    AngleReport { values }
}

/// All angles of a table for one frame; absent values are kept as `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct AngleReport<A: AngleSet> {
    values: BTreeMap<A, Option<f64>>,
}

impl<A: AngleSet> AngleReport<A> {
    pub fn get(&self, angle: A) -> Option<f64> {
        self.values.get(&angle).copied().flatten()
    }

    pub fn get_by_label(&self, label: &str) -> Option<f64> {
        A::from_label(label).and_then(|angle| self.get(angle))
    }

    /// Every angle of the table in table order, with its value.
    pub fn iter(&self) -> impl Iterator<Item = (A, Option<f64>)> + '_ {
        A::ALL.iter().map(move |angle| (*angle, self.get(*angle)))
    }

    /// Angles that produced a value this frame.
    pub fn present(&self) -> impl Iterator<Item = (A, f64)> + '_ {
        self.iter().filter_map(|(angle, value)| value.map(|v| (angle, v)))
    }

    pub fn present_count(&self) -> usize {
        self.present().count()
    }

    /// Label-keyed view for consumers that do not know the angle enum.
    pub fn labelled(&self) -> BTreeMap<&'static str, Option<f64>> {
        self.iter().map(|(angle, value)| (angle.label(), value)).collect()
    }
}
