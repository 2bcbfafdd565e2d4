// src/keypoint.rs
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Detector confidence a keypoint has to strictly exceed to be kept.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.3;

/// A fixed, enumerated set of anatomical landmarks.
pub trait JointName: Copy + Eq + Hash + Ord + Debug + Send + Sync + 'static {
    /// Every joint of the set, in table order.
    const ALL: &'static [Self];

    /// Short label used in logs and errors ("body", "hand").
    const KIND: &'static str;

    /// Stable camelCase identifier, e.g. `leftShoulder` or `indexPIP`.
    fn name(&self) -> &'static str;

    fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|joint| joint.name() == name)
    }

    /// The `(neck, root)` pair spanning the torso, when the set has one.
    fn torso_axis() -> Option<(Self, Self)> {
        None
    }
}

/// Raw detector output for a single joint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub x: f64,
    pub y: f64,
    pub confidence: f64,
}

impl Observation {
    pub fn new(x: f64, y: f64, confidence: f64) -> Self {
        Self { x, y, confidence }
    }
}

/// Where the detector places the origin of its normalized coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageOrigin {
    /// y grows upwards; what the engine works in.
    #[default]
    BottomLeft,
    /// Native image layout; y is flipped on the way in.
    TopLeft,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keypoint<J> {
    pub joint: J,
    pub position: Point2<f64>,
    pub confidence: f64,
}

/// The gated keypoints of one processed video frame.
#[derive(Debug, Clone, PartialEq)]
pub struct KeypointFrame<J: JointName> {
    points: HashMap<J, Keypoint<J>>,
}

impl<J: JointName> Default for KeypointFrame<J> {
    fn default() -> Self {
        Self {
            points: HashMap::new(),
        }
    }
}

impl<J: JointName> KeypointFrame<J> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, joint: J) -> Option<&Keypoint<J>> {
        self.points.get(&joint)
    }

    pub fn position(&self, joint: J) -> Option<Point2<f64>> {
        self.points.get(&joint).map(|kp| kp.position)
    }

    pub fn contains(&self, joint: J) -> bool {
        self.points.contains_key(&joint)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Keypoint<J>> {
        self.points.values()
    }

    /// Mean confidence of the retained keypoints, 0 for an empty frame.
    pub fn mean_confidence(&self) -> f64 {
        if self.points.is_empty() {
            return 0.0;
        }
        self.points.values().map(|kp| kp.confidence).sum::<f64>() / self.points.len() as f64
    }
}

/// Drops keypoints the detector was not sure about.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfidenceGate {
    threshold: f64,
    origin: ImageOrigin,
}

impl Default for ConfidenceGate {
    fn default() -> Self {
        Self::new(DEFAULT_CONFIDENCE_THRESHOLD)
    }
}

impl ConfidenceGate {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            origin: ImageOrigin::BottomLeft,
        }
    }

    pub fn with_origin(mut self, origin: ImageOrigin) -> Self {
        self.origin = origin;
        self
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn passes(&self, obs: &Observation) -> bool {
        // NaN compares false, so it never passes.
        obs.confidence > self.threshold && obs.x.is_finite() && obs.y.is_finite()
    }

    /// Builds a frame from the observations whose confidence strictly exceeds
    /// the threshold. Joints the detector did not report are simply absent.
    pub fn apply<J, I>(&self, raw: I) -> KeypointFrame<J>
    where
        J: JointName,
        I: IntoIterator<Item = (J, Observation)>,
    {
        let points = raw
            .into_iter()
            .filter(|(_, obs)| self.passes(obs))
            .map(|(joint, obs)| {
                let y = match self.origin {
                    ImageOrigin::BottomLeft => obs.y,
                    ImageOrigin::TopLeft => 1.0 - obs.y,
                };
                let keypoint = Keypoint {
                    joint,
                    position: Point2::new(obs.x, y),
                    confidence: obs.confidence,
                };
                (joint, keypoint)
            })
            .collect();

        KeypointFrame { points }
    }
}

/// Maps string-keyed detector output onto a joint set.
pub fn resolve_joints<'a, J, I>(raw: I) -> Result<Vec<(J, Observation)>>
where
    J: JointName,
    I: IntoIterator<Item = (&'a str, Observation)>,
{
    raw.into_iter()
        .map(|(name, obs)| {
            J::from_name(name)
                .map(|joint| (joint, obs))
                .ok_or_else(|| EngineError::UnknownJoint {
                    kind: J::KIND,
                    name: name.to_string(),
                })
        })
        .collect()
}
