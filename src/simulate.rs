// src/simulate.rs
//! Synthetic detector output for demos and end-to-end tests.
//!
//! Limbs swing on slow sinusoids and a low-confidence dropout is injected
//! every `DROPOUT_PERIOD` frames so downstream consumers see absent angles
//! the way they would with a real detector.

use std::f64::consts::PI;

use nalgebra::{Point2, Vector2};

use crate::body::BodyJoint;
use crate::hand::{Finger, HandJoint};
use crate::input::RawFrame;
use crate::keypoint::Observation;

const DROPOUT_PERIOD: u64 = 45;
const DROPOUT_CONFIDENCE: f64 = 0.2;

pub struct Simulator {
    sim_time: f64,
    dt: f64,
    frame_counter: u64,
}

/// Unit vector pointing straight down, rotated by `degrees` towards `side`
/// (+1 image-right, -1 image-left).
fn limb_direction(degrees: f64, side: f64) -> Vector2<f64> {
    let rad = degrees.to_radians();
    Vector2::new(side * rad.sin(), -rad.cos())
}

fn observe(p: Point2<f64>, confidence: f64) -> Observation {
    Observation::new(p.x, p.y, confidence)
}

impl Simulator {
    pub fn new(fps: f64) -> Self {
        Self {
            sim_time: 0.0,
            dt: 1.0 / fps.max(1.0),
            frame_counter: 0,
        }
    }

    pub fn frames_generated(&self) -> u64 {
        self.frame_counter
    }

    fn advance(&mut self) -> (f64, bool) {
        let t = self.sim_time;
        self.frame_counter += 1;
        self.sim_time += self.dt;
        (t, self.frame_counter % DROPOUT_PERIOD == 0)
    }

    pub fn next_body_frame(&mut self) -> RawFrame {
        let (t, dropout) = self.advance();
        let mut frame = RawFrame::new(t);

        let neck = Point2::new(0.5, 0.78);
        let root = Point2::new(0.5, 0.45);
        frame.insert(BodyJoint::Nose, observe(Point2::new(0.5, 0.88), 0.85));
        frame.insert(BodyJoint::Neck, observe(neck, 0.95));
        frame.insert(BodyJoint::Root, observe(root, 0.95));

        // right arm abducts, left arm flexes forward, both between 0 and 90°
        let right_raise = 45.0 * (1.0 - (0.8 * t).cos());
        let left_raise = 45.0 * (1.0 - (0.6 * t + 1.0).cos());
        let elbow_bend = 30.0 * (1.0 - (1.1 * t).cos());

        for (side, raise, shoulder, elbow, wrist) in [
            (
                1.0,
                right_raise,
                BodyJoint::RightShoulder,
                BodyJoint::RightElbow,
                BodyJoint::RightWrist,
            ),
            (
                -1.0,
                left_raise,
                BodyJoint::LeftShoulder,
                BodyJoint::LeftElbow,
                BodyJoint::LeftWrist,
            ),
        ] {
            let s = Point2::new(0.5 + side * 0.08, 0.76);
            let e = s + limb_direction(raise, side) * 0.14;
            let w = e + limb_direction(raise + elbow_bend, side) * 0.12;
            frame.insert(shoulder, observe(s, 0.95));
            frame.insert(elbow, observe(e, 0.9));
            let wrist_confidence = if dropout && side > 0.0 {
                DROPOUT_CONFIDENCE
            } else {
                0.85
            };
            frame.insert(wrist, observe(w, wrist_confidence));
        }

        let knee_lift = 20.0 * (1.0 - (0.5 * t).cos());
        for (side, hip, knee, ankle) in [
            (1.0, BodyJoint::RightHip, BodyJoint::RightKnee, BodyJoint::RightAnkle),
            (-1.0, BodyJoint::LeftHip, BodyJoint::LeftKnee, BodyJoint::LeftAnkle),
        ] {
            let h = Point2::new(0.5 + side * 0.05, 0.45);
            let k = h + limb_direction(knee_lift * (side + 1.0) / 2.0, side) * 0.2;
            let a = k + limb_direction(0.0, side) * 0.2;
            frame.insert(hip, observe(h, 0.9));
            frame.insert(knee, observe(k, 0.85));
            frame.insert(ankle, observe(a, 0.8));
        }

        frame
    }

    pub fn next_hand_frame(&mut self) -> RawFrame {
        let (t, dropout) = self.advance();
        let mut frame = RawFrame::new(t);

        let wrist = Point2::new(0.5, 0.2);
        frame.insert(HandJoint::Wrist, observe(wrist, 0.95));

        // each finger curls between straight and 60° per joint, out of phase
        for (i, finger) in Finger::ALL.iter().enumerate() {
            let spread = (i as f64 - 2.0) * 18.0;
            let curl = 30.0 * (1.0 - (0.9 * t + i as f64 * PI / 5.0).cos());
            let chain = finger.chain();

            let mut heading = spread.to_radians();
            let mut p = wrist + Vector2::new(heading.sin(), heading.cos()) * 0.08;
            for (k, joint) in chain.iter().enumerate() {
                let confidence = if dropout && *finger == Finger::Index && k == 3 {
                    DROPOUT_CONFIDENCE
                } else {
                    0.9
                };
                frame.insert(*joint, observe(p, confidence));
                if k > 0 {
                    heading += curl.to_radians();
                }
                p += Vector2::new(heading.sin(), heading.cos()) * 0.04;
            }
        }

        frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::angles::AngleSet;
    use crate::body::BodyAngle;
    use crate::engine::compute_all;
    use crate::hand::HandAngle;
    use crate::keypoint::{ConfidenceGate, JointName};

    #[test]
    fn body_frames_are_complete_until_dropout() {
        let gate = ConfidenceGate::default();
        let mut sim = Simulator::new(30.0);

        for n in 1..=DROPOUT_PERIOD {
            let raw = sim.next_body_frame();
            let frame = gate.apply(raw.resolve::<BodyJoint>().unwrap());
            let report = compute_all::<BodyAngle>(&frame);

            if n % DROPOUT_PERIOD == 0 {
                assert_eq!(report.get(BodyAngle::RightElbowFlexion), None);
                assert!(report.get(BodyAngle::LeftElbowFlexion).is_some());
            } else {
                assert_eq!(report.present_count(), BodyAngle::ALL.len(), "frame {n}");
            }
        }
        assert_eq!(sim.frames_generated(), DROPOUT_PERIOD);
    }

    #[test]
    fn first_frame_starts_at_rest() {
        let mut sim = Simulator::new(30.0);
        let raw = sim.next_body_frame();
        assert_eq!(raw.timestamp, 0.0);

        let frame = ConfidenceGate::default().apply(raw.resolve::<BodyJoint>().unwrap());
        let report = compute_all::<BodyAngle>(&frame);
        assert!(report.get(BodyAngle::RightShoulderFlexion).unwrap() < 1e-4);
    }

    #[test]
    fn hand_frames_cover_every_joint() {
        let mut sim = Simulator::new(60.0);
        let raw = sim.next_hand_frame();
        assert_eq!(raw.joints.len(), HandJoint::ALL.len());

        let frame = ConfidenceGate::default().apply(raw.resolve::<HandJoint>().unwrap());
        let report = compute_all::<HandAngle>(&frame);
        assert_eq!(report.present_count(), 10);
        for (_, degrees) in report.present() {
            assert!((0.0..=180.0).contains(&degrees));
        }
    }
}
