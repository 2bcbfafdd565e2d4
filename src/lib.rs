// src/lib.rs
//! Joint-angle estimation from 2D body and hand keypoints.
//!
//! A detector hands over named keypoints with a confidence each; the
//! [`ConfidenceGate`] keeps the ones it is sure about, and the engine maps
//! them through a static angle table ([`BodyAngle`] or [`HandAngle`]) to
//! unsigned angles in degrees. An angle that cannot be computed is `None`,
//! never zero.
//!
//! ```
//! use pose_angles::{compute_angle, BodyAngle, BodyJoint, ConfidenceGate, Observation};
//!
//! let frame = ConfidenceGate::default().apply(vec![
//!     (BodyJoint::Neck, Observation::new(0.5, 0.8, 0.9)),
//!     (BodyJoint::Root, Observation::new(0.5, 0.2, 0.9)),
//!     (BodyJoint::RightShoulder, Observation::new(0.6, 0.75, 0.9)),
//!     (BodyJoint::RightElbow, Observation::new(0.6, 0.55, 0.9)),
//! ]);
//!
//! let flexion = compute_angle(&frame, BodyAngle::RightShoulderFlexion).unwrap();
//! assert!(flexion < 1e-4);
//! assert_eq!(compute_angle(&frame, BodyAngle::LeftShoulderFlexion), None);
//! ```

pub mod angles;
pub mod body;
pub mod config;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod hand;
pub mod input;
pub mod keypoint;
pub mod recorder;
pub mod session;
pub mod simulate;

pub use angles::{AngleRule, AngleSet};
pub use body::{BodyAngle, BodyJoint};
pub use config::EngineConfig;
pub use engine::{compute_all, compute_angle, AngleReport};
pub use error::{EngineError, Result};
pub use geometry::{angle_at, angle_between, BodyPlanes, Plane};
pub use hand::{Finger, FingerJoint, HandAngle, HandJoint};
pub use input::RawFrame;
pub use keypoint::{ConfidenceGate, ImageOrigin, JointName, Keypoint, KeypointFrame, Observation};
pub use recorder::AngleRecorder;
pub use session::{spawn_poller, AngleUpdate, CaptureSession, SessionState, MIN_POLL_PERIOD};
