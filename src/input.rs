// src/input.rs
//! JSON Lines detector output: one frame per line.
//!
//! ```text
//! {"timestamp": 0.033, "joints": {"neck": {"x": 0.5, "y": 0.8, "confidence": 0.92}}}
//! ```

use std::collections::BTreeMap;
use std::io::{BufRead, ErrorKind, Write};

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::keypoint::{resolve_joints, JointName, Observation};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawFrame {
    /// Seconds since the start of the capture.
    pub timestamp: f64,
    #[serde(default)]
    pub joints: BTreeMap<String, Observation>,
}

impl RawFrame {
    pub fn new(timestamp: f64) -> Self {
        Self {
            timestamp,
            joints: BTreeMap::new(),
        }
    }

    pub fn insert<J: JointName>(&mut self, joint: J, obs: Observation) {
        self.joints.insert(joint.name().to_string(), obs);
    }

    /// Typed view of the frame's joints for a particular joint set.
    pub fn resolve<J: JointName>(&self) -> Result<Vec<(J, Observation)>> {
        resolve_joints(self.joints.iter().map(|(name, obs)| (name.as_str(), *obs)))
    }

    /// Like [`RawFrame::resolve`], but keeps going past names the joint set
    /// does not know and hands them back instead.
    pub fn resolve_known<J: JointName>(&self) -> (Vec<(J, Observation)>, Vec<&str>) {
        let mut known = Vec::with_capacity(self.joints.len());
        let mut unknown = Vec::new();
        for (name, obs) in &self.joints {
            match J::from_name(name) {
                Some(joint) => known.push((joint, *obs)),
                None => unknown.push(name.as_str()),
            }
        }
        (known, unknown)
    }
}

/// Lazily decodes frames, skipping blank lines. Line numbers in errors are
/// 1-based. A line that fails to decode does not end the stream; only a
/// read failure of the underlying reader surfaces as [`EngineError::Io`].
pub fn read_frames<R: BufRead>(reader: R) -> impl Iterator<Item = Result<RawFrame>> {
    reader
        .lines()
        .enumerate()
        .filter_map(|(index, line)| match line {
            Err(e) if e.kind() == ErrorKind::InvalidData => Some(Err(EngineError::Encoding {
                line: index + 1,
                source: e,
            })),
            Err(e) => Some(Err(EngineError::Io(e))),
            Ok(line) if line.trim().is_empty() => None,
            Ok(line) => Some(
                serde_json::from_str(&line).map_err(|source| EngineError::Input {
                    line: index + 1,
                    source,
                }),
            ),
        })
}

pub fn write_frame<W: Write>(mut writer: W, frame: &RawFrame) -> Result<()> {
    let line = serde_json::to_string(frame).map_err(std::io::Error::from)?;
    writeln!(writer, "{line}")?;
    Ok(())
}
