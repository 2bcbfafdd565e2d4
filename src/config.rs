// src/config.rs
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::keypoint::{ConfidenceGate, ImageOrigin, DEFAULT_CONFIDENCE_THRESHOLD};

/// Runtime settings for the gate, the display poller and exports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub confidence_threshold: f64,
    pub image_origin: ImageOrigin,
    pub poll_interval_ms: u64,
    pub output_directory: PathBuf,
    pub session_name: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            image_origin: ImageOrigin::BottomLeft,
            poll_interval_ms: 500,
            output_directory: directories::UserDirs::new()
                .and_then(|dirs| dirs.document_dir().map(|p| p.join("PoseAngles")))
                .unwrap_or_else(|| PathBuf::from("./output")),
            session_name: None,
        }
    }
}

impl EngineConfig {
    pub fn from_json(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|source| EngineError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let config: EngineConfig =
            serde_json::from_str(&contents).map_err(|source| EngineError::ConfigParse {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|source| EngineError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..1.0).contains(&self.confidence_threshold) {
            return Err(EngineError::invalid_config(
                "confidence_threshold",
                format!("must be in [0, 1), got {}", self.confidence_threshold),
            ));
        }
        if self.poll_interval_ms == 0 {
            return Err(EngineError::invalid_config(
                "poll_interval_ms",
                "must be greater than zero",
            ));
        }
        if matches!(&self.session_name, Some(name) if name.trim().is_empty()) {
            return Err(EngineError::invalid_config(
                "session_name",
                "must not be blank",
            ));
        }
        Ok(())
    }

    pub fn gate(&self) -> ConfidenceGate {
        ConfidenceGate::new(self.confidence_threshold).with_origin(self.image_origin)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// The configured session name, or one stamped with the local time.
    pub fn resolved_session_name(&self) -> String {
        self.session_name
            .clone()
            .unwrap_or_else(|| format!("session_{}", Local::now().format("%Y%m%d_%H%M%S")))
    }
}
