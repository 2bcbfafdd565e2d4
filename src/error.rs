// src/error.rs
use std::path::PathBuf;

use thiserror::Error;

use crate::session::SessionState;

/// Errors raised around the geometry engine: input decoding, configuration,
/// session misuse and export I/O. The engine itself never fails; missing data
/// is reported as an absent angle instead.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("unknown {kind} joint `{name}`")]
    UnknownJoint { kind: &'static str, name: String },

    #[error("invalid value for `{field}`: {reason}")]
    InvalidConfig { field: &'static str, reason: String },

    #[error("cannot read config file `{path}`: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse config file `{path}`: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("cannot {action} a session that is {state:?}")]
    InvalidTransition {
        state: SessionState,
        action: &'static str,
    },

    #[error("malformed frame on line {line}: {source}")]
    Input {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("line {line} is not valid UTF-8: {source}")]
    Encoding {
        line: usize,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl EngineError {
    pub fn invalid_config(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
