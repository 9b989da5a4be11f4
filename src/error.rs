use std::io;

use thiserror::Error;

/// Rejected TLB geometry.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("sets must be positive")]
    ZeroSets,
    #[error("ways must be positive")]
    ZeroWays,
    #[error("sets must be a power of two (e.g. 8, 16, 32, 64, 128), got {0}")]
    SetsNotPowerOfTwo(usize),
}

#[derive(Debug, Error)]
pub enum SimError {
    #[error("invalid TLB configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },
    #[error("malformed trace file: {0}")]
    Trace(String),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl SimError {
    pub fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        SimError::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}
