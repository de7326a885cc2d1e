// src/errors.rs

//! Crate-wide error types and aliases.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LabrunError {
    /// The result sink could not be turned into a runnable procedure.
    #[error("Construction error: {0}")]
    Construction(String),

    /// The procedure rejected its parameters.
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// `Worker::start` was called outside of a Tokio runtime.
    #[error("Runtime error: {0}")]
    Runtime(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Cooperative stop signal raised by a procedure that observed the stop flag.
///
/// Procedures usually produce it through [`crate::Context::check_stop`] and
/// propagate it with `?`. The worker recognises it anywhere in an
/// `anyhow::Error` chain and treats the run as aborted rather than failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("procedure cancelled: {reason}")]
pub struct Cancelled {
    pub reason: String,
}

impl Cancelled {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Failures on the best-effort telemetry path.
///
/// These are the only two kinds the worker swallows; neither affects the
/// run status or the other channels.
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("failed to serialize telemetry frame: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("no telemetry subscribers connected")]
    NoSubscribers,
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, LabrunError>;
