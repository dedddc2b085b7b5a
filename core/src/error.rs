//! Error types for the agentd-core library.

use thiserror::Error;

/// Result type alias for agentd operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors from configuration handling.
///
/// Launch and signal failures never surface here: the supervisor folds them
/// into its `error:<msg>` status strings.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors that can occur while spawning the worker.
#[derive(Debug, Error)]
pub enum LaunchError {
    /// The program could not be found.
    #[error("{0}: command not found")]
    NotFound(String),

    /// The program exists but may not be executed.
    #[error("{0}: permission denied")]
    PermissionDenied(String),

    /// The spawn call failed for another reason.
    #[error("spawn failed: {0}")]
    Spawn(String),
}

impl LaunchError {
    /// Classify a spawn error for `program`.
    pub fn from_io(program: &str, err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(program.to_string()),
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(program.to_string()),
            _ => Self::Spawn(format!("{}: {}", program, err)),
        }
    }
}

/// Errors that can occur while signalling or waiting on a process.
#[derive(Debug, Error)]
pub enum SignalError {
    /// The specified process was not found
    #[error("Process with PID {0} not found")]
    ProcessNotFound(u32),

    /// The process group of the specified process could not be resolved
    #[error("Process group of PID {0} not found")]
    GroupNotFound(u32),

    /// Permission denied to signal the process
    #[error("Permission denied to signal process {0}")]
    PermissionDenied(u32),

    /// Failed to execute a helper command or OS call
    #[error("Failed to execute kill command: {0}")]
    CommandFailed(String),

    /// An I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SignalError {
    /// True when the failure means the target has already gone away.
    pub fn is_gone(&self) -> bool {
        matches!(self, Self::ProcessNotFound(_) | Self::GroupNotFound(_))
    }
}
