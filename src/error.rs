//! Error types for the picodock CLI.
//!
//! Uses thiserror for derive macros and provides user-actionable error messages.

use crate::exit_codes;
use thiserror::Error;

/// Main error type for picodock operations.
///
/// Each variant maps to a specific exit code. Lock-acquisition failure is
/// deliberately its own variant so callers can script against its status.
#[derive(Error, Debug)]
pub enum PicodockError {
    /// User provided invalid arguments or the environment is unusable.
    #[error("{0}")]
    UserError(String),

    /// Docker daemon check or container execution failed.
    #[error("Docker operation failed: {0}")]
    DockerError(String),

    /// The hardware lock could not be acquired.
    #[error("Lock acquisition failed: {0}")]
    LockError(String),
}

impl PicodockError {
    /// Returns the appropriate exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            PicodockError::UserError(_) => exit_codes::USER_ERROR,
            PicodockError::DockerError(_) => exit_codes::DOCKER_FAILURE,
            PicodockError::LockError(_) => exit_codes::LOCK_FAILURE,
        }
    }
}

/// Result type alias for picodock operations.
pub type Result<T> = std::result::Result<T, PicodockError>;
