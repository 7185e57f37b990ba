use std::io;
use thiserror::Error;

/// Typed failures returned by the registry and the directory.
///
/// None of these are fatal. The caller decides how to present them.
#[derive(Error, Debug)]
pub enum ControllerError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Timed out: {0}")]
    Timeout(String),
    #[error("Replica transfer failed: {0}")]
    Io(#[from] io::Error),
}

impl ControllerError {
    /// Only timeouts are worth retrying. The core never retries on its own.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ControllerError::Timeout(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ControllerError::NotFound(_))
    }

    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, ControllerError::InvalidArgument(_))
    }
}

pub type ControllerResult<T> = Result<T, ControllerError>;
