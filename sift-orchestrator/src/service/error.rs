//! Coordinator errors

use sift_core::CompileError;
use sift_core::dto::notification::DecodeError;
use std::fmt;

/// Service error type
#[derive(Debug)]
pub enum CoordinatorError {
    /// Malformed request or a request naming something that does not exist
    InvalidArgument(String),
    /// Malformed notification envelope or payload
    Decode(DecodeError),
    NotFound(String),
    Internal(anyhow::Error),
}

pub type Result<T> = std::result::Result<T, CoordinatorError>;

impl fmt::Display for CoordinatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoordinatorError::InvalidArgument(msg) => write!(f, "invalid argument: {}", msg),
            CoordinatorError::Decode(err) => write!(f, "decode error: {}", err),
            CoordinatorError::NotFound(msg) => write!(f, "not found: {}", msg),
            CoordinatorError::Internal(err) => write!(f, "internal error: {:#}", err),
        }
    }
}

impl From<anyhow::Error> for CoordinatorError {
    fn from(err: anyhow::Error) -> Self {
        CoordinatorError::Internal(err)
    }
}

impl From<DecodeError> for CoordinatorError {
    fn from(err: DecodeError) -> Self {
        CoordinatorError::Decode(err)
    }
}

// Compile failures are always caused by the submitted project.
impl From<CompileError> for CoordinatorError {
    fn from(err: CompileError) -> Self {
        CoordinatorError::InvalidArgument(format!("workflow compilation failed: {}", err))
    }
}
