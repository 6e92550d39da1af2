//! Compiler error types

use thiserror::Error;

/// Result type alias for compiler operations
pub type Result<T> = std::result::Result<T, CompileError>;

/// Errors that abort a workflow compilation
///
/// There is no partial workflow: any of these fails the whole compile.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    /// Bad catalog, override or selection input
    #[error("config error: {0}")]
    Config(String),

    /// A selection references a function, platform or impl that does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// The worker graph contains a cycle through the named worker
    #[error("cycle in workflow at worker {0}")]
    Cycle(String),

    /// The named worker cannot be reached from any entry worker
    #[error("worker {0} is not reachable from any entry worker")]
    UnreachableWorker(String),
}

impl CompileError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }
}
