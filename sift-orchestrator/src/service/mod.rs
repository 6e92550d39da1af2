//! Service Module
//!
//! Business logic layer for the orchestrator.
//! Services orchestrate between repositories and gateways and contain the
//! coordination logic.

pub mod error;
pub mod notification;
pub mod pipeline;

pub use error::{CoordinatorError, Result};

// Re-export for convenience
pub use notification as notification_service;
pub use pipeline as pipeline_service;
