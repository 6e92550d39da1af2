//! Data Transfer Objects for inter-service communication
//!
//! This module contains the requests exchanged between the orchestrator,
//! its task queue and the CLI, plus the envelopes the external build queue
//! uses to announce finished builds.

pub mod notification;
pub mod pipeline;
