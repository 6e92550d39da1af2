//! Pipeline DTOs

use serde::{Deserialize, Serialize};

use crate::domain::{ProjectConfig, Workflow};

/// Request to start one worker's external execution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerRequest {
    pub run_id: i64,
    pub worker_name: String,
}

/// Request to check and collect the result of a triggered worker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectRequest {
    pub run_id: i64,
    pub worker_name: String,
    pub build_id: i64,

    /// Number of collect attempts made before this one
    #[serde(default)]
    pub attempt: u32,
}

impl CollectRequest {
    pub fn new(run_id: i64, worker_name: impl Into<String>, build_id: i64) -> Self {
        Self {
            run_id,
            worker_name: worker_name.into(),
            build_id,
            attempt: 0,
        }
    }

    /// The same request, one attempt later
    pub fn retry(&self) -> Self {
        Self {
            attempt: self.attempt.saturating_add(1),
            ..self.clone()
        }
    }
}

/// Request to compile and start a run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaunchRequest {
    pub run_id: i64,
    pub project: ProjectConfig,

    #[serde(default)]
    pub changed_paths: Vec<String>,
}

/// Result of a launch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaunchResponse {
    pub run_id: i64,
    pub workflow: Workflow,

    /// Workers triggered immediately
    pub triggered: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerResponse {
    pub build_id: i64,
}

/// What a collect call found and did
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CollectOutcome {
    /// Build still running; collect re-enqueued as `attempt`
    Rescheduled { attempt: u32 },

    /// Build still running and no attempts remain
    RetriesExhausted,

    /// Build succeeded; these successors were enqueued
    Succeeded { triggered: Vec<String> },

    /// Build ended without success
    Failed { status: String },
}

/// Marker proving a build notification has already been processed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdempotencyRecord {
    /// `{build_id}:{run_id}`
    pub id: String,
    pub run_id: i64,
    pub worker_name: String,
}

impl IdempotencyRecord {
    pub fn new(build_id: i64, run_id: i64, worker_name: impl Into<String>) -> Self {
        Self {
            id: Self::key(build_id, run_id),
            run_id,
            worker_name: worker_name.into(),
        }
    }

    pub fn key(build_id: i64, run_id: i64) -> String {
        format!("{}:{}", build_id, run_id)
    }
}
