//! Pipeline Service
//!
//! Launches runs, triggers workers on the build queue and collects their
//! results. Trigger and collect are only ever reached through the task
//! queue or a direct HTTP call, so every step is one short, synchronous
//! call to the build queue; nothing here waits for a build to finish.

use serde::de::DeserializeOwned;
use serde::Serialize;
use sift_core::domain::{Worker, Workflow};
use sift_core::dto::notification::encode_user_data;
use sift_core::dto::pipeline::{
    CollectOutcome, CollectRequest, LaunchRequest, LaunchResponse, TriggerRequest,
    TriggerResponse,
};
use std::time::Duration;

use crate::gateway::{BuildStatus, ScheduleBuild};
use crate::repository::TaskQueue;
use crate::service::{CoordinatorError, Result};
use crate::state::AppState;

/// Handler path of the trigger endpoint
pub const TRIGGER_PATH: &str = "/pipeline/trigger";

/// Handler path of the collect endpoint
pub const COLLECT_PATH: &str = "/pipeline/collect";

/// Deserializes a request body, rejecting malformed input as an invalid argument
pub fn parse_request<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
    serde_json::from_slice(body)
        .map_err(|e| CoordinatorError::InvalidArgument(format!("malformed request: {}", e)))
}

/// Compile a project, store the workflow and enqueue its root workers
pub async fn launch(state: &AppState, body: &[u8]) -> Result<LaunchResponse> {
    let req: LaunchRequest = parse_request(body)?;

    let workflow = sift_core::generate(&state.service_config, &req.project, &req.changed_paths)?;

    if !state.workflows.create(req.run_id, &workflow).await? {
        return Err(CoordinatorError::InvalidArgument(format!(
            "run {} was already launched",
            req.run_id
        )));
    }

    let mut triggered = Vec::new();
    for root in workflow.root_workers() {
        if !state.progress.claim_trigger(req.run_id, &root.name).await? {
            continue;
        }
        let trigger = TriggerRequest {
            run_id: req.run_id,
            worker_name: root.name.clone(),
        };
        enqueue_trigger_request(state.tasks.as_ref(), &trigger, Duration::ZERO).await?;
        triggered.push(root.name.clone());
    }

    tracing::info!(
        "Run {} launched with {} worker(s), {} triggered",
        req.run_id,
        workflow.len(),
        triggered.len()
    );

    Ok(LaunchResponse {
        run_id: req.run_id,
        workflow,
        triggered,
    })
}

/// Schedule one worker's build on the build queue
pub async fn trigger(state: &AppState, body: &[u8]) -> Result<TriggerResponse> {
    let req: TriggerRequest = parse_request(body)?;

    let workflow = load_workflow(state, req.run_id).await?;
    let worker = find_worker(&workflow, req.run_id, &req.worker_name)?;

    let user_data = encode_user_data(&req)
        .map_err(|e| CoordinatorError::Internal(anyhow::anyhow!("encoding user data: {}", e)))?;
    let build = ScheduleBuild::for_worker(worker, user_data);

    let build_id = state.build_queue.schedule(&build).await?;

    tracing::info!(
        "Triggered worker {} for run {} as build {}",
        req.worker_name,
        req.run_id,
        build_id
    );

    Ok(TriggerResponse { build_id })
}

/// Check a triggered build and advance the run
///
/// A running build is re-collected later under the retry policy; a
/// successful one triggers each successor whose predecessors have all
/// succeeded. A successor is triggered at most once per run, however many
/// predecessors or redelivered collects reach it.
pub async fn collect(state: &AppState, body: &[u8]) -> Result<CollectOutcome> {
    let req: CollectRequest = parse_request(body)?;

    let status = state.build_queue.status(req.build_id).await?;

    tracing::debug!(
        "Build {} for worker {} (run {}) is {}",
        req.build_id,
        req.worker_name,
        req.run_id,
        status.as_str()
    );

    if status.is_pending() {
        let policy = state.collect_retry;
        if !policy.allows_retry(req.attempt) {
            tracing::warn!(
                "Giving up on build {} for worker {} (run {}) after {} attempt(s)",
                req.build_id,
                req.worker_name,
                req.run_id,
                req.attempt.saturating_add(1)
            );
            return Ok(CollectOutcome::RetriesExhausted);
        }

        let retry = req.retry();
        enqueue_collect_request(state.tasks.as_ref(), &retry, policy.delay).await?;
        return Ok(CollectOutcome::Rescheduled {
            attempt: retry.attempt,
        });
    }

    if status != BuildStatus::Success {
        tracing::info!(
            "Build {} for worker {} (run {}) ended with {}",
            req.build_id,
            req.worker_name,
            req.run_id,
            status.as_str()
        );
        return Ok(CollectOutcome::Failed {
            status: status.as_str().to_string(),
        });
    }

    let workflow = load_workflow(state, req.run_id).await?;
    let worker = find_worker(&workflow, req.run_id, &req.worker_name)?;

    let completed = state
        .progress
        .record_success(req.run_id, &worker.name)
        .await?;

    let mut triggered = Vec::new();
    for next in &worker.next {
        let waiting_on: Vec<&str> = workflow
            .predecessors(next)
            .into_iter()
            .map(|p| p.name.as_str())
            .filter(|name| !completed.contains(*name))
            .collect();
        if !waiting_on.is_empty() {
            tracing::debug!(
                "Worker {} (run {}) still waits on {:?}",
                next,
                req.run_id,
                waiting_on
            );
            continue;
        }

        if !state.progress.claim_trigger(req.run_id, next).await? {
            tracing::debug!("Worker {} (run {}) already triggered", next, req.run_id);
            continue;
        }

        let trigger = TriggerRequest {
            run_id: req.run_id,
            worker_name: next.clone(),
        };
        enqueue_trigger_request(state.tasks.as_ref(), &trigger, Duration::ZERO).await?;
        triggered.push(next.clone());
    }

    tracing::info!(
        "Worker {} (run {}) succeeded, triggered {:?}",
        req.worker_name,
        req.run_id,
        triggered
    );

    Ok(CollectOutcome::Succeeded { triggered })
}

/// Get the stored workflow of a run
pub async fn get_workflow(state: &AppState, run_id: i64) -> Result<Workflow> {
    state
        .workflows
        .find(run_id)
        .await?
        .ok_or_else(|| CoordinatorError::NotFound(format!("run {}", run_id)))
}

/// Enqueue a trigger for a worker, due after `delay`
pub async fn enqueue_trigger_request(
    tasks: &dyn TaskQueue,
    req: &TriggerRequest,
    delay: Duration,
) -> Result<()> {
    enqueue_json(tasks, TRIGGER_PATH, req, delay).await
}

/// Enqueue a collect for a build, due after `delay`
pub async fn enqueue_collect_request(
    tasks: &dyn TaskQueue,
    req: &CollectRequest,
    delay: Duration,
) -> Result<()> {
    enqueue_json(tasks, COLLECT_PATH, req, delay).await
}

async fn enqueue_json<T: Serialize>(
    tasks: &dyn TaskQueue,
    handler_path: &str,
    body: &T,
    delay: Duration,
) -> Result<()> {
    let payload = serde_json::to_vec(body)
        .map_err(|e| CoordinatorError::Internal(anyhow::anyhow!("encoding task: {}", e)))?;
    tasks.enqueue(handler_path, payload, delay).await?;
    Ok(())
}

async fn load_workflow(state: &AppState, run_id: i64) -> Result<Workflow> {
    state
        .workflows
        .find(run_id)
        .await?
        .ok_or_else(|| CoordinatorError::InvalidArgument(format!("unknown run {}", run_id)))
}

fn find_worker<'a>(workflow: &'a Workflow, run_id: i64, name: &str) -> Result<&'a Worker> {
    workflow.worker(name).ok_or_else(|| {
        CoordinatorError::InvalidArgument(format!("unknown worker {} in run {}", name, run_id))
    })
}
