//! Pipeline API Handlers
//!
//! HTTP endpoints for launching runs and for the trigger/collect steps the
//! task dispatcher delivers. Bodies are taken raw so malformed JSON is
//! reported through the same error path as every other invalid argument.

use axum::{
    Json,
    body::Bytes,
    extract::{Path, State},
};
use sift_core::domain::Workflow;
use sift_core::dto::pipeline::{CollectOutcome, LaunchResponse, TriggerResponse};

use crate::api::error::ApiResult;
use crate::service::pipeline_service;
use crate::state::AppState;

/// POST /pipeline/launch
/// Compile a project and start its run
pub async fn launch(State(state): State<AppState>, body: Bytes) -> ApiResult<Json<LaunchResponse>> {
    let launched = pipeline_service::launch(&state, &body).await?;
    Ok(Json(launched))
}

/// POST /pipeline/trigger
/// Schedule one worker's build
pub async fn trigger(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<Json<TriggerResponse>> {
    let triggered = pipeline_service::trigger(&state, &body).await?;
    Ok(Json(triggered))
}

/// POST /pipeline/collect
/// Check a build and advance the run
pub async fn collect(State(state): State<AppState>, body: Bytes) -> ApiResult<Json<CollectOutcome>> {
    let outcome = pipeline_service::collect(&state, &body).await?;
    Ok(Json(outcome))
}

/// GET /pipeline/{run_id}/workflow
/// Get the compiled workflow of a run
pub async fn get_workflow(
    State(state): State<AppState>,
    Path(run_id): Path<i64>,
) -> ApiResult<Json<Workflow>> {
    let workflow = pipeline_service::get_workflow(&state, run_id).await?;
    Ok(Json(workflow))
}
