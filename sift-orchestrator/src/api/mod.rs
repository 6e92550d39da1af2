//! API Module
//!
//! HTTP API layer for the orchestrator.
//! Each submodule handles endpoints for a specific domain.

pub mod error;
pub mod health;
pub mod notify;
pub mod pipeline;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Create the main API router with all endpoints
///
/// The pull endpoint is only routed when `pull_enabled` is set.
pub fn create_router(state: AppState, pull_enabled: bool) -> Router {
    let mut router = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Pipeline endpoints
        .route("/pipeline/launch", post(pipeline::launch))
        .route("/pipeline/trigger", post(pipeline::trigger))
        .route("/pipeline/collect", post(pipeline::collect))
        .route("/pipeline/{run_id}/workflow", get(pipeline::get_workflow))
        // Notification endpoints
        .route("/notify/push", post(notify::push));

    if pull_enabled {
        router = router.route("/notify/pull", post(notify::pull));
    }

    router.with_state(state).layer(TraceLayer::new_for_http())
}
