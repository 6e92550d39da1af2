//! Notification API Handlers
//!
//! Inbound build notifications, pushed by the channel or pulled on demand.

use axum::{body::Bytes, extract::State, http::StatusCode};

use crate::api::error::ApiResult;
use crate::service::notification_service;
use crate::state::AppState;

/// POST /notify/push
/// Handle a pushed notification; any error makes the channel redeliver
pub async fn push(State(state): State<AppState>, body: Bytes) -> ApiResult<StatusCode> {
    notification_service::handle_push(&state, &body).await?;
    Ok(StatusCode::OK)
}

/// POST /notify/pull
/// Pull and handle one pending notification
pub async fn pull(State(state): State<AppState>) -> ApiResult<StatusCode> {
    match notification_service::pull_once(&state).await? {
        Some(_) => Ok(StatusCode::OK),
        None => Ok(StatusCode::NO_CONTENT),
    }
}
