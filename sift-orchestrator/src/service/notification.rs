//! Notification Service
//!
//! Turns build-finished notifications into collect requests, exactly once
//! per `(build, run)` pair. The notification channel delivers at least
//! once, so duplicates are routine.

use sift_core::dto::notification::{PubsubMessage, PushRequest};
use sift_core::dto::pipeline::{CollectRequest, IdempotencyRecord};
use std::time::Duration;

use crate::service::pipeline::{enqueue_collect_request, parse_request};
use crate::service::{CoordinatorError, Result};
use crate::state::AppState;

/// What handling a notification did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationOutcome {
    /// A collect request was enqueued
    Scheduled(CollectRequest),
    /// The notification was seen before; nothing was done
    Duplicate,
}

/// Decode a notification and schedule the collect for its build
///
/// The idempotency record is written before the collect is enqueued: a
/// crash in between loses a collect but can never produce two.
pub async fn handle_notification(
    state: &AppState,
    message: &PubsubMessage,
) -> Result<NotificationOutcome> {
    let notification = message.decode()?;
    let build_id = notification.build_id;
    let request = notification.request;

    let record = IdempotencyRecord::new(build_id, request.run_id, &request.worker_name);

    if state.idempotency.find(&record.id).await?.is_some() {
        tracing::info!("Notification for {} already handled, skipping", record.id);
        return Ok(NotificationOutcome::Duplicate);
    }

    // Two concurrent deliveries can both miss the lookup above; the
    // transactional insert lets only one of them through.
    if !state.idempotency.get_or_create(&record).await? {
        tracing::info!("Notification for {} handled concurrently, skipping", record.id);
        return Ok(NotificationOutcome::Duplicate);
    }

    let collect = CollectRequest::new(request.run_id, request.worker_name, build_id);
    enqueue_collect_request(state.tasks.as_ref(), &collect, Duration::ZERO).await?;

    tracing::info!(
        "Build {} finished for worker {} (run {}), collect enqueued",
        build_id,
        collect.worker_name,
        collect.run_id
    );

    Ok(NotificationOutcome::Scheduled(collect))
}

/// Handle a push delivery body `{"message": ...}`
pub async fn handle_push(state: &AppState, body: &[u8]) -> Result<NotificationOutcome> {
    let push: PushRequest = parse_request(body)?;
    handle_notification(state, &push.message).await
}

/// Pull one pending notification and handle it
///
/// Returns `None` when nothing is pending or no pull source is configured.
/// The message is acknowledged only after it was handled.
pub async fn pull_once(state: &AppState) -> Result<Option<NotificationOutcome>> {
    let Some(source) = state.notifications.as_ref() else {
        tracing::debug!("No notification source configured, nothing to pull");
        return Ok(None);
    };

    let Some(received) = source.pull().await? else {
        return Ok(None);
    };

    let outcome = handle_notification(state, &received.message).await?;
    source
        .ack(&received.ack_id)
        .await
        .map_err(CoordinatorError::Internal)?;

    Ok(Some(outcome))
}
