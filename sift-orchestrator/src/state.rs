//! Shared handler state

use sift_core::domain::ServiceConfig;
use std::sync::Arc;

use crate::config::CollectRetryPolicy;
use crate::gateway::{BuildQueue, NotificationSource};
use crate::repository::{
    IdempotencyRepository, RunProgressRepository, TaskQueue, WorkflowRepository,
};

/// Everything a request handler may touch
///
/// Cloned per request; all collaborators are behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub service_config: Arc<ServiceConfig>,
    pub idempotency: Arc<dyn IdempotencyRepository>,
    pub workflows: Arc<dyn WorkflowRepository>,
    pub progress: Arc<dyn RunProgressRepository>,
    pub tasks: Arc<dyn TaskQueue>,
    pub build_queue: Arc<dyn BuildQueue>,
    /// Unset when no pull subscription is configured
    pub notifications: Option<Arc<dyn NotificationSource>>,
    pub collect_retry: CollectRetryPolicy,
}
