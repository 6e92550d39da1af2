//! Notification endpoints

use crate::OrchestratorClient;
use crate::error::Result;
use reqwest::StatusCode;
use sift_core::dto::notification::{PubsubMessage, PushRequest};

/// Result of asking the orchestrator to pull a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullOutcome {
    Handled,
    NothingPending,
}

impl OrchestratorClient {
    /// Deliver a build notification as the notification channel would
    pub async fn push_notification(&self, message: PubsubMessage) -> Result<()> {
        let body = PushRequest {
            message,
            subscription: String::new(),
        };
        let response = self
            .client
            .post(self.url("/notify/push"))
            .json(&body)
            .send()
            .await?;

        Self::check_status(response).await?;
        Ok(())
    }

    /// Make the orchestrator pull and handle one pending notification
    ///
    /// Only available on orchestrators not running in production.
    pub async fn pull_notification(&self) -> Result<PullOutcome> {
        let response = self.client.post(self.url("/notify/pull")).send().await?;
        let response = Self::check_status(response).await?;

        if response.status() == StatusCode::NO_CONTENT {
            tracing::debug!("No notification pending");
            Ok(PullOutcome::NothingPending)
        } else {
            Ok(PullOutcome::Handled)
        }
    }
}
