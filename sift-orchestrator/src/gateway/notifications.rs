//! Notification pull gateway
//!
//! Pulls build notifications from a subscription instead of waiting for
//! pushes. Only used in development.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use sift_core::dto::notification::PubsubMessage;

/// A pulled message and the id needed to acknowledge it
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceivedMessage {
    pub ack_id: String,
    pub message: PubsubMessage,
}

#[async_trait]
pub trait NotificationSource: Send + Sync {
    /// Pulls at most one pending message
    async fn pull(&self) -> Result<Option<ReceivedMessage>>;

    /// Acknowledges a handled message so it is not redelivered
    async fn ack(&self, ack_id: &str) -> Result<()>;
}

/// HTTP implementation of NotificationSource
///
/// Speaks the `{subscription}:pull` / `{subscription}:acknowledge` protocol.
pub struct HttpNotificationSource {
    client: Client,
    subscription_url: String,
}

impl HttpNotificationSource {
    pub fn new(subscription_url: String) -> Self {
        Self {
            client: Client::new(),
            subscription_url,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PullRequest {
    max_messages: u32,
    return_immediately: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PullResponse {
    #[serde(default)]
    received_messages: Vec<ReceivedMessage>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AcknowledgeRequest<'a> {
    ack_ids: Vec<&'a str>,
}

#[async_trait]
impl NotificationSource for HttpNotificationSource {
    async fn pull(&self) -> Result<Option<ReceivedMessage>> {
        let url = format!("{}:pull", self.subscription_url);

        let response = self
            .client
            .post(&url)
            .json(&PullRequest {
                max_messages: 1,
                return_immediately: true,
            })
            .send()
            .await
            .context("Failed to pull notifications")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Failed to pull notifications: {} - {}", status, body);
        }

        let pulled = response
            .json::<PullResponse>()
            .await
            .context("Failed to parse pull response")?;

        Ok(pulled.received_messages.into_iter().next())
    }

    async fn ack(&self, ack_id: &str) -> Result<()> {
        let url = format!("{}:acknowledge", self.subscription_url);

        let response = self
            .client
            .post(&url)
            .json(&AcknowledgeRequest {
                ack_ids: vec![ack_id],
            })
            .send()
            .await
            .context("Failed to acknowledge notification")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Failed to acknowledge notification: {} - {}", status, body);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pull_response() {
        let json = r#"{
            "receivedMessages": [
                {"ackId": "ack-1", "message": {"data": "e30=", "messageId": "m-1"}}
            ]
        }"#;
        let pulled: PullResponse = serde_json::from_str(json).unwrap();
        assert_eq!(pulled.received_messages.len(), 1);
        assert_eq!(pulled.received_messages[0].ack_id, "ack-1");
        assert_eq!(pulled.received_messages[0].message.message_id, "m-1");

        let empty: PullResponse = serde_json::from_str("{}").unwrap();
        assert!(empty.received_messages.is_empty());
    }
}
