//! Sift HTTP Client
//!
//! A type-safe HTTP client for the Sift orchestrator API, used by the CLI
//! and by anything else that launches or drives analysis runs.
//!
//! # Example
//!
//! ```no_run
//! use sift_client::OrchestratorClient;
//! use sift_core::domain::ProjectConfig;
//! use sift_core::dto::pipeline::LaunchRequest;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = OrchestratorClient::new("http://localhost:8080");
//!
//!     let launched = client
//!         .launch(&LaunchRequest {
//!             run_id: 12,
//!             project: ProjectConfig::from_json(r#"{"name": "playground"}"#)?,
//!             changed_paths: vec!["src/main.py".to_string()],
//!         })
//!         .await?;
//!
//!     println!("Triggered: {:?}", launched.triggered);
//!     Ok(())
//! }
//! ```

pub mod error;
mod notify;
mod pipeline;

// Re-export commonly used types
pub use error::{ClientError, Result};
pub use notify::PullOutcome;

use reqwest::Client;
use serde::de::DeserializeOwned;

/// HTTP client for the Sift orchestrator API
///
/// Endpoints are grouped into:
/// - Runs (launch, workflow lookup)
/// - Worker steps (trigger, collect)
/// - Notifications (push, pull)
#[derive(Debug, Clone)]
pub struct OrchestratorClient {
    /// Base URL of the orchestrator (e.g., "http://localhost:8080")
    base_url: String,
    client: Client,
}

impl OrchestratorClient {
    /// Create a new orchestrator client
    ///
    /// # Example
    /// ```
    /// use sift_client::OrchestratorClient;
    ///
    /// let client = OrchestratorClient::new("http://localhost:8080");
    /// ```
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Create a new orchestrator client with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Get the base URL of the orchestrator
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// GET /health
    pub async fn health(&self) -> Result<String> {
        let response = self.client.get(self.url("/health")).send().await?;
        let response = Self::check_status(response).await?;
        Ok(response.text().await?)
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Turn a non-success response into an API error
    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(
                status.as_u16(),
                error::extract_message(&error_text),
            ));
        }

        Ok(response)
    }

    /// Handle an API response and deserialize JSON
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        Self::check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }
}
