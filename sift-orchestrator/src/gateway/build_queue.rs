//! Build queue gateway
//!
//! Schedules worker builds on the external build queue and reports their
//! status:
//! - `POST {base}/builds` with a [`ScheduleBuild`] returns `{"id": <build id>}`
//! - `GET {base}/builds/{id}` returns `{"id": .., "status": <BuildStatus>}`

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use sift_core::domain::{CipdPackage, Worker};

/// Lifecycle status of an external build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BuildStatus {
    Scheduled,
    Started,
    Success,
    Failure,
    InfraFailure,
    Canceled,
}

impl BuildStatus {
    /// Whether the build has not finished yet
    pub fn is_pending(&self) -> bool {
        matches!(self, BuildStatus::Scheduled | BuildStatus::Started)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BuildStatus::Scheduled => "SCHEDULED",
            BuildStatus::Started => "STARTED",
            BuildStatus::Success => "SUCCESS",
            BuildStatus::Failure => "FAILURE",
            BuildStatus::InfraFailure => "INFRA_FAILURE",
            BuildStatus::Canceled => "CANCELED",
        }
    }
}

/// Everything the build queue needs to run one worker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleBuild {
    pub worker_name: String,
    pub exec: String,
    pub args: Vec<String>,
    pub dimensions: Vec<String>,
    pub cipd_packages: Vec<CipdPackage>,
    /// Seconds
    pub deadline: u32,
    /// Base64 JSON echoed back in the completion notification
    pub user_data: String,
}

impl ScheduleBuild {
    pub fn for_worker(worker: &Worker, user_data: String) -> Self {
        Self {
            worker_name: worker.name.clone(),
            exec: worker.cmd.exec.clone(),
            args: worker.cmd.args.clone(),
            dimensions: worker.dimensions.clone(),
            cipd_packages: worker.cipd_packages.clone(),
            deadline: worker.deadline,
            user_data,
        }
    }
}

#[async_trait]
pub trait BuildQueue: Send + Sync {
    /// Schedules a build and returns its id
    async fn schedule(&self, build: &ScheduleBuild) -> Result<i64>;

    /// Fetches the current status of a build
    async fn status(&self, build_id: i64) -> Result<BuildStatus>;
}

/// HTTP implementation of BuildQueue
pub struct HttpBuildQueue {
    client: Client,
    base_url: String,
}

impl HttpBuildQueue {
    /// Creates a new HTTP build queue client
    ///
    /// # Arguments
    /// * `base_url` - Base URL of the build queue (e.g., "http://localhost:8090")
    pub fn new(base_url: String) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ScheduledBuild {
    id: i64,
}

#[derive(Debug, Deserialize)]
struct BuildInfo {
    status: BuildStatus,
}

#[async_trait]
impl BuildQueue for HttpBuildQueue {
    async fn schedule(&self, build: &ScheduleBuild) -> Result<i64> {
        let url = format!("{}/builds", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(build)
            .send()
            .await
            .context("Failed to schedule build")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Failed to schedule build: {} - {}", status, body);
        }

        let scheduled = response
            .json::<ScheduledBuild>()
            .await
            .context("Failed to parse scheduled build")?;

        Ok(scheduled.id)
    }

    async fn status(&self, build_id: i64) -> Result<BuildStatus> {
        let url = format!("{}/builds/{}", self.base_url, build_id);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to fetch build")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Failed to fetch build {}: {} - {}", build_id, status, body);
        }

        let info = response
            .json::<BuildInfo>()
            .await
            .context("Failed to parse build info")?;

        Ok(info.status)
    }
}
