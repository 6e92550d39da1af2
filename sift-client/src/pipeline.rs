//! Pipeline-related API endpoints

use crate::OrchestratorClient;
use crate::error::Result;
use sift_core::domain::Workflow;
use sift_core::dto::pipeline::{
    CollectOutcome, CollectRequest, LaunchRequest, LaunchResponse, TriggerRequest,
    TriggerResponse,
};

impl OrchestratorClient {
    // =============================================================================
    // Runs
    // =============================================================================

    /// Compile a project on the orchestrator and start the run
    ///
    /// Root workers are enqueued for triggering; the response lists them.
    pub async fn launch(&self, req: &LaunchRequest) -> Result<LaunchResponse> {
        let response = self
            .client
            .post(self.url("/pipeline/launch"))
            .json(req)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Get the compiled workflow of a run
    pub async fn get_workflow(&self, run_id: i64) -> Result<Workflow> {
        let url = self.url(&format!("/pipeline/{}/workflow", run_id));
        let response = self.client.get(&url).send().await?;

        self.handle_response(response).await
    }

    // =============================================================================
    // Worker Steps
    // =============================================================================

    /// Schedule a worker's build directly, bypassing the task queue
    pub async fn trigger(&self, req: &TriggerRequest) -> Result<TriggerResponse> {
        let response = self
            .client
            .post(self.url("/pipeline/trigger"))
            .json(req)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Collect a build directly, bypassing the task queue
    pub async fn collect(&self, req: &CollectRequest) -> Result<CollectOutcome> {
        let response = self
            .client
            .post(self.url("/pipeline/collect"))
            .json(req)
            .send()
            .await?;

        self.handle_response(response).await
    }
}
