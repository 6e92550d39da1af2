//! Workflow repository
//!
//! Stores the compiled workflow of each run so trigger and collect can
//! resolve workers by name.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sift_core::domain::Workflow;
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[async_trait]
pub trait WorkflowRepository: Send + Sync {
    /// Stores the workflow for a run
    ///
    /// Returns `false` without overwriting when the run already has one.
    async fn create(&self, run_id: i64, workflow: &Workflow) -> Result<bool>;

    async fn find(&self, run_id: i64) -> Result<Option<Workflow>>;
}

/// Postgres implementation of WorkflowRepository
pub struct PgWorkflowRepository {
    pool: PgPool,
}

impl PgWorkflowRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WorkflowRepository for PgWorkflowRepository {
    async fn create(&self, run_id: i64, workflow: &Workflow) -> Result<bool> {
        let value = serde_json::to_value(workflow).context("Failed to serialize workflow")?;

        let result = sqlx::query(
            r#"
            INSERT INTO workflows (run_id, workflow)
            VALUES ($1, $2)
            ON CONFLICT (run_id) DO NOTHING
            "#,
        )
        .bind(run_id)
        .bind(value)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn find(&self, run_id: i64) -> Result<Option<Workflow>> {
        let row: Option<(serde_json::Value,)> =
            sqlx::query_as("SELECT workflow FROM workflows WHERE run_id = $1")
                .bind(run_id)
                .fetch_optional(&self.pool)
                .await?;

        match row {
            Some((value,)) => {
                let workflow = serde_json::from_value(value)
                    .with_context(|| format!("Corrupt workflow stored for run {}", run_id))?;
                Ok(Some(workflow))
            }
            None => Ok(None),
        }
    }
}

/// In-memory implementation of WorkflowRepository
#[derive(Clone, Default)]
pub struct InMemoryWorkflowRepository {
    workflows: Arc<Mutex<HashMap<i64, Workflow>>>,
}

impl InMemoryWorkflowRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WorkflowRepository for InMemoryWorkflowRepository {
    async fn create(&self, run_id: i64, workflow: &Workflow) -> Result<bool> {
        let mut workflows = self.workflows.lock().unwrap();
        if workflows.contains_key(&run_id) {
            return Ok(false);
        }
        workflows.insert(run_id, workflow.clone());
        Ok(true)
    }

    async fn find(&self, run_id: i64) -> Result<Option<Workflow>> {
        let workflows = self.workflows.lock().unwrap();
        Ok(workflows.get(&run_id).cloned())
    }
}
