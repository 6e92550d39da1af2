//! Run progress repository
//!
//! Tracks, per run, which workers have succeeded and which have already
//! been triggered. A worker fed by several predecessors is triggered once,
//! after the last of them succeeds.

use anyhow::Result;
use async_trait::async_trait;
use sqlx::PgPool;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

#[async_trait]
pub trait RunProgressRepository: Send + Sync {
    /// Marks `worker` as succeeded in `run_id`
    ///
    /// Recording the same worker twice is a no-op. Returns every worker of
    /// the run that has succeeded so far, `worker` included.
    async fn record_success(&self, run_id: i64, worker: &str) -> Result<HashSet<String>>;

    /// Claims the single trigger of `worker` in `run_id`
    ///
    /// Returns `true` for the first claim and `false` afterwards.
    async fn claim_trigger(&self, run_id: i64, worker: &str) -> Result<bool>;
}

/// Postgres implementation of RunProgressRepository
pub struct PgRunProgressRepository {
    pool: PgPool,
}

impl PgRunProgressRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RunProgressRepository for PgRunProgressRepository {
    async fn record_success(&self, run_id: i64, worker: &str) -> Result<HashSet<String>> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO run_completions (run_id, worker_name)
            VALUES ($1, $2)
            ON CONFLICT (run_id, worker_name) DO NOTHING
            "#,
        )
        .bind(run_id)
        .bind(worker)
        .execute(&mut *tx)
        .await?;

        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT worker_name FROM run_completions WHERE run_id = $1")
                .bind(run_id)
                .fetch_all(&mut *tx)
                .await?;

        tx.commit().await?;

        Ok(rows.into_iter().map(|(name,)| name).collect())
    }

    async fn claim_trigger(&self, run_id: i64, worker: &str) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO run_triggers (run_id, worker_name)
            VALUES ($1, $2)
            ON CONFLICT (run_id, worker_name) DO NOTHING
            "#,
        )
        .bind(run_id)
        .bind(worker)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}

/// In-memory implementation of RunProgressRepository
#[derive(Clone, Default)]
pub struct InMemoryRunProgressRepository {
    completed: Arc<Mutex<HashSet<(i64, String)>>>,
    triggered: Arc<Mutex<HashSet<(i64, String)>>>,
}

impl InMemoryRunProgressRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RunProgressRepository for InMemoryRunProgressRepository {
    async fn record_success(&self, run_id: i64, worker: &str) -> Result<HashSet<String>> {
        let mut completed = self.completed.lock().unwrap();
        completed.insert((run_id, worker.to_string()));
        Ok(completed
            .iter()
            .filter(|(run, _)| *run == run_id)
            .map(|(_, name)| name.clone())
            .collect())
    }

    async fn claim_trigger(&self, run_id: i64, worker: &str) -> Result<bool> {
        let mut triggered = self.triggered.lock().unwrap();
        Ok(triggered.insert((run_id, worker.to_string())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_record_success_is_scoped_to_run() {
        let repo = InMemoryRunProgressRepository::new();

        repo.record_success(12, "FileIsolator_UBUNTU").await.unwrap();
        repo.record_success(13, "FileIsolator_MAC").await.unwrap();
        let done = repo.record_success(12, "FileIsolator_UBUNTU").await.unwrap();

        assert_eq!(done.len(), 1);
        assert!(done.contains("FileIsolator_UBUNTU"));
    }

    #[tokio::test]
    async fn test_trigger_claimed_once_per_run() {
        let repo = InMemoryRunProgressRepository::new();

        assert!(repo.claim_trigger(12, "PyLint_UBUNTU").await.unwrap());
        assert!(!repo.claim_trigger(12, "PyLint_UBUNTU").await.unwrap());
        assert!(repo.claim_trigger(13, "PyLint_UBUNTU").await.unwrap());
    }
}
