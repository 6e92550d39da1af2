//! Task queue
//!
//! Deferred HTTP tasks: a handler path, an opaque payload and the earliest
//! time the task may be delivered. Claiming a task leases it; a task that is
//! not completed before its lease runs out becomes due again, so delivery
//! is at least once.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;

/// A deferred request to one of the orchestrator's own handlers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub id: Uuid,
    pub handler_path: String,
    pub payload: Vec<u8>,
    pub not_before: DateTime<Utc>,
}

impl Task {
    /// Creates a task due `delay` after `now`
    pub fn new(
        handler_path: impl Into<String>,
        payload: Vec<u8>,
        delay: Duration,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        Ok(Self {
            id: Uuid::new_v4(),
            handler_path: handler_path.into(),
            payload,
            not_before: add_duration(now, delay)?,
        })
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.not_before <= now
    }
}

fn add_duration(now: DateTime<Utc>, delay: Duration) -> Result<DateTime<Utc>> {
    chrono::Duration::from_std(delay)
        .ok()
        .and_then(|d| now.checked_add_signed(d))
        .with_context(|| format!("Delay {:?} is out of range", delay))
}

#[async_trait]
pub trait TaskQueue: Send + Sync {
    /// Enqueues a task that becomes due after `delay`
    async fn enqueue(&self, handler_path: &str, payload: Vec<u8>, delay: Duration)
    -> Result<Task>;

    /// Leases up to `limit` tasks that are due at `now`
    ///
    /// Claimed tasks are hidden from further claims until `now + lease`.
    async fn claim_due(&self, now: DateTime<Utc>, limit: usize, lease: Duration)
    -> Result<Vec<Task>>;

    /// Removes a delivered task
    async fn complete(&self, id: Uuid) -> Result<()>;
}

/// Postgres implementation of TaskQueue
pub struct PgTaskQueue {
    pool: PgPool,
}

impl PgTaskQueue {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TaskQueue for PgTaskQueue {
    async fn enqueue(
        &self,
        handler_path: &str,
        payload: Vec<u8>,
        delay: Duration,
    ) -> Result<Task> {
        let task = Task::new(handler_path, payload, delay, Utc::now())?;

        sqlx::query(
            r#"
            INSERT INTO tasks (id, handler_path, payload, not_before)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(task.id)
        .bind(&task.handler_path)
        .bind(&task.payload)
        .bind(task.not_before)
        .execute(&self.pool)
        .await?;

        Ok(task)
    }

    async fn claim_due(
        &self,
        now: DateTime<Utc>,
        limit: usize,
        lease: Duration,
    ) -> Result<Vec<Task>> {
        let leased_until = add_duration(now, lease)?;

        let rows = sqlx::query_as::<_, TaskRow>(
            r#"
            UPDATE tasks SET leased_until = $2
            WHERE id IN (
                SELECT id FROM tasks
                WHERE not_before <= $1
                  AND (leased_until IS NULL OR leased_until <= $1)
                ORDER BY not_before
                LIMIT $3
                FOR UPDATE SKIP LOCKED
            )
            RETURNING id, handler_path, payload, not_before
            "#,
        )
        .bind(now)
        .bind(leased_until)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        let mut tasks: Vec<Task> = rows.into_iter().map(|r| r.into()).collect();
        tasks.sort_by_key(|t| t.not_before);
        Ok(tasks)
    }

    async fn complete(&self, id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[derive(sqlx::FromRow)]
struct TaskRow {
    id: Uuid,
    handler_path: String,
    payload: Vec<u8>,
    not_before: DateTime<Utc>,
}

impl From<TaskRow> for Task {
    fn from(row: TaskRow) -> Self {
        Task {
            id: row.id,
            handler_path: row.handler_path,
            payload: row.payload,
            not_before: row.not_before,
        }
    }
}

struct QueuedTask {
    task: Task,
    leased_until: Option<DateTime<Utc>>,
}

/// In-memory implementation of TaskQueue
#[derive(Clone, Default)]
pub struct InMemoryTaskQueue {
    tasks: Arc<Mutex<Vec<QueuedTask>>>,
}

impl InMemoryTaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every task not yet completed
    #[cfg(test)]
    pub fn pending(&self) -> Vec<Task> {
        let tasks = self.tasks.lock().unwrap();
        tasks.iter().map(|q| q.task.clone()).collect()
    }
}

#[async_trait]
impl TaskQueue for InMemoryTaskQueue {
    async fn enqueue(
        &self,
        handler_path: &str,
        payload: Vec<u8>,
        delay: Duration,
    ) -> Result<Task> {
        let task = Task::new(handler_path, payload, delay, Utc::now())?;
        let mut tasks = self.tasks.lock().unwrap();
        tasks.push(QueuedTask {
            task: task.clone(),
            leased_until: None,
        });
        Ok(task)
    }

    async fn claim_due(
        &self,
        now: DateTime<Utc>,
        limit: usize,
        lease: Duration,
    ) -> Result<Vec<Task>> {
        let leased_until = add_duration(now, lease)?;
        let mut tasks = self.tasks.lock().unwrap();

        tasks.sort_by_key(|q| q.task.not_before);

        let claimed = tasks
            .iter_mut()
            .filter(|q| q.task.is_due(now) && q.leased_until.is_none_or(|l| l <= now))
            .take(limit)
            .map(|q| {
                q.leased_until = Some(leased_until);
                q.task.clone()
            })
            .collect();

        Ok(claimed)
    }

    async fn complete(&self, id: Uuid) -> Result<()> {
        let mut tasks = self.tasks.lock().unwrap();
        tasks.retain(|q| q.task.id != id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_not_before_is_now_plus_delay() {
        let now = Utc::now();
        let task = Task::new("/pipeline/collect", vec![], Duration::from_secs(60), now).unwrap();

        assert_eq!(task.not_before, now + chrono::Duration::seconds(60));
        assert!(!task.is_due(now));
        assert!(task.is_due(now + chrono::Duration::seconds(60)));
    }

    #[tokio::test]
    async fn test_delayed_task_is_not_claimed_early() {
        let queue = InMemoryTaskQueue::new();
        let task = queue
            .enqueue("/pipeline/collect", b"{}".to_vec(), Duration::from_secs(30))
            .await
            .unwrap();

        let lease = Duration::from_secs(10);
        let early = queue.claim_due(Utc::now(), 10, lease).await.unwrap();
        assert!(early.is_empty());

        let due = queue.claim_due(task.not_before, 10, lease).await.unwrap();
        assert_eq!(due, vec![task]);
    }

    #[tokio::test]
    async fn test_claimed_task_is_redelivered_after_lease() {
        let queue = InMemoryTaskQueue::new();
        queue
            .enqueue("/pipeline/trigger", vec![1], Duration::ZERO)
            .await
            .unwrap();

        let now = Utc::now();
        let lease = Duration::from_secs(60);

        assert_eq!(queue.claim_due(now, 10, lease).await.unwrap().len(), 1);
        assert!(queue.claim_due(now, 10, lease).await.unwrap().is_empty());

        let later = now + chrono::Duration::seconds(61);
        assert_eq!(queue.claim_due(later, 10, lease).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_complete_removes_task() {
        let queue = InMemoryTaskQueue::new();
        let task = queue
            .enqueue("/pipeline/trigger", vec![], Duration::ZERO)
            .await
            .unwrap();

        queue.complete(task.id).await.unwrap();
        assert!(queue.pending().is_empty());

        let claimed = queue
            .claim_due(Utc::now(), 10, Duration::from_secs(60))
            .await
            .unwrap();
        assert!(claimed.is_empty());
    }

    #[tokio::test]
    async fn test_claim_respects_limit_and_order() {
        let queue = InMemoryTaskQueue::new();
        queue
            .enqueue("/b", vec![], Duration::from_millis(5))
            .await
            .unwrap();
        queue.enqueue("/a", vec![], Duration::ZERO).await.unwrap();

        let later = Utc::now() + chrono::Duration::seconds(1);
        let claimed = queue
            .claim_due(later, 1, Duration::from_secs(60))
            .await
            .unwrap();

        assert_eq!(claimed.len(), 1);
        assert_eq!(claimed[0].handler_path, "/a");
    }
}
