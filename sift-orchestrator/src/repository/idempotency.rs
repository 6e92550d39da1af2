//! Idempotency repository
//!
//! Records which build notifications have already been processed so that
//! redelivered notifications do not schedule duplicate collects.

use anyhow::Result;
use async_trait::async_trait;
use sift_core::dto::pipeline::IdempotencyRecord;
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[async_trait]
pub trait IdempotencyRepository: Send + Sync {
    /// Looks up a record by its `{build_id}:{run_id}` key
    async fn find(&self, id: &str) -> Result<Option<IdempotencyRecord>>;

    /// Stores `record` unless a record with the same key exists
    ///
    /// Returns `true` when the record was created by this call and `false`
    /// when it was already present.
    async fn get_or_create(&self, record: &IdempotencyRecord) -> Result<bool>;
}

/// Postgres implementation of IdempotencyRepository
pub struct PgIdempotencyRepository {
    pool: PgPool,
}

impl PgIdempotencyRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl IdempotencyRepository for PgIdempotencyRepository {
    async fn find(&self, id: &str) -> Result<Option<IdempotencyRecord>> {
        let row = sqlx::query_as::<_, IdempotencyRow>(
            r#"
            SELECT id, run_id, worker_name
            FROM idempotency_records
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into()))
    }

    async fn get_or_create(&self, record: &IdempotencyRecord) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        let existing: Option<(String,)> =
            sqlx::query_as("SELECT id FROM idempotency_records WHERE id = $1")
                .bind(&record.id)
                .fetch_optional(&mut *tx)
                .await?;

        if existing.is_some() {
            tx.commit().await?;
            return Ok(false);
        }

        // A concurrent insert of the same key fails on the primary key here
        // and the whole notification is redelivered.
        sqlx::query(
            r#"
            INSERT INTO idempotency_records (id, run_id, worker_name)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(&record.id)
        .bind(record.run_id)
        .bind(&record.worker_name)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(true)
    }
}

#[derive(sqlx::FromRow)]
struct IdempotencyRow {
    id: String,
    run_id: i64,
    worker_name: String,
}

impl From<IdempotencyRow> for IdempotencyRecord {
    fn from(row: IdempotencyRow) -> Self {
        IdempotencyRecord {
            id: row.id,
            run_id: row.run_id,
            worker_name: row.worker_name,
        }
    }
}

/// In-memory implementation of IdempotencyRepository
#[derive(Clone, Default)]
pub struct InMemoryIdempotencyRepository {
    records: Arc<Mutex<HashMap<String, IdempotencyRecord>>>,
}

impl InMemoryIdempotencyRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl IdempotencyRepository for InMemoryIdempotencyRepository {
    async fn find(&self, id: &str) -> Result<Option<IdempotencyRecord>> {
        let records = self.records.lock().unwrap();
        Ok(records.get(id).cloned())
    }

    async fn get_or_create(&self, record: &IdempotencyRecord) -> Result<bool> {
        let mut records = self.records.lock().unwrap();
        if records.contains_key(&record.id) {
            return Ok(false);
        }
        records.insert(record.id.clone(), record.clone());
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_or_create_only_once() {
        let repo = InMemoryIdempotencyRepository::new();
        let record = IdempotencyRecord::new(8945, 12, "PyLint_UBUNTU");

        assert!(repo.get_or_create(&record).await.unwrap());
        assert!(!repo.get_or_create(&record).await.unwrap());

        let found = repo.find("8945:12").await.unwrap();
        assert_eq!(found, Some(record));
    }

    #[tokio::test]
    async fn test_find_missing() {
        let repo = InMemoryIdempotencyRepository::new();
        assert!(repo.find("1:1").await.unwrap().is_none());
    }
}
