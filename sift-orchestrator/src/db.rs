use sqlx::{PgPool, postgres::PgPoolOptions};
use std::time::Duration;

pub async fn create_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await
}

pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    // Notification dedup records, keyed by "{build_id}:{run_id}"
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS idempotency_records (
            id VARCHAR(255) PRIMARY KEY,
            run_id BIGINT NOT NULL,
            worker_name VARCHAR(255) NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Compiled workflows, one per run
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS workflows (
            run_id BIGINT PRIMARY KEY,
            workflow JSONB NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Workers that succeeded, per run
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS run_completions (
            run_id BIGINT NOT NULL,
            worker_name VARCHAR(255) NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            PRIMARY KEY (run_id, worker_name)
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Workers already triggered, per run
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS run_triggers (
            run_id BIGINT NOT NULL,
            worker_name VARCHAR(255) NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            PRIMARY KEY (run_id, worker_name)
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Deferred HTTP tasks
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS tasks (
            id UUID PRIMARY KEY,
            handler_path VARCHAR(255) NOT NULL,
            payload BYTEA NOT NULL,
            not_before TIMESTAMPTZ NOT NULL,
            leased_until TIMESTAMPTZ,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_tasks_not_before ON tasks(not_before)")
        .execute(pool)
        .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_idempotency_run_id ON idempotency_records(run_id)")
        .execute(pool)
        .await?;

    tracing::info!("Database migrations completed successfully");
    Ok(())
}
