use anyhow::Context;
use sift_core::domain::ServiceConfig;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub mod api;
pub mod config;
pub mod db;
pub mod gateway;
pub mod repository;
pub mod scheduler;
pub mod service;
pub mod state;

#[cfg(test)]
mod testing;

use config::Config;
use gateway::{HttpBuildQueue, HttpNotificationSource, NotificationSource};
use repository::{
    IdempotencyRepository, InMemoryIdempotencyRepository, InMemoryRunProgressRepository,
    InMemoryTaskQueue, InMemoryWorkflowRepository, PgIdempotencyRepository,
    PgRunProgressRepository, PgTaskQueue, PgWorkflowRepository, RunProgressRepository, TaskQueue,
    WorkflowRepository,
};
use scheduler::{HttpTaskDelivery, TaskDispatcher};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sift_orchestrator=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Sift Orchestrator...");

    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    let raw = std::fs::read_to_string(&config.service_config_path).with_context(|| {
        format!(
            "Failed to read service config {}",
            config.service_config_path
        )
    })?;
    let service_config = ServiceConfig::from_json(&raw).with_context(|| {
        format!(
            "Failed to parse service config {}",
            config.service_config_path
        )
    })?;

    tracing::info!(
        "Loaded service config with {} function(s) on {} platform(s)",
        service_config.functions.len(),
        service_config.platforms.len()
    );

    let (idempotency, workflows, progress, tasks) = create_repositories(&config).await?;

    let notifications = config.notification_pull_url.clone().map(|url| {
        tracing::info!("Pulling notifications from {}", url);
        Arc::new(HttpNotificationSource::new(url)) as Arc<dyn NotificationSource>
    });

    let state = AppState {
        service_config: Arc::new(service_config),
        idempotency,
        workflows,
        progress,
        tasks: tasks.clone(),
        build_queue: Arc::new(HttpBuildQueue::new(config.build_queue_url.clone())),
        notifications,
        collect_retry: config.collect_retry,
    };

    let dispatcher = TaskDispatcher::new(
        tasks,
        Arc::new(HttpTaskDelivery::new(config.public_url.clone())),
        config.dispatch_interval,
        config.dispatch_batch,
        config.task_lease,
    );
    tokio::spawn(async move { dispatcher.run().await });

    // Build router with all API endpoints
    let app = api::create_router(state, config.pull_enabled());

    tracing::info!("Listening on {}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_addr))?;

    axum::serve(listener, app)
        .await
        .context("Failed to start server")?;

    Ok(())
}

type Repositories = (
    Arc<dyn IdempotencyRepository>,
    Arc<dyn WorkflowRepository>,
    Arc<dyn RunProgressRepository>,
    Arc<dyn TaskQueue>,
);

/// Postgres-backed repositories when a database is configured, in-memory otherwise
async fn create_repositories(config: &Config) -> anyhow::Result<Repositories> {
    let Some(database_url) = &config.database_url else {
        tracing::warn!("DATABASE_URL not set, using in-memory storage (state is lost on restart)");
        return Ok((
            Arc::new(InMemoryIdempotencyRepository::new()),
            Arc::new(InMemoryWorkflowRepository::new()),
            Arc::new(InMemoryRunProgressRepository::new()),
            Arc::new(InMemoryTaskQueue::new()),
        ));
    };

    tracing::info!("Connecting to database...");

    let pool = db::create_pool(database_url)
        .await
        .context("Failed to create database pool")?;

    tracing::info!("Database connection pool created");

    db::run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;

    Ok((
        Arc::new(PgIdempotencyRepository::new(pool.clone())),
        Arc::new(PgWorkflowRepository::new(pool.clone())),
        Arc::new(PgRunProgressRepository::new(pool.clone())),
        Arc::new(PgTaskQueue::new(pool)),
    ))
}
