//! Task dispatcher
//!
//! Periodically claims due tasks and delivers each one as an HTTP POST to
//! its handler path. A delivered task is completed; a failed one keeps its
//! lease and is claimed again once the lease runs out.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use std::sync::Arc;
use tokio::time::{self, Duration};
use tracing::{debug, error, info, warn};

use crate::repository::{Task, TaskQueue};

/// Sends a task to its handler
#[async_trait]
pub trait TaskDelivery: Send + Sync {
    async fn deliver(&self, task: &Task) -> Result<()>;
}

/// Delivers tasks by POSTing the payload to `{base_url}{handler_path}`
pub struct HttpTaskDelivery {
    client: Client,
    base_url: String,
}

impl HttpTaskDelivery {
    pub fn new(base_url: String) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl TaskDelivery for HttpTaskDelivery {
    async fn deliver(&self, task: &Task) -> Result<()> {
        let url = format!("{}{}", self.base_url, task.handler_path);

        let response = self
            .client
            .post(&url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(task.payload.clone())
            .send()
            .await
            .with_context(|| format!("Failed to deliver task {}", task.id))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Handler {} answered {} - {}", task.handler_path, status, body);
        }

        Ok(())
    }
}

/// Dispatcher that continuously delivers due tasks
pub struct TaskDispatcher {
    queue: Arc<dyn TaskQueue>,
    delivery: Arc<dyn TaskDelivery>,
    interval: Duration,
    batch: usize,
    lease: Duration,
}

impl TaskDispatcher {
    pub fn new(
        queue: Arc<dyn TaskQueue>,
        delivery: Arc<dyn TaskDelivery>,
        interval: Duration,
        batch: usize,
        lease: Duration,
    ) -> Self {
        Self {
            queue,
            delivery,
            interval,
            batch,
            lease,
        }
    }

    /// Starts the dispatch loop
    pub async fn run(&self) {
        info!("Starting task dispatcher (interval: {:?})", self.interval);

        let mut interval = time::interval(self.interval);

        loop {
            interval.tick().await;

            match self.dispatch_once().await {
                Ok(delivered) => {
                    if delivered > 0 {
                        debug!("Delivered {} task(s) this cycle", delivered);
                    }
                }
                Err(e) => {
                    error!("Error during dispatch cycle: {:#}", e);
                }
            }
        }
    }

    /// Performs a single dispatch cycle, returning how many tasks were delivered
    pub async fn dispatch_once(&self) -> Result<usize> {
        let tasks = self
            .queue
            .claim_due(Utc::now(), self.batch, self.lease)
            .await
            .context("Failed to claim due tasks")?;

        let mut handles = Vec::with_capacity(tasks.len());
        for task in tasks {
            let queue = Arc::clone(&self.queue);
            let delivery = Arc::clone(&self.delivery);
            handles.push(tokio::spawn(async move {
                Self::deliver_one(queue.as_ref(), delivery.as_ref(), &task).await
            }));
        }

        let mut delivered = 0;
        for handle in handles {
            match handle.await {
                Ok(true) => delivered += 1,
                Ok(false) => {}
                Err(e) => warn!("Delivery task panicked: {}", e),
            }
        }

        Ok(delivered)
    }

    async fn deliver_one(queue: &dyn TaskQueue, delivery: &dyn TaskDelivery, task: &Task) -> bool {
        if let Err(e) = delivery.deliver(task).await {
            warn!(
                "Delivery of task {} to {} failed, will retry after lease: {:#}",
                task.id, task.handler_path, e
            );
            return false;
        }

        if let Err(e) = queue.complete(task.id).await {
            // The handler already ran; it will run again after the lease.
            error!("Failed to complete task {}: {:#}", task.id, e);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::InMemoryTaskQueue;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingDelivery {
        delivered: Mutex<Vec<String>>,
        fail_path: Option<String>,
    }

    #[async_trait]
    impl TaskDelivery for RecordingDelivery {
        async fn deliver(&self, task: &Task) -> Result<()> {
            if self.fail_path.as_deref() == Some(task.handler_path.as_str()) {
                anyhow::bail!("handler unavailable");
            }
            self.delivered
                .lock()
                .unwrap()
                .push(task.handler_path.clone());
            Ok(())
        }
    }

    fn dispatcher(queue: Arc<InMemoryTaskQueue>, delivery: Arc<RecordingDelivery>) -> TaskDispatcher {
        TaskDispatcher::new(
            queue,
            delivery,
            Duration::from_millis(10),
            16,
            Duration::from_secs(60),
        )
    }

    #[tokio::test]
    async fn test_due_tasks_are_delivered_and_completed() {
        let queue = Arc::new(InMemoryTaskQueue::new());
        let delivery = Arc::new(RecordingDelivery::default());
        queue
            .enqueue("/pipeline/trigger", b"{}".to_vec(), Duration::ZERO)
            .await
            .unwrap();
        queue
            .enqueue("/pipeline/collect", b"{}".to_vec(), Duration::from_secs(600))
            .await
            .unwrap();

        let delivered = dispatcher(queue.clone(), delivery.clone())
            .dispatch_once()
            .await
            .unwrap();

        assert_eq!(delivered, 1);
        assert_eq!(*delivery.delivered.lock().unwrap(), vec!["/pipeline/trigger"]);

        let remaining = queue.pending();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].handler_path, "/pipeline/collect");
    }

    #[tokio::test]
    async fn test_failed_delivery_keeps_task() {
        let queue = Arc::new(InMemoryTaskQueue::new());
        let delivery = Arc::new(RecordingDelivery {
            fail_path: Some("/pipeline/trigger".to_string()),
            ..Default::default()
        });
        queue
            .enqueue("/pipeline/trigger", b"{}".to_vec(), Duration::ZERO)
            .await
            .unwrap();

        let dispatcher = dispatcher(queue.clone(), delivery);
        assert_eq!(dispatcher.dispatch_once().await.unwrap(), 0);
        assert_eq!(queue.pending().len(), 1);

        // Still leased: the next cycle does not pick it up again.
        assert_eq!(dispatcher.dispatch_once().await.unwrap(), 0);
    }
}
