//! Test fixtures: in-memory state and fake gateways

use anyhow::Result;
use async_trait::async_trait;
use sift_core::domain::ServiceConfig;
use sift_core::dto::notification::PubsubMessage;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::config::CollectRetryPolicy;
use crate::gateway::{BuildQueue, BuildStatus, NotificationSource, ReceivedMessage, ScheduleBuild};
use crate::repository::{
    InMemoryIdempotencyRepository, InMemoryRunProgressRepository, InMemoryTaskQueue,
    InMemoryWorkflowRepository,
};
use crate::state::AppState;

pub const SERVICE_CONFIG: &str = r#"{
    "platforms": [
        {"name": "UBUNTU", "dimensions": ["os:UBUNTU"], "has_runtime": true},
        {"name": "MAC", "dimensions": ["os:MAC"], "has_runtime": true}
    ],
    "data_details": [
        {"type": "GIT_FILE_DETAILS", "is_platform_specific": false},
        {"type": "FILES", "is_platform_specific": false},
        {"type": "RESULTS", "is_platform_specific": true}
    ],
    "functions": [
        {
            "name": "FileIsolator",
            "type": "ISOLATOR",
            "needs": "GIT_FILE_DETAILS",
            "provides": "FILES",
            "impls": [
                {
                    "runtime_platform": "UBUNTU",
                    "provides_for_platform": "UBUNTU",
                    "deadline": 900,
                    "cmd": {"exec": "isolator", "args": ["--all"]}
                },
                {
                    "runtime_platform": "MAC",
                    "provides_for_platform": "MAC",
                    "deadline": 900,
                    "cmd": {"exec": "isolator", "args": ["--all"]}
                }
            ]
        },
        {
            "name": "PyLint",
            "type": "ANALYZER",
            "needs": "FILES",
            "provides": "RESULTS",
            "impls": [{
                "runtime_platform": "UBUNTU",
                "provides_for_platform": "UBUNTU",
                "deadline": 300,
                "cmd": {"exec": "pylint", "args": []}
            }]
        }
    ]
}"#;

pub fn service_config() -> ServiceConfig {
    ServiceConfig::from_json(SERVICE_CONFIG).unwrap()
}

/// Body of a launch selecting both catalog functions on UBUNTU
pub fn launch_body(run_id: i64) -> Vec<u8> {
    serde_json::to_vec(&serde_json::json!({
        "run_id": run_id,
        "project": {
            "name": "playground",
            "selections": [
                {"function": "FileIsolator", "platform": "UBUNTU"},
                {"function": "PyLint", "platform": "UBUNTU"}
            ]
        },
        "changed_paths": ["src/main.py"]
    }))
    .unwrap()
}

/// Body of a launch where both FileIsolator workers feed PyLint_UBUNTU
pub fn join_launch_body(run_id: i64) -> Vec<u8> {
    serde_json::to_vec(&serde_json::json!({
        "run_id": run_id,
        "project": {
            "name": "playground",
            "selections": [
                {"function": "FileIsolator", "platform": "UBUNTU"},
                {"function": "FileIsolator", "platform": "MAC"},
                {"function": "PyLint", "platform": "UBUNTU"}
            ]
        },
        "changed_paths": ["src/main.py"]
    }))
    .unwrap()
}

/// Build queue that records scheduled builds and reports canned statuses
#[derive(Default)]
pub struct FakeBuildQueue {
    scheduled: Mutex<Vec<ScheduleBuild>>,
    statuses: Mutex<HashMap<i64, BuildStatus>>,
    next_id: AtomicI64,
    failing: AtomicBool,
}

impl FakeBuildQueue {
    pub fn new() -> Self {
        Self {
            next_id: AtomicI64::new(1000),
            ..Default::default()
        }
    }

    pub fn scheduled(&self) -> Vec<ScheduleBuild> {
        self.scheduled.lock().unwrap().clone()
    }

    pub fn set_status(&self, build_id: i64, status: BuildStatus) {
        self.statuses.lock().unwrap().insert(build_id, status);
    }

    pub fn fail_schedule(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl BuildQueue for FakeBuildQueue {
    async fn schedule(&self, build: &ScheduleBuild) -> Result<i64> {
        if self.failing.load(Ordering::SeqCst) {
            anyhow::bail!("build queue unavailable");
        }
        self.scheduled.lock().unwrap().push(build.clone());
        Ok(self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    async fn status(&self, build_id: i64) -> Result<BuildStatus> {
        self.statuses
            .lock()
            .unwrap()
            .get(&build_id)
            .copied()
            .ok_or_else(|| anyhow::anyhow!("unknown build {}", build_id))
    }
}

/// Notification source backed by a local queue
#[derive(Default)]
pub struct FakeNotificationSource {
    pending: Mutex<VecDeque<ReceivedMessage>>,
    acked: Mutex<Vec<String>>,
}

impl FakeNotificationSource {
    pub fn push(&self, ack_id: &str, message: PubsubMessage) {
        self.pending.lock().unwrap().push_back(ReceivedMessage {
            ack_id: ack_id.to_string(),
            message,
        });
    }

    pub fn acked(&self) -> Vec<String> {
        self.acked.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationSource for FakeNotificationSource {
    async fn pull(&self) -> Result<Option<ReceivedMessage>> {
        Ok(self.pending.lock().unwrap().pop_front())
    }

    async fn ack(&self, ack_id: &str) -> Result<()> {
        self.acked.lock().unwrap().push(ack_id.to_string());
        Ok(())
    }
}

/// An [`AppState`] wired to in-memory repositories and fakes, with handles
/// to inspect them
pub struct TestContext {
    pub state: AppState,
    pub tasks: Arc<InMemoryTaskQueue>,
    pub idempotency: Arc<InMemoryIdempotencyRepository>,
    pub build_queue: Arc<FakeBuildQueue>,
    pub notifications: Arc<FakeNotificationSource>,
}

impl TestContext {
    pub fn new() -> Self {
        let tasks = Arc::new(InMemoryTaskQueue::new());
        let idempotency = Arc::new(InMemoryIdempotencyRepository::new());
        let build_queue = Arc::new(FakeBuildQueue::new());
        let notifications = Arc::new(FakeNotificationSource::default());

        let state = AppState {
            service_config: Arc::new(service_config()),
            idempotency: idempotency.clone(),
            workflows: Arc::new(InMemoryWorkflowRepository::new()),
            progress: Arc::new(InMemoryRunProgressRepository::new()),
            tasks: tasks.clone(),
            build_queue: build_queue.clone(),
            notifications: Some(notifications.clone()),
            collect_retry: CollectRetryPolicy {
                delay: Duration::from_secs(60),
                max_attempts: 3,
            },
        };

        Self {
            state,
            tasks,
            idempotency,
            build_queue,
            notifications,
        }
    }

    /// A context where run `run_id` has already been launched
    pub async fn launched(run_id: i64) -> Self {
        let ctx = Self::new();
        crate::service::pipeline_service::launch(&ctx.state, &launch_body(run_id))
            .await
            .unwrap();
        ctx
    }
}
