//! Task scheduling
//!
//! Delivers due tasks from the task queue to the orchestrator's own
//! handlers.

mod dispatcher;

pub use dispatcher::{HttpTaskDelivery, TaskDelivery, TaskDispatcher};
