//! Gateway layer
//!
//! Clients for the external systems the orchestrator drives: the build
//! queue that runs workers and the channel that announces finished builds.
//! Both are traits so the service layer can be tested with fakes.

mod build_queue;
mod notifications;

pub use build_queue::{BuildQueue, BuildStatus, HttpBuildQueue, ScheduleBuild};
pub use notifications::{HttpNotificationSource, NotificationSource, ReceivedMessage};
