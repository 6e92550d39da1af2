//! Repository Module
//!
//! Data access layer for the orchestrator.
//!
//! Every repository is a trait with two implementations: a Postgres one
//! used in deployments and an in-memory one used when no database is
//! configured and in tests.

mod idempotency;
mod progress;
mod task;
mod workflow;

// Re-export traits
pub use idempotency::IdempotencyRepository;
pub use progress::RunProgressRepository;
pub use task::{Task, TaskQueue};
pub use workflow::WorkflowRepository;

// Re-export implementations
pub use idempotency::{InMemoryIdempotencyRepository, PgIdempotencyRepository};
pub use progress::{InMemoryRunProgressRepository, PgRunProgressRepository};
pub use task::{InMemoryTaskQueue, PgTaskQueue};
pub use workflow::{InMemoryWorkflowRepository, PgWorkflowRepository};
