// Domain Layer - Pure business logic and entities

pub mod error;
pub mod events;
pub mod job;
pub mod opts;
pub mod priority;
pub mod queue;

// Re-exports
pub use error::QueueError;
pub use events::{Event, EventKind};
pub use job::{JobRecord, ParentRef};
pub use opts::{FinishOpts, KeepJobs, Limiter, PushCmd, RetryOpts};
pub use priority::priority_score;
pub use queue::{QueueId, QueueKeys};
