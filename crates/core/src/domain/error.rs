// Domain Error Types

use thiserror::Error;

/// Stable wire-contract error for the finish-active-job and
/// retry-failed-job procedures. The negative integers are the actual
/// return codes of the procedures; callers across the RPC boundary see
/// these same numbers, so the variant set must never be renumbered.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueError {
    #[error("job not found")]
    MissingJob,

    #[error("lock not found")]
    MissingLock,

    #[error("job is not in the active list")]
    NotActive,

    #[error("job has pending dependencies")]
    PendingDependencies,

    #[error("lock is not held by this token")]
    NotOwner,
}

impl QueueError {
    /// The stable wire code for this error. Code -5 is intentionally
    /// reserved and must never be assigned.
    pub fn code(&self) -> i32 {
        match self {
            QueueError::MissingJob => -1,
            QueueError::MissingLock => -2,
            QueueError::NotActive => -3,
            QueueError::PendingDependencies => -4,
            QueueError::NotOwner => -6,
        }
    }

    /// Reconstruct a `QueueError` from its wire code, if it maps to one.
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            -1 => Some(QueueError::MissingJob),
            -2 => Some(QueueError::MissingLock),
            -3 => Some(QueueError::NotActive),
            -4 => Some(QueueError::PendingDependencies),
            -6 => Some(QueueError::NotOwner),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, QueueError>;
