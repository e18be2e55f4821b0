// Central Error Type for the Application

use thiserror::Error;

/// Application-level error type.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("queue error: {0}")]
    Queue(#[from] crate::domain::QueueError),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("store error: {0}")]
    Store(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// The stable wire code for this error, if it originates from a
    /// `QueueError`. Non-queue errors have no wire code.
    pub fn code(&self) -> Option<i32> {
        match self {
            AppError::Queue(e) => Some(e.code()),
            _ => None,
        }
    }
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

// From implementation for infra crates (to avoid circular dependency)
impl From<String> for AppError {
    fn from(err: String) -> Self {
        AppError::Store(err)
    }
}

// Note: redis::RedisError conversion is handled in infra-redis crate
// by converting to AppError::Store(String).
