//! RPC Request/Response Types
//!
//! Defines the JSON-RPC method parameters and results for the two
//! procedures (SPEC_FULL section 6).

use serde::{Deserialize, Serialize};

use queue_core::domain::{FinishOpts, RetryOpts};

/// queue.finishActiveJob.v1
#[derive(Debug, Deserialize)]
pub struct FinishActiveJobRequest {
    pub prefix: String,
    pub job_id: String,
    pub timestamp: i64,
    /// "completed" or "failed"
    pub target: String,
    /// "returnvalue" or "failedReason"
    pub result_field: String,
    pub result_value: String,
    #[serde(default)]
    pub fetch_next: bool,
    pub opts: FinishOpts,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum FinishActiveJobResponse {
    Done,
    NextJob {
        job_id: String,
        fields: std::collections::HashMap<String, String>,
    },
    RateLimited {
        ttl_millis: i64,
    },
    NextDelayedAt {
        timestamp: i64,
    },
}

/// queue.retryFailedJob.v1
#[derive(Debug, Deserialize)]
pub struct RetryFailedJobRequest {
    pub prefix: String,
    pub job_id: String,
    pub timestamp: i64,
    pub opts: RetryOpts,
}

#[derive(Debug, Clone, Serialize)]
pub struct RetryFailedJobResponse {
    pub job_id: String,
}
