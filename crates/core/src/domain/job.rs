// Job Domain Model
//
// A job is stored in the key-value store as a hash (`HGETALL`), so the
// in-process representation is a field bag rather than a typed row. Typed
// accessors pull out the handful of fields the application layer actually
// reasons about; everything else (the opaque payload) passes through
// untouched.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Encoded shape of the job hash's `parent` field: which queue and job the
/// parent lives at, so dependency propagation can reach across prefixes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParentRef {
    /// Full key of the parent job, e.g. `P2:42`.
    #[serde(rename = "id")]
    pub parent_key: String,
    /// Prefix of the queue the parent lives in, e.g. `P2`.
    pub queue_key: String,
}

/// A job's durable state, as read from `HGETALL P:<jobId>`.
#[derive(Debug, Clone, Default)]
pub struct JobRecord {
    pub fields: HashMap<String, String>,
}

impl JobRecord {
    pub fn new(fields: HashMap<String, String>) -> Self {
        Self { fields }
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(|s| s.as_str())
    }

    /// Attempts made so far; defaults to 0 for a freshly created job.
    pub fn atm(&self) -> u32 {
        self.get("atm").and_then(|v| v.parse().ok()).unwrap_or(0)
    }

    /// Configured max attempts; defaults to 1 (no retries) if unset.
    pub fn attempts(&self) -> u32 {
        self.get("attempts")
            .and_then(|v| v.parse().ok())
            .unwrap_or(1)
    }

    /// Priority; 0 means "no priority, use the plain wait list".
    pub fn priority(&self) -> u64 {
        self.get("priority")
            .and_then(|v| v.parse().ok())
            .unwrap_or(0)
    }

    /// Debounce id, if this job was enqueued with one.
    pub fn deid(&self) -> Option<&str> {
        self.get("deid")
    }

    /// Raw `parentKey` field, the full key of the parent job.
    pub fn parent_key(&self) -> Option<&str> {
        self.get("parentKey")
    }

    /// Decoded `parent` object, if present.
    pub fn parent(&self) -> Option<ParentRef> {
        self.get("parent")
            .and_then(|v| serde_json::from_str(v).ok())
    }

    /// Whether failure on this job should be propagated to its parent as a
    /// parent failure, per the job's own `failParentOnFailure` option.
    pub fn fail_parent_on_failure(&self) -> bool {
        self.get("failParentOnFailure")
            .map(|v| v == "1" || v == "true")
            .unwrap_or(false)
    }

    /// Whether a failed dependency should be treated as satisfied for the
    /// purpose of unblocking the parent, per `ignoreDependencyOnFailure`.
    pub fn ignore_dependency_on_failure(&self) -> bool {
        self.get("ignoreDependencyOnFailure")
            .map(|v| v == "1" || v == "true")
            .unwrap_or(false)
    }
}
