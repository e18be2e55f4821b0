// Packed Option DTOs
//
// The wire contract (SPEC_FULL section 6) describes `opts` as a packed,
// length-prefixed binary map. This crate accepts any equivalent
// self-describing format, so these types carry `serde` derives and are
// deserialized from whatever the RPC layer decoded the wire payload into
// (JSON over jsonrpsee, in this codebase).

use serde::{Deserialize, Serialize};

/// Retention policy for finished jobs. `count: None` means "retain
/// forever, trim only by age" (Open Question 1 in DESIGN.md).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct KeepJobs {
    #[serde(default)]
    pub count: Option<u64>,
    #[serde(default)]
    pub age: Option<u64>,
}

/// Token-bucket-style rate limit applied by the scheduler (component 4.7).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Limiter {
    pub max: u64,
    pub duration: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinishOpts {
    pub token: String,
    #[serde(default)]
    pub keep_jobs: KeepJobs,
    pub lock_duration: u64,
    pub attempts: u32,
    /// Approximate cap for the event stream, trimmed before this
    /// procedure's own events are appended (component 4.5).
    #[serde(default)]
    pub max_len_events: Option<u64>,
    /// Approximate cap for the per-minute metrics data list (component 4.6).
    #[serde(default)]
    pub max_metrics_size: Option<u64>,
    #[serde(default)]
    pub limiter: Option<Limiter>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum PushCmd {
    Lpush,
    Rpush,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryOpts {
    pub token: String,
    pub push_cmd: PushCmd,
}
