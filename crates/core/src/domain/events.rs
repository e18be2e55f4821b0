// Event Stream Payloads
//
// Structured events appended to `P:events` by the event emitter (component
// 4.5). Each event carries its own free-form field set; `Event::into_fields`
// flattens it into the `(key, value)` pairs an `XADD` call needs.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum EventKind {
    Completed { return_value: String },
    Failed { failed_reason: String, prev: String },
    RetriesExhausted { attempts_made: u32 },
    Waiting { prev: String },
    Active { prev: String },
    Drained,
}

#[derive(Debug, Clone)]
pub struct Event {
    pub job_id: Option<String>,
    pub kind: EventKind,
}

impl Event {
    pub fn new(job_id: impl Into<String>, kind: EventKind) -> Self {
        Self {
            job_id: Some(job_id.into()),
            kind,
        }
    }

    pub fn drained() -> Self {
        Self {
            job_id: None,
            kind: EventKind::Drained,
        }
    }

    /// Flatten into the `field value` pairs an `XADD` call needs, in a
    /// stable order so tests can assert on exact stream entries.
    pub fn into_fields(self) -> Vec<(String, String)> {
        let mut fields = Vec::new();
        let event_name = match &self.kind {
            EventKind::Completed { .. } => "completed",
            EventKind::Failed { .. } => "failed",
            EventKind::RetriesExhausted { .. } => "retries-exhausted",
            EventKind::Waiting { .. } => "waiting",
            EventKind::Active { .. } => "active",
            EventKind::Drained => "drained",
        };
        fields.push(("event".to_string(), event_name.to_string()));
        if let Some(job_id) = self.job_id {
            fields.push(("jobId".to_string(), job_id));
        }
        match self.kind {
            EventKind::Completed { return_value } => {
                fields.push(("returnvalue".to_string(), return_value));
            }
            EventKind::Failed { failed_reason, prev } => {
                fields.push(("failedReason".to_string(), failed_reason));
                fields.push(("prev".to_string(), prev));
            }
            EventKind::RetriesExhausted { attempts_made } => {
                fields.push(("attemptsMade".to_string(), attempts_made.to_string()));
            }
            EventKind::Waiting { prev } => {
                fields.push(("prev".to_string(), prev));
            }
            EventKind::Active { prev } => {
                fields.push(("prev".to_string(), prev));
            }
            EventKind::Drained => {}
        }
        fields
    }
}
