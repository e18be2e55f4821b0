// Queue Domain Model
//
// Every entity in the data model is a key computed from a queue prefix.
// `QueueKeys` centralizes that computation so application code never
// string-formats a key inline.

/// Queue prefix, e.g. `bull:myqueue`.
pub type QueueId = String;

#[derive(Debug, Clone)]
pub struct QueueKeys {
    pub prefix: QueueId,
}

impl QueueKeys {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn job(&self, job_id: &str) -> String {
        format!("{}:{}", self.prefix, job_id)
    }

    pub fn lock(&self, job_id: &str) -> String {
        format!("{}:{}:lock", self.prefix, job_id)
    }

    pub fn dependencies(&self, job_id: &str) -> String {
        format!("{}:{}:dependencies", self.prefix, job_id)
    }

    pub fn processed(&self, job_id: &str) -> String {
        format!("{}:{}:processed", self.prefix, job_id)
    }

    pub fn results(&self, job_id: &str) -> String {
        format!("{}:{}:results", self.prefix, job_id)
    }

    pub fn logs(&self, job_id: &str) -> String {
        format!("{}:{}:logs", self.prefix, job_id)
    }

    pub fn wait(&self) -> String {
        format!("{}:wait", self.prefix)
    }

    pub fn active(&self) -> String {
        format!("{}:active", self.prefix)
    }

    pub fn prioritized(&self) -> String {
        format!("{}:prioritized", self.prefix)
    }

    pub fn priority_counter(&self) -> String {
        format!("{}:pc", self.prefix)
    }

    pub fn delayed(&self) -> String {
        format!("{}:delayed", self.prefix)
    }

    pub fn completed(&self) -> String {
        format!("{}:completed", self.prefix)
    }

    pub fn failed(&self) -> String {
        format!("{}:failed", self.prefix)
    }

    pub fn stalled(&self) -> String {
        format!("{}:stalled", self.prefix)
    }

    pub fn meta(&self) -> String {
        format!("{}:meta", self.prefix)
    }

    pub fn events(&self) -> String {
        format!("{}:events", self.prefix)
    }

    pub fn marker(&self) -> String {
        format!("{}:marker", self.prefix)
    }

    pub fn limiter(&self) -> String {
        format!("{}:limiter", self.prefix)
    }

    pub fn metrics(&self, kind: &str) -> String {
        format!("{}:metrics:{}", self.prefix, kind)
    }

    pub fn metrics_data(&self, kind: &str) -> String {
        format!("{}:metrics:{}:data", self.prefix, kind)
    }

    pub fn debounce(&self, deid: &str) -> String {
        format!("{}:de:{}", self.prefix, deid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn computes_canonical_keys() {
        let keys = QueueKeys::new("bull:myqueue");
        assert_eq!(keys.job("42"), "bull:myqueue:42");
        assert_eq!(keys.lock("42"), "bull:myqueue:42:lock");
        assert_eq!(keys.wait(), "bull:myqueue:wait");
        assert_eq!(keys.active(), "bull:myqueue:active");
        assert_eq!(keys.metrics_data("completed"), "bull:myqueue:metrics:completed:data");
    }
}
