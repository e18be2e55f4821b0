// Queue Engine - per-prefix atomicity primitive
//
// SPEC_FULL section 9/10.5 resolves the atomicity Open Question by running
// a thin in-process service that serializes procedure invocations per
// queue prefix, rather than compiling each procedure into a store-side
// script. One `tokio::sync::Mutex` per prefix is created lazily; both
// public entry points hold that prefix's lock for the full duration of the
// procedure before touching the store. This only protects callers that go
// through the same `QueueEngine` instance — documented, not hidden.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::domain::{FinishOpts, QueueKeys, RetryOpts};
use crate::port::QueueStore;
use crate::Result;

use super::finish_active_job::{finish_active_job, FinishOutcome};
use super::retry_failed_job::retry_failed_job;

pub struct QueueEngine {
    store: Arc<dyn QueueStore>,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl QueueEngine {
    pub fn new(store: Arc<dyn QueueStore>) -> Self {
        Self {
            store,
            locks: Mutex::new(HashMap::new()),
        }
    }

    fn store(&self) -> &Arc<dyn QueueStore> {
        &self.store
    }

    async fn lock_for(&self, prefix: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks
            .entry(prefix.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn finish_active_job(
        &self,
        prefix: &str,
        job_id: &str,
        timestamp: i64,
        target: &str,
        result_field: &str,
        result_value: &str,
        fetch_next: bool,
        opts: &FinishOpts,
    ) -> Result<FinishOutcome> {
        let prefix_lock = self.lock_for(prefix).await;
        let _guard = prefix_lock.lock().await;
        let keys = QueueKeys::new(prefix);
        finish_active_job(
            self.store(),
            &keys,
            job_id,
            timestamp,
            target,
            result_field,
            result_value,
            fetch_next,
            opts,
        )
        .await
    }

    pub async fn retry_failed_job(
        &self,
        prefix: &str,
        job_id: &str,
        timestamp: i64,
        opts: &RetryOpts,
    ) -> Result<()> {
        let prefix_lock = self.lock_for(prefix).await;
        let _guard = prefix_lock.lock().await;
        let keys = QueueKeys::new(prefix);
        retry_failed_job(self.store(), &keys, job_id, timestamp, opts).await
    }
}
