// Finish-Active-Job Orchestrator (component 4.8)
//
// Validates the job exists, releases its lock, removes it from active,
// propagates the outcome to its parent, finalizes it, emits events,
// records metrics, and optionally fetches the next job.

use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::{Event, EventKind, FinishOpts, JobRecord, QueueError, QueueKeys};
use crate::port::QueueStore;
use crate::Result;

#[derive(Debug, Clone, PartialEq)]
pub enum FinishOutcome {
    /// The job was finalized; no next job was requested or none was ready.
    Done,
    /// The job was finalized and the next job is ready for processing.
    NextJob { job_id: String, fields: HashMap<String, String> },
    /// The job was finalized; the scheduler is rate-limited.
    RateLimited { ttl_millis: i64 },
    /// The job was finalized; the next delayed job becomes due later.
    NextDelayedAt { timestamp: i64 },
}

#[allow(clippy::too_many_arguments)]
pub async fn finish_active_job(
    store: &Arc<dyn QueueStore>,
    keys: &QueueKeys,
    job_id: &str,
    timestamp: i64,
    target: &str,
    result_field: &str,
    result_value: &str,
    fetch_next: bool,
    opts: &FinishOpts,
) -> Result<FinishOutcome> {
    let job_fields = store.hgetall(&keys.job(job_id)).await?;
    if job_fields.is_empty() {
        return Err(QueueError::MissingJob.into());
    }
    let job = JobRecord::new(job_fields.clone());

    crate::application::lock_manager::release_lock(store, keys, job_id, &opts.token).await?;
    crate::application::active_list::remove_from_active(store, keys, job_id).await?;

    if store.scard(&keys.dependencies(job_id)).await? > 0 {
        return Err(QueueError::PendingDependencies.into());
    }

    if let Some(parent) = job.parent() {
        if target == "completed" {
            crate::application::parent_linker::update_parent_deps_if_needed(
                store,
                keys,
                job_id,
                &parent,
                result_value,
                timestamp,
            )
            .await?;
        } else {
            crate::application::parent_linker::move_parent_if_needed(
                store,
                keys,
                job_id,
                &job,
                &parent,
                result_value,
                timestamp,
            )
            .await?;
        }
    }

    crate::application::event_emitter::trim_events(store, keys, opts.max_len_events).await?;
    crate::application::finalizer::finalize_job(
        store,
        keys,
        job_id,
        &opts.keep_jobs,
        target,
        result_field,
        result_value,
        timestamp,
    )
    .await?;

    let event = if target == "completed" {
        Event::new(
            job_id.to_string(),
            EventKind::Completed {
                return_value: result_value.to_string(),
            },
        )
    } else {
        Event::new(
            job_id.to_string(),
            EventKind::Failed {
                failed_reason: result_value.to_string(),
                prev: "active".to_string(),
            },
        )
    };
    crate::application::event_emitter::emit(store, keys, event).await?;

    let atm = job.atm() + 1;
    if opts.keep_jobs.count != Some(0) {
        store.hset(&keys.job(job_id), "atm", &atm.to_string()).await?;
    }

    if target == "failed" && atm >= opts.attempts {
        crate::application::event_emitter::emit(
            store,
            keys,
            Event::new(
                job_id.to_string(),
                EventKind::RetriesExhausted { attempts_made: atm },
            ),
        )
        .await?;
    }

    crate::application::metrics_collector::record(
        store,
        keys,
        target,
        timestamp,
        opts.max_metrics_size,
    )
    .await?;

    if fetch_next {
        use crate::application::scheduler::{schedule_next, prepare_job_for_processing, NextJob};
        match schedule_next(store, keys, timestamp, opts.limiter.as_ref().map(|l| l.max)).await? {
            NextJob::Ready { job_id: next_id } => {
                prepare_job_for_processing(
                    store,
                    keys,
                    &next_id,
                    timestamp,
                    opts.limiter.as_ref(),
                )
                .await?;
                let fields = store.hgetall(&keys.job(&next_id)).await?;
                Ok(FinishOutcome::NextJob { job_id: next_id, fields })
            }
            NextJob::RateLimited { ttl_millis } => Ok(FinishOutcome::RateLimited { ttl_millis }),
            NextJob::NextDelayedAt { timestamp } => {
                Ok(FinishOutcome::NextDelayedAt { timestamp })
            }
            NextJob::Empty => Ok(FinishOutcome::Done),
        }
    } else {
        let wait_len = store.llen(&keys.wait()).await?;
        let active_len = store.llen(&keys.active()).await?;
        let prioritized_len = store.zcard(&keys.prioritized()).await?;
        if wait_len == 0 && active_len == 0 && prioritized_len == 0 {
            crate::application::event_emitter::emit(store, keys, Event::drained()).await?;
        }
        Ok(FinishOutcome::Done)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::KeepJobs;
    use crate::port::store::mocks::FakeQueueStore;

    fn store() -> Arc<dyn QueueStore> {
        Arc::new(FakeQueueStore::new())
    }

    fn opts(token: &str) -> FinishOpts {
        FinishOpts {
            token: token.to_string(),
            keep_jobs: KeepJobs {
                count: Some(10),
                age: None,
            },
            lock_duration: 30_000,
            attempts: 3,
            max_len_events: None,
            max_metrics_size: None,
            limiter: None,
        }
    }

    async fn seed_active_job(store: &Arc<dyn QueueStore>, keys: &QueueKeys, job_id: &str, token: &str) {
        store.hset(&keys.job(job_id), "atm", "0").await.unwrap();
        store.rpush(&keys.active(), job_id).await.unwrap();
        store.set(&keys.lock(job_id), token).await.unwrap();
    }

    #[tokio::test]
    async fn missing_job_is_rejected() {
        let store = store();
        let keys = QueueKeys::new("q");
        let err = finish_active_job(
            &store, &keys, "1", 1000, "completed", "returnvalue", "ok", false, &opts("t"),
        )
        .await
        .unwrap_err();
        assert_eq!(err.code(), Some(QueueError::MissingJob.code()));
    }

    #[tokio::test]
    async fn completes_job_and_fetches_next() {
        let store = store();
        let keys = QueueKeys::new("q");
        seed_active_job(&store, &keys, "1", "tok").await;
        store.rpush(&keys.wait(), "2").await.unwrap();
        store.hset(&keys.job("2"), "atm", "0").await.unwrap();

        let outcome = finish_active_job(
            &store, &keys, "1", 1000, "completed", "returnvalue", "ok", true, &opts("tok"),
        )
        .await
        .unwrap();

        assert!(matches!(outcome, FinishOutcome::NextJob { ref job_id, .. } if job_id == "2"));
        assert_eq!(store.zcard(&keys.completed()).await.unwrap(), 1);
        assert_eq!(store.get(&keys.lock("1")).await.unwrap(), None);
    }

    #[tokio::test]
    async fn failing_last_attempt_emits_retries_exhausted() {
        let fake = Arc::new(FakeQueueStore::new());
        let store: Arc<dyn QueueStore> = fake.clone();
        let keys = QueueKeys::new("q");
        store.hset(&keys.job("1"), "atm", "2").await.unwrap();
        store.rpush(&keys.active(), "1").await.unwrap();
        store.set(&keys.lock("1"), "tok").await.unwrap();

        finish_active_job(
            &store, &keys, "1", 1000, "failed", "failedReason", "boom", false, &opts("tok"),
        )
        .await
        .unwrap();

        let events = fake.stream_events(&keys.events());
        let names: Vec<_> = events
            .iter()
            .flat_map(|fields| fields.iter())
            .filter(|(k, _)| k == "event")
            .map(|(_, v)| v.clone())
            .collect();
        assert!(names.contains(&"failed".to_string()));
        assert!(names.contains(&"retries-exhausted".to_string()));
    }

    #[tokio::test]
    async fn rejects_job_with_pending_dependencies() {
        let store = store();
        let keys = QueueKeys::new("q");
        seed_active_job(&store, &keys, "1", "tok").await;
        store.sadd(&keys.dependencies("1"), "q:2").await.unwrap();

        let err = finish_active_job(
            &store, &keys, "1", 1000, "completed", "returnvalue", "ok", false, &opts("tok"),
        )
        .await
        .unwrap_err();
        assert_eq!(err.code(), Some(QueueError::PendingDependencies.code()));
    }
}
