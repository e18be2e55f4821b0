// Retry-Failed-Job Orchestrator (component 4.9)
//
// Always promotes due delayed jobs first, regardless of whether the job
// still exists, so a worker entering this path opportunistically advances
// scheduling even if the job was removed out from under it. Then releases
// the lock, removes the job from active, and reinserts it into the wait
// list or priority set.

use std::sync::Arc;

use crate::domain::{priority_score, Event, EventKind, PushCmd, QueueError, QueueKeys, RetryOpts};
use crate::port::QueueStore;
use crate::Result;

pub async fn retry_failed_job(
    store: &Arc<dyn QueueStore>,
    keys: &QueueKeys,
    job_id: &str,
    timestamp: i64,
    opts: &RetryOpts,
) -> Result<()> {
    promote_delayed_eagerly(store, keys, timestamp).await?;

    let job_fields = store.hgetall(&keys.job(job_id)).await?;
    if job_fields.is_empty() {
        return Err(QueueError::MissingJob.into());
    }

    crate::application::lock_manager::release_lock(store, keys, job_id, &opts.token).await?;
    crate::application::active_list::remove_from_active(store, keys, job_id).await?;

    let priority: u64 = job_fields
        .get("priority")
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);

    if priority == 0 {
        match opts.push_cmd {
            PushCmd::Lpush => store.lpush(&keys.wait(), job_id).await?,
            PushCmd::Rpush => store.rpush(&keys.wait(), job_id).await?,
        };
    } else {
        let counter = store.incr(&keys.priority_counter()).await?;
        store
            .zadd(&keys.prioritized(), priority_score(priority, counter), job_id)
            .await?;
    }

    let meta = store.hgetall(&keys.meta()).await?;
    let paused = meta.get("paused").map(|v| v == "1").unwrap_or(false);
    let concurrency: i64 = meta
        .get("concurrency")
        .and_then(|v| v.parse().ok())
        .unwrap_or(i64::MAX);
    let active_len = store.llen(&keys.active()).await?;
    if !paused && active_len < concurrency {
        store.set(&keys.marker(), &timestamp.to_string()).await?;
    }

    let atm: u32 = job_fields.get("atm").and_then(|v| v.parse().ok()).unwrap_or(0);
    store
        .hset(&keys.job(job_id), "atm", &(atm + 1).to_string())
        .await?;

    crate::application::event_emitter::emit(
        store,
        keys,
        Event::new(
            job_id.to_string(),
            EventKind::Waiting {
                prev: "failed".to_string(),
            },
        ),
    )
    .await?;

    Ok(())
}

/// Promotes due delayed jobs, reusing the scheduler's own promotion step
/// (component 4.7) so the two procedures never drift on this logic.
async fn promote_delayed_eagerly(
    store: &Arc<dyn QueueStore>,
    keys: &QueueKeys,
    timestamp: i64,
) -> Result<()> {
    crate::application::scheduler::promote_delayed(store, keys, timestamp, false).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::store::mocks::FakeQueueStore;

    fn store() -> Arc<dyn QueueStore> {
        Arc::new(FakeQueueStore::new())
    }

    fn opts(token: &str) -> RetryOpts {
        RetryOpts {
            token: token.to_string(),
            push_cmd: PushCmd::Rpush,
        }
    }

    #[tokio::test]
    async fn missing_job_is_rejected_after_promoting_delayed() {
        let store = store();
        let keys = QueueKeys::new("q");
        store.zadd(&keys.delayed(), 500.0, "d1").await.unwrap();

        let err = retry_failed_job(&store, &keys, "missing", 1000, &opts("t"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), Some(QueueError::MissingJob.code()));
        // promotion happened anyway, even though the job lookup failed
        assert_eq!(store.llen(&keys.wait()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn moves_job_to_priority_set_with_incremented_attempts() {
        let store = store();
        let keys = QueueKeys::new("q");
        store.hset(&keys.job("1"), "priority", "5").await.unwrap();
        store.hset(&keys.job("1"), "atm", "1").await.unwrap();
        store.rpush(&keys.active(), "1").await.unwrap();
        store.set(&keys.lock("1"), "tok").await.unwrap();

        retry_failed_job(&store, &keys, "1", 1000, &opts("tok")).await.unwrap();

        assert_eq!(store.llen(&keys.active()).await.unwrap(), 0);
        assert_eq!(store.zcard(&keys.prioritized()).await.unwrap(), 1);
        let fields = store.hgetall(&keys.job("1")).await.unwrap();
        assert_eq!(fields.get("atm").unwrap(), "2");
    }

    #[tokio::test]
    async fn rejects_when_not_in_active_list() {
        let store = store();
        let keys = QueueKeys::new("q");
        store.hset(&keys.job("1"), "priority", "0").await.unwrap();
        store.set(&keys.lock("1"), "tok").await.unwrap();

        let err = retry_failed_job(&store, &keys, "1", 1000, &opts("tok"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), Some(QueueError::NotActive.code()));
    }
}
