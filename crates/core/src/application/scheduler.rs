// Scheduler (component 4.7)
//
// Promotes due delayed jobs, checks pause/concurrency caps, checks rate
// limits, and selects the next job from the wait list, then the priority
// set. Invoked only when the finish-active-job caller asks for the next
// job (`fetchNext = 1`).

use std::sync::Arc;

use tracing::debug;

use crate::domain::{priority_score, Event, EventKind, QueueKeys};
use crate::port::QueueStore;
use crate::Result;

const DELAYED_PROMOTION_LIMIT: i64 = 1000;

/// Outcome of a scheduler invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum NextJob {
    /// A job was moved to active and is ready for processing.
    Ready { job_id: String },
    /// No job is ready; retry after `ttl_millis`.
    RateLimited { ttl_millis: i64 },
    /// No job is ready now; the next delayed job becomes due at this
    /// timestamp.
    NextDelayedAt { timestamp: i64 },
    /// No job is ready and none is scheduled.
    Empty,
}

pub async fn schedule_next(
    store: &Arc<dyn QueueStore>,
    keys: &QueueKeys,
    timestamp: i64,
    limiter_max: Option<u64>,
) -> Result<NextJob> {
    let meta = store.hgetall(&keys.meta()).await?;
    let paused = meta.get("paused").map(|v| v == "1").unwrap_or(false);
    let concurrency: i64 = meta
        .get("concurrency")
        .and_then(|v| v.parse().ok())
        .unwrap_or(i64::MAX);
    let active_len = store.llen(&keys.active()).await?;
    let paused_or_maxed = paused || active_len >= concurrency;

    promote_delayed(store, keys, timestamp, paused_or_maxed).await?;

    if let Some(max) = limiter_max {
        let current: i64 = store
            .get(&keys.limiter())
            .await?
            .and_then(|v| v.parse().ok())
            .unwrap_or(0);
        if current >= max as i64 {
            let ttl = store.pttl(&keys.limiter()).await?;
            if ttl > 0 {
                return Ok(NextJob::RateLimited { ttl_millis: ttl });
            }
        }
    }

    if paused_or_maxed {
        return Ok(NextJob::Empty);
    }

    if let Some(job_id) = store.rpoplpush(&keys.wait(), &keys.active()).await? {
        debug!(job_id = %job_id, "popped job from wait list");
        return Ok(NextJob::Ready { job_id });
    }

    if let Some((job_id, _score)) = store.zpopmin(&keys.prioritized()).await? {
        store.rpush(&keys.active(), &job_id).await?;
        debug!(job_id = %job_id, "popped job from priority set");
        return Ok(NextJob::Ready { job_id });
    }

    let next_delayed = store.zrange_withscores(&keys.delayed(), 0, 0).await?;
    if let Some((_, score)) = next_delayed.into_iter().next() {
        return Ok(NextJob::NextDelayedAt {
            timestamp: score as i64,
        });
    }

    let wait_len = store.llen(&keys.wait()).await?;
    let active_len = store.llen(&keys.active()).await?;
    let prioritized_len = store.zcard(&keys.prioritized()).await?;
    if wait_len == 0 && active_len == 0 && prioritized_len == 0 {
        crate::application::event_emitter::emit(store, keys, Event::drained()).await?;
    }

    Ok(NextJob::Empty)
}

pub(crate) async fn promote_delayed(
    store: &Arc<dyn QueueStore>,
    keys: &QueueKeys,
    timestamp: i64,
    paused_or_maxed: bool,
) -> Result<()> {
    let due = store
        .zrangebyscore(
            &keys.delayed(),
            f64::NEG_INFINITY,
            timestamp as f64,
            Some(DELAYED_PROMOTION_LIMIT),
        )
        .await?;

    for job_id in due {
        store.zrem(&keys.delayed(), &job_id).await?;

        let fields = store.hgetall(&keys.job(&job_id)).await?;
        let priority: u64 = fields
            .get("priority")
            .and_then(|v| v.parse().ok())
            .unwrap_or(0);

        if priority == 0 {
            store.rpush(&keys.wait(), &job_id).await?;
        } else {
            let counter = store.incr(&keys.priority_counter()).await?;
            store
                .zadd(&keys.prioritized(), priority_score(priority, counter), &job_id)
                .await?;
        }

        if !paused_or_maxed {
            store.set(&keys.marker(), &timestamp.to_string()).await?;
        }

        crate::application::event_emitter::emit(
            store,
            keys,
            Event::new(
                job_id,
                EventKind::Waiting {
                    prev: "delayed".to_string(),
                },
            ),
        )
        .await?;
    }

    Ok(())
}

/// Marks a newly-activated job as processing: bumps the rate-limit
/// counter, stamps `processedOn`, and emits the `active` event.
pub async fn prepare_job_for_processing(
    store: &Arc<dyn QueueStore>,
    keys: &QueueKeys,
    job_id: &str,
    timestamp: i64,
    limiter: Option<&crate::domain::Limiter>,
) -> Result<()> {
    if let Some(limiter) = limiter {
        let count = store.incr(&keys.limiter()).await?;
        if count == 1 {
            store.pexpire(&keys.limiter(), limiter.duration as i64).await?;
        }
    }

    store
        .hset(&keys.job(job_id), "processedOn", &timestamp.to_string())
        .await?;

    crate::application::event_emitter::emit(
        store,
        keys,
        Event::new(
            job_id.to_string(),
            EventKind::Active {
                prev: "waiting".to_string(),
            },
        ),
    )
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::store::mocks::FakeQueueStore;

    fn store() -> Arc<dyn QueueStore> {
        Arc::new(FakeQueueStore::new())
    }

    #[tokio::test]
    async fn pops_from_wait_list_first() {
        let store = store();
        let keys = QueueKeys::new("q");
        store.rpush(&keys.wait(), "1").await.unwrap();
        let result = schedule_next(&store, &keys, 1000, None).await.unwrap();
        assert_eq!(result, NextJob::Ready { job_id: "1".into() });
        assert_eq!(store.llen(&keys.active()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn falls_back_to_priority_set() {
        let store = store();
        let keys = QueueKeys::new("q");
        store.zadd(&keys.prioritized(), 5.0, "p1").await.unwrap();
        let result = schedule_next(&store, &keys, 1000, None).await.unwrap();
        assert_eq!(result, NextJob::Ready { job_id: "p1".into() });
    }

    #[tokio::test]
    async fn promotes_due_delayed_jobs_before_popping() {
        let store = store();
        let keys = QueueKeys::new("q");
        store.zadd(&keys.delayed(), 500.0, "d1").await.unwrap();
        let result = schedule_next(&store, &keys, 1000, None).await.unwrap();
        assert_eq!(result, NextJob::Ready { job_id: "d1".into() });
        assert_eq!(store.zcard(&keys.delayed()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn reports_next_delayed_timestamp_when_nothing_ready() {
        let store = store();
        let keys = QueueKeys::new("q");
        store.zadd(&keys.delayed(), 5000.0, "d1").await.unwrap();
        let result = schedule_next(&store, &keys, 1000, None).await.unwrap();
        assert_eq!(result, NextJob::NextDelayedAt { timestamp: 5000 });
    }

    #[tokio::test]
    async fn paused_queue_returns_empty_without_popping() {
        let store = store();
        let keys = QueueKeys::new("q");
        store.hset(&keys.meta(), "paused", "1").await.unwrap();
        store.rpush(&keys.wait(), "1").await.unwrap();
        let result = schedule_next(&store, &keys, 1000, None).await.unwrap();
        assert_eq!(result, NextJob::Empty);
        assert_eq!(store.llen(&keys.active()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn emits_drained_when_all_queues_empty() {
        let store = store();
        let keys = QueueKeys::new("q");
        schedule_next(&store, &keys, 1000, None).await.unwrap();
        // just checking it doesn't error; event content checked via the
        // concrete store in the event_emitter test module.
    }
}
