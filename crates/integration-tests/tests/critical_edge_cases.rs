//! Boundary behaviors called out in SPEC_FULL section 8.

use std::sync::Arc;

use queue_core::application::{FinishOutcome, QueueEngine};
use queue_core::domain::{FinishOpts, KeepJobs, QueueKeys};
use queue_core::port::store::mocks::FakeQueueStore;
use queue_core::port::QueueStore;

fn finish_opts(token: &str, keep_jobs: KeepJobs) -> FinishOpts {
    FinishOpts {
        token: token.to_string(),
        keep_jobs,
        lock_duration: 30_000,
        attempts: 5,
        max_len_events: None,
        max_metrics_size: None,
        limiter: None,
    }
}

/// `keepJobs.count = 0` deletes the job and all sub-keys and decrements the
/// parent's back-reference, with no entry left in completed/failed.
#[tokio::test]
async fn keep_jobs_count_zero_deletes_job_and_parent_back_reference() {
    let store: Arc<dyn QueueStore> = Arc::new(FakeQueueStore::new());
    let engine = QueueEngine::new(store.clone());

    let child_keys = QueueKeys::new("q1");
    let parent_keys = QueueKeys::new("q2");

    store.hset(&child_keys.job("j1"), "atm", "0").await.unwrap();
    store
        .hset(&child_keys.job("j1"), "parentKey", &parent_keys.job("p1"))
        .await
        .unwrap();
    store.rpush(&child_keys.active(), "j1").await.unwrap();
    store.set(&child_keys.lock("j1"), "t1").await.unwrap();

    store
        .sadd(&parent_keys.dependencies("p1"), &child_keys.job("j1"))
        .await
        .unwrap();
    // Two deps so the parent stays blocked and we can observe the decrement
    // in isolation from reactivation.
    store
        .sadd(&parent_keys.dependencies("p1"), "q1:j2")
        .await
        .unwrap();

    engine
        .finish_active_job(
            "q1",
            "j1",
            1000,
            "completed",
            "returnvalue",
            "ok",
            false,
            &finish_opts("t1", KeepJobs { count: Some(0), age: None }),
        )
        .await
        .unwrap();

    assert!(!store.exists(&child_keys.job("j1")).await.unwrap());
    assert_eq!(store.zcard(&child_keys.completed()).await.unwrap(), 0);
    assert_eq!(store.zcard(&child_keys.failed()).await.unwrap(), 0);
    assert_eq!(store.scard(&parent_keys.dependencies("p1")).await.unwrap(), 1);
}

/// `maxMetricsSize` absent: metrics recording is skipped entirely, leaving
/// no metrics hash behind.
#[tokio::test]
async fn absent_max_metrics_size_skips_metrics_entirely() {
    let store: Arc<dyn QueueStore> = Arc::new(FakeQueueStore::new());
    let engine = QueueEngine::new(store.clone());
    let keys = QueueKeys::new("q");

    store.hset(&keys.job("j1"), "atm", "0").await.unwrap();
    store.rpush(&keys.active(), "j1").await.unwrap();
    store.set(&keys.lock("j1"), "t1").await.unwrap();

    let mut opts = finish_opts("t1", KeepJobs { count: Some(10), age: None });
    opts.max_metrics_size = None;

    engine
        .finish_active_job("q", "j1", 1000, "completed", "returnvalue", "ok", false, &opts)
        .await
        .unwrap();

    assert!(!store.exists(&keys.metrics("completed")).await.unwrap());
}

/// `limiter` absent: the rate-limit check is skipped, so `fetchNext` still
/// pops the next ready job even though the limiter key indicates exhaustion.
#[tokio::test]
async fn absent_limiter_skips_rate_limit_check() {
    let store: Arc<dyn QueueStore> = Arc::new(FakeQueueStore::new());
    let engine = QueueEngine::new(store.clone());
    let keys = QueueKeys::new("q");

    store.hset(&keys.job("j1"), "atm", "0").await.unwrap();
    store.rpush(&keys.active(), "j1").await.unwrap();
    store.set(&keys.lock("j1"), "t1").await.unwrap();
    store.rpush(&keys.wait(), "j2").await.unwrap();
    store.hset(&keys.job("j2"), "atm", "0").await.unwrap();

    // The limiter key looks exhausted, but opts.limiter is None so the
    // check never runs.
    store.set(&keys.limiter(), "999").await.unwrap();
    store.pexpire(&keys.limiter(), 5000).await.unwrap();

    let opts = finish_opts("t1", KeepJobs { count: Some(10), age: None });
    let outcome = engine
        .finish_active_job("q", "j1", 1000, "completed", "returnvalue", "ok", true, &opts)
        .await
        .unwrap();

    match outcome {
        FinishOutcome::NextJob { job_id, .. } => assert_eq!(job_id, "j2"),
        other => panic!("expected NextJob since the limiter is not configured, got {other:?}"),
    }
}

/// `nextDelayedTimestamp` is always reported greater than the call's `now`.
#[tokio::test]
async fn next_delayed_timestamp_is_always_after_now() {
    let store: Arc<dyn QueueStore> = Arc::new(FakeQueueStore::new());
    let engine = QueueEngine::new(store.clone());
    let keys = QueueKeys::new("q");

    store.zadd(&keys.delayed(), 5000.0, "future").await.unwrap();
    store.hset(&keys.job("future"), "atm", "0").await.unwrap();

    store.hset(&keys.job("j1"), "atm", "0").await.unwrap();
    store.rpush(&keys.active(), "j1").await.unwrap();
    store.set(&keys.lock("j1"), "t1").await.unwrap();

    let now = 1000;
    let outcome = engine
        .finish_active_job("q", "j1", now, "completed", "returnvalue", "ok", true, &finish_opts("t1", KeepJobs { count: Some(10), age: None }))
        .await
        .unwrap();

    match outcome {
        FinishOutcome::NextDelayedAt { timestamp } => assert!(timestamp > now),
        other => panic!("expected NextDelayedAt, got {other:?}"),
    }
}
