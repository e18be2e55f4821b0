// Finalizer (component 4.4)
//
// Writes terminal fields on the job hash and places the job in the
// completed/failed set, trimming by age and count; or deletes the job
// entirely when no retention is configured.

use std::sync::Arc;

use crate::domain::{KeepJobs, QueueKeys};
use crate::port::QueueStore;
use crate::Result;

pub async fn finalize_job(
    store: &Arc<dyn QueueStore>,
    keys: &QueueKeys,
    job_id: &str,
    keep_jobs: &KeepJobs,
    target: &str,
    result_field: &str,
    result_value: &str,
    timestamp: i64,
) -> Result<()> {
    if keep_jobs.count == Some(0) {
        delete_job_and_subkeys(store, keys, job_id).await?;
        return Ok(());
    }

    let target_set = target_set_key(keys, target);
    let job_key = keys.job(job_id);

    store.zadd(&target_set, timestamp as f64, job_id).await?;
    store
        .hmset(
            &job_key,
            &[
                (result_field, result_value),
                ("finishedOn", timestamp.to_string().as_str()),
            ],
        )
        .await?;

    if let Some(age) = keep_jobs.age {
        let cutoff = (timestamp - age as i64) as f64;
        let stale = store.zrangebyscore_exclusive_max(&target_set, cutoff).await?;
        for stale_id in &stale {
            delete_job_and_subkeys(store, keys, stale_id).await?;
        }
        store.zremrangebyscore_exclusive_max(&target_set, cutoff).await?;
    }

    if let Some(count) = keep_jobs.count {
        let card = store.zcard(&target_set).await?;
        let excess = card - count as i64;
        if excess > 0 {
            let oldest = store.zrange_withscores(&target_set, 0, excess - 1).await?;
            for (stale_id, _) in oldest {
                store.zrem(&target_set, &stale_id).await?;
                delete_job_and_subkeys(store, keys, &stale_id).await?;
            }
        }
    }

    Ok(())
}

fn target_set_key(keys: &QueueKeys, target: &str) -> String {
    if target == "completed" {
        keys.completed()
    } else {
        keys.failed()
    }
}

async fn delete_job_and_subkeys(
    store: &Arc<dyn QueueStore>,
    keys: &QueueKeys,
    job_id: &str,
) -> Result<()> {
    let job = store.hgetall(&keys.job(job_id)).await?;

    store.delete(&keys.job(job_id)).await?;
    store.delete(&keys.logs(job_id)).await?;
    store.delete(&keys.processed(job_id)).await?;
    store.delete(&keys.dependencies(job_id)).await?;
    store.delete(&keys.results(job_id)).await?;

    if let Some(deid) = job.get("deid") {
        store.delete(&keys.debounce(deid)).await?;
    }

    if let Some(parent_key) = job.get("parentKey") {
        if let Some(parent_job_id) = parent_key.rsplit(':').next() {
            let prefix = parent_key
                .rsplit_once(':')
                .map(|(prefix, _)| prefix)
                .unwrap_or(parent_key);
            let parent_keys = QueueKeys::new(prefix);
            // Back-reference only: the parent's own retained results for
            // this child are left untouched (see DESIGN.md Open Question 2).
            store
                .srem(&parent_keys.dependencies(parent_job_id), &keys.job(job_id))
                .await?;
        }
    }

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
    async fn zero_count_deletes_job_entirely() {
        let store = store();
        let keys = QueueKeys::new("q");
        store.hset(&keys.job("1"), "atm", "1").await.unwrap();
        finalize_job(
            &store,
            &keys,
            "1",
            &KeepJobs {
                count: Some(0),
                age: None,
            },
            "completed",
            "returnvalue",
            "ok",
            1000,
        )
        .await
        .unwrap();
        assert!(!store.exists(&keys.job("1")).await.unwrap());
        assert_eq!(store.zcard(&keys.completed()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn retains_job_and_trims_by_count() {
        let store = store();
        let keys = QueueKeys::new("q");
        for i in 0..3 {
            store.hset(&keys.job(&i.to_string()), "atm", "1").await.unwrap();
            finalize_job(
                &store,
                &keys,
                &i.to_string(),
                &KeepJobs {
                    count: Some(2),
                    age: None,
                },
                "completed",
                "returnvalue",
                "ok",
                1000 + i,
            )
            .await
            .unwrap();
        }
        assert_eq!(store.zcard(&keys.completed()).await.unwrap(), 2);
        assert!(!store.exists(&keys.job("0")).await.unwrap());
        assert!(store.exists(&keys.job("2")).await.unwrap());
    }

    #[tokio::test]
    async fn none_count_retains_forever_trims_only_by_age() {
        let store = store();
        let keys = QueueKeys::new("q");
        store.hset(&keys.job("1"), "atm", "1").await.unwrap();
        finalize_job(
            &store,
            &keys,
            "1",
            &KeepJobs {
                count: None,
                age: Some(500),
            },
            "completed",
            "returnvalue",
            "ok",
            1000,
        )
        .await
        .unwrap();
        assert_eq!(store.zcard(&keys.completed()).await.unwrap(), 1);
    }
}
