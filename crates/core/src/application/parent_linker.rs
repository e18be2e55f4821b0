// Parent/Child Linker (component 4.3)
//
// Propagates a child's outcome to its parent job. The parent may live in a
// different queue prefix than the child (cross-queue safety): every
// parent-side key is derived from the parent's own `QueueKeys`, never from
// the child's.

use std::sync::Arc;

use crate::domain::{priority_score, Event, EventKind, JobRecord, ParentRef, QueueKeys};
use crate::port::QueueStore;
use crate::Result;

/// Called when a child job completes successfully. Records the result
/// against the parent and, if this was the parent's last pending
/// dependency, moves the parent out of its waiting-for-children state and
/// into its own wait/priority list.
pub async fn update_parent_deps_if_needed(
    store: &Arc<dyn QueueStore>,
    child_keys: &QueueKeys,
    child_id: &str,
    parent: &ParentRef,
    result: &str,
    timestamp: i64,
) -> Result<()> {
    let child_key = child_keys.job(child_id);
    let parent_keys = QueueKeys::new(parent.queue_key.clone());
    store
        .rpush(&parent_keys.results(&parent_job_id(parent)), result)
        .await?;
    store
        .hset(&parent_keys.processed(&parent_job_id(parent)), &child_key, result)
        .await?;

    let deps_set = parent_keys.dependencies(&parent_job_id(parent));
    let removed = store.srem(&deps_set, &child_key).await?;
    if removed == 0 {
        return Ok(());
    }
    if store.scard(&deps_set).await? != 0 {
        return Ok(());
    }

    let parent_fields = store.hgetall(&parent.parent_key).await?;
    if parent_fields.is_empty() {
        return Ok(());
    }
    activate_parent(store, &parent_keys, &parent_job_id(parent), &parent_fields, timestamp).await
}

/// Called when a child job fails. Depending on the parent's configured
/// failure policy, either propagates the failure up to the parent or
/// treats the dependency as satisfied so the parent can still proceed.
pub fn move_parent_if_needed<'a>(
    store: &'a Arc<dyn QueueStore>,
    child_keys: &'a QueueKeys,
    child_id: &'a str,
    child: &'a JobRecord,
    parent: &'a ParentRef,
    failed_reason: &'a str,
    timestamp: i64,
) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<()>> + Send + 'a>> {
    Box::pin(async move {
        let child_key = child_keys.job(child_id);
        let parent_keys = QueueKeys::new(parent.queue_key.clone());
        let parent_job_id = parent_job_id(parent);

        if child.fail_parent_on_failure() {
            let parent_fields = store.hgetall(&parent.parent_key).await?;
            if parent_fields.is_empty() {
                return Ok(());
            }
            // The parent has no lock and is not in the active list (it is
            // waiting on children), so it is finalized directly rather
            // than through the full finish-active-job orchestrator, which
            // requires both.
            crate::application::finalizer::finalize_job(
                store,
                &parent_keys,
                &parent_job_id,
                &crate::domain::KeepJobs::default(),
                "failed",
                "failedReason",
                failed_reason,
                timestamp,
            )
            .await?;
            crate::application::event_emitter::emit(
                store,
                &parent_keys,
                Event::new(
                    parent_job_id.clone(),
                    EventKind::Failed {
                        failed_reason: failed_reason.to_string(),
                        prev: "waiting-children".to_string(),
                    },
                ),
            )
            .await?;

            // Recurse: the parent may itself have a parent.
            let parent_record = JobRecord::new(parent_fields);
            if let Some(grandparent) = parent_record.parent() {
                move_parent_if_needed(
                    store,
                    &parent_keys,
                    &parent_job_id,
                    &parent_record,
                    &grandparent,
                    failed_reason,
                    timestamp,
                )
                .await?;
            }
            return Ok(());
        }

        if child.ignore_dependency_on_failure() {
            let deps_set = parent_keys.dependencies(&parent_job_id);
            let removed = store.srem(&deps_set, &child_key).await?;
            if removed != 0 && store.scard(&deps_set).await? == 0 {
                let parent_fields = store.hgetall(&parent.parent_key).await?;
                if !parent_fields.is_empty() {
                    activate_parent(store, &parent_keys, &parent_job_id, &parent_fields, timestamp)
                        .await?;
                }
            }
        }

        // Otherwise the parent stays blocked on this dependency.
        Ok(())
    })
}

fn parent_job_id(parent: &ParentRef) -> String {
    parent
        .parent_key
        .rsplit(':')
        .next()
        .unwrap_or(&parent.parent_key)
        .to_string()
}

async fn activate_parent(
    store: &Arc<dyn QueueStore>,
    parent_keys: &QueueKeys,
    parent_job_id: &str,
    parent_fields: &std::collections::HashMap<String, String>,
    timestamp: i64,
) -> Result<()> {
    let meta = store.hgetall(&parent_keys.meta()).await?;
    let paused = meta.get("paused").map(|v| v == "1").unwrap_or(false);
    let concurrency: i64 = meta
        .get("concurrency")
        .and_then(|v| v.parse().ok())
        .unwrap_or(i64::MAX);
    let active_len = store.llen(&parent_keys.active()).await?;
    let maxed = active_len >= concurrency;

    let priority: u64 = parent_fields
        .get("priority")
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);

    if priority == 0 {
        store.rpush(&parent_keys.wait(), parent_job_id).await?;
    } else {
        let counter = store.incr(&parent_keys.priority_counter()).await?;
        store
            .zadd(
                &parent_keys.prioritized(),
                priority_score(priority, counter),
                parent_job_id,
            )
            .await?;
    }

    if !paused && !maxed {
        store.set(&parent_keys.marker(), &timestamp.to_string()).await?;
    }

    crate::application::event_emitter::emit(
        store,
        parent_keys,
        Event::new(
            parent_job_id.to_string(),
            EventKind::Waiting {
                prev: "waiting-children".to_string(),
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
    use std::collections::HashMap;

    fn parent_ref(prefix: &str, job_id: &str) -> ParentRef {
        ParentRef {
            parent_key: format!("{prefix}:{job_id}"),
            queue_key: prefix.to_string(),
        }
    }

    #[tokio::test]
    async fn last_dependency_reactivates_parent() {
        let fake = Arc::new(FakeQueueStore::new());
        let store: Arc<dyn QueueStore> = fake.clone();
        let child_keys = QueueKeys::new("childq");
        let parent_keys = QueueKeys::new("parentq");
        let parent = parent_ref("parentq", "p1");

        store
            .sadd(&parent_keys.dependencies("p1"), &child_keys.job("c1"))
            .await
            .unwrap();
        let mut parent_fields = HashMap::new();
        parent_fields.insert("priority".to_string(), "0".to_string());
        for (k, v) in parent_fields {
            store.hset(&parent.parent_key, &k, &v).await.unwrap();
        }

        update_parent_deps_if_needed(&store, &child_keys, "c1", &parent, "42", 1000)
            .await
            .unwrap();

        assert_eq!(
            store.scard(&parent_keys.dependencies("p1")).await.unwrap(),
            0
        );
        assert_eq!(fake.list_contents(&parent_keys.wait()), vec!["p1"]);
        let events = fake.stream_events(&parent_keys.events());
        assert_eq!(events.len(), 1);
    }

    #[tokio::test]
    async fn remaining_dependency_does_not_reactivate_parent() {
        let fake = Arc::new(FakeQueueStore::new());
        let store: Arc<dyn QueueStore> = fake.clone();
        let child_keys = QueueKeys::new("childq");
        let parent_keys = QueueKeys::new("parentq");
        let parent = parent_ref("parentq", "p1");

        store
            .sadd(&parent_keys.dependencies("p1"), &child_keys.job("c1"))
            .await
            .unwrap();
        store
            .sadd(&parent_keys.dependencies("p1"), &child_keys.job("c2"))
            .await
            .unwrap();
        store.hset(&parent.parent_key, "priority", "0").await.unwrap();

        update_parent_deps_if_needed(&store, &child_keys, "c1", &parent, "42", 1000)
            .await
            .unwrap();

        assert_eq!(
            store.scard(&parent_keys.dependencies("p1")).await.unwrap(),
            1
        );
        assert!(fake.list_contents(&parent_keys.wait()).is_empty());
    }
}
