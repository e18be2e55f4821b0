// Active-List Manager (component 4.2)
//
// Guarantees the job is present in the active list before letting a
// transition proceed; removes it once the transition is committed.

use std::sync::Arc;

use crate::domain::{QueueError, QueueKeys};
use crate::port::QueueStore;
use crate::Result;

pub async fn remove_from_active(
    store: &Arc<dyn QueueStore>,
    keys: &QueueKeys,
    job_id: &str,
) -> Result<()> {
    let removed = store.lrem(&keys.active(), job_id).await?;
    if removed == 0 {
        return Err(QueueError::NotActive.into());
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
    async fn removes_job_present_in_active_list() {
        let store = store();
        let keys = QueueKeys::new("q");
        store.rpush(&keys.active(), "1").await.unwrap();
        remove_from_active(&store, &keys, "1").await.unwrap();
        assert_eq!(store.llen(&keys.active()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn rejects_job_not_in_active_list() {
        let store = store();
        let keys = QueueKeys::new("q");
        let err = remove_from_active(&store, &keys, "missing")
            .await
            .unwrap_err();
        assert_eq!(err.code(), Some(QueueError::NotActive.code()));
    }
}
