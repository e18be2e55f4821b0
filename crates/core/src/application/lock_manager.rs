// Lock Manager (component 4.1)
//
// Validates and releases a worker's ownership token on a job; removes the
// job id from the stalled-watch set.

use std::sync::Arc;

use crate::domain::{QueueError, QueueKeys};
use crate::port::QueueStore;
use crate::Result;

pub async fn release_lock(
    store: &Arc<dyn QueueStore>,
    keys: &QueueKeys,
    job_id: &str,
    token: &str,
) -> Result<()> {
    let lock_key = keys.lock(job_id);
    match store.get(&lock_key).await? {
        None => Err(QueueError::MissingLock.into()),
        Some(held) if held != token => Err(QueueError::NotOwner.into()),
        Some(_) => {
            store.delete(&lock_key).await?;
            store.srem(&keys.stalled(), job_id).await?;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::store::mocks::FakeQueueStore;

    fn store() -> Arc<dyn QueueStore> {
        Arc::new(FakeQueueStore::new())
    }

    #[tokio::test]
    async fn missing_lock_is_reported() {
        let store = store();
        let keys = QueueKeys::new("q");
        let err = release_lock(&store, &keys, "1", "tok").await.unwrap_err();
        assert_eq!(err.code(), Some(QueueError::MissingLock.code()));
    }

    #[tokio::test]
    async fn wrong_token_is_rejected() {
        let store = store();
        let keys = QueueKeys::new("q");
        store.set(&keys.lock("1"), "owner-token").await.unwrap();
        let err = release_lock(&store, &keys, "1", "other-token")
            .await
            .unwrap_err();
        assert_eq!(err.code(), Some(QueueError::NotOwner.code()));
    }

    #[tokio::test]
    async fn matching_token_releases_lock_and_clears_stalled() {
        let store = store();
        let keys = QueueKeys::new("q");
        store.set(&keys.lock("1"), "tok").await.unwrap();
        store.sadd(&keys.stalled(), "1").await.unwrap();
        release_lock(&store, &keys, "1", "tok").await.unwrap();
        assert_eq!(store.get(&keys.lock("1")).await.unwrap(), None);
        assert_eq!(store.scard(&keys.stalled()).await.unwrap(), 0);
    }
}
