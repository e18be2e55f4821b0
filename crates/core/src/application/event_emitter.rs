// Event Emitter (component 4.5)
//
// Appends structured events to the capped event stream. The stream is
// trimmed once at procedure entry; nothing trims after emission within the
// same procedure, so a procedure's own events always survive its own trim.

use std::sync::Arc;

use crate::domain::{Event, QueueKeys};
use crate::port::QueueStore;
use crate::Result;

pub async fn trim_events(
    store: &Arc<dyn QueueStore>,
    keys: &QueueKeys,
    max_len_events: Option<u64>,
) -> Result<()> {
    if let Some(max_len) = max_len_events {
        store.xtrim_approx(&keys.events(), max_len).await?;
    }
    Ok(())
}

pub async fn emit(store: &Arc<dyn QueueStore>, keys: &QueueKeys, event: Event) -> Result<()> {
    store.xadd(&keys.events(), event.into_fields()).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::EventKind;
    use crate::port::store::mocks::FakeQueueStore;

    #[tokio::test]
    async fn emits_event_with_flattened_fields() {
        let fake = Arc::new(FakeQueueStore::new());
        let store: Arc<dyn QueueStore> = fake.clone();
        let keys = QueueKeys::new("q");
        emit(
            &store,
            &keys,
            Event::new(
                "1",
                EventKind::Completed {
                    return_value: "ok".into(),
                },
            ),
        )
        .await
        .unwrap();
        let events = fake.stream_events(&keys.events());
        assert_eq!(events.len(), 1);
        assert!(events[0].contains(&("event".to_string(), "completed".to_string())));
    }
}
