// Metrics Collector (component 4.6)
//
// Maintains a rolling window of per-minute counts. `metricsKey` holds the
// running total plus the last bucketed minute; `<metricsKey>:data` holds
// one entry per minute, newest at the head, capped at `maxMetricsSize`.

use std::sync::Arc;

use crate::domain::QueueKeys;
use crate::port::QueueStore;
use crate::Result;

pub async fn record(
    store: &Arc<dyn QueueStore>,
    keys: &QueueKeys,
    kind: &str,
    timestamp: i64,
    max_metrics_size: Option<u64>,
) -> Result<()> {
    let Some(max_size) = max_metrics_size else {
        return Ok(());
    };

    let metrics_key = keys.metrics(kind);
    let data_key = keys.metrics_data(kind);

    let fields = store.hgetall(&metrics_key).await?;
    let prev_ts: i64 = fields
        .get("prevTS")
        .and_then(|v| v.parse().ok())
        .unwrap_or(-1);
    let count: i64 = fields.get("count").and_then(|v| v.parse().ok()).unwrap_or(0);
    let prev_count: i64 = fields
        .get("prevCount")
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);

    let minute = timestamp / 60_000;
    let new_count = count + 1;

    if prev_ts < 0 {
        store.lpush(&data_key, "1").await?;
    } else if minute == prev_ts {
        let delta = new_count - prev_count;
        store.lset(&data_key, 0, &delta.to_string()).await?;
    } else {
        let elapsed = (minute - prev_ts).max(1);
        for _ in 1..elapsed {
            store.lpush(&data_key, "0").await?;
        }
        store
            .lpush(&data_key, &(new_count - prev_count).to_string())
            .await?;
    }
    store.ltrim(&data_key, max_size).await?;

    store
        .hmset(
            &metrics_key,
            &[
                ("count", new_count.to_string().as_str()),
                ("prevTS", minute.to_string().as_str()),
                ("prevCount", new_count.to_string().as_str()),
            ],
        )
        .await?;

    Ok(())
}
