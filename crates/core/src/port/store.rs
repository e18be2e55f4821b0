// Store Port - the key-value primitives the application layer composes
// into atomic procedures.
//
// Each method maps onto a single store command (hash/list/set/sorted-set/
// string/stream). The application layer never talks to a store client
// directly; only `infra-redis` implements this trait against a real
// connection.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::Result;

#[async_trait]
pub trait QueueStore: Send + Sync {
    // -- Hash --
    async fn hgetall(&self, key: &str) -> Result<HashMap<String, String>>;
    async fn hset(&self, key: &str, field: &str, value: &str) -> Result<()>;
    async fn hmset(&self, key: &str, fields: &[(&str, &str)]) -> Result<()>;
    async fn hdel(&self, key: &str, field: &str) -> Result<()>;
    async fn delete(&self, key: &str) -> Result<()>;
    async fn exists(&self, key: &str) -> Result<bool>;

    // -- List --
    /// Removes the first occurrence of `value` searching from the tail;
    /// returns the number of elements removed (0 or 1 in practice).
    async fn lrem(&self, key: &str, value: &str) -> Result<i64>;
    async fn rpoplpush(&self, src: &str, dst: &str) -> Result<Option<String>>;
    async fn lpush(&self, key: &str, value: &str) -> Result<()>;
    async fn rpush(&self, key: &str, value: &str) -> Result<()>;
    async fn llen(&self, key: &str) -> Result<i64>;
    /// Overwrites the element at `index` (0 = head).
    async fn lset(&self, key: &str, index: i64, value: &str) -> Result<()>;
    /// Keeps only elements `[0, len)`, dropping the tail.
    async fn ltrim(&self, key: &str, len: u64) -> Result<()>;

    // -- Set --
    async fn sadd(&self, key: &str, member: &str) -> Result<i64>;
    async fn srem(&self, key: &str, member: &str) -> Result<i64>;
    async fn scard(&self, key: &str) -> Result<i64>;
    async fn sismember(&self, key: &str, member: &str) -> Result<bool>;

    // -- Sorted set --
    async fn zadd(&self, key: &str, score: f64, member: &str) -> Result<()>;
    async fn zrem(&self, key: &str, member: &str) -> Result<i64>;
    async fn zcard(&self, key: &str) -> Result<i64>;
    /// Members with score in `[min, max]`, ordered ascending, optionally
    /// capped at `limit`.
    async fn zrangebyscore(
        &self,
        key: &str,
        min: f64,
        max: f64,
        limit: Option<i64>,
    ) -> Result<Vec<String>>;
    /// Lowest-score member and its score, removed atomically.
    async fn zpopmin(&self, key: &str) -> Result<Option<(String, f64)>>;
    async fn zrange_withscores(&self, key: &str, start: i64, stop: i64)
        -> Result<Vec<(String, f64)>>;
    async fn zremrangebyscore(&self, key: &str, min: f64, max: f64) -> Result<()>;
    /// Members with score in `[-inf, max)`, i.e. strictly older than `max`;
    /// used for age-based retention where a job finished exactly at the
    /// cutoff must be kept, not swept.
    async fn zrangebyscore_exclusive_max(&self, key: &str, max: f64) -> Result<Vec<String>>;
    /// Removes members with score in `[-inf, max)`, mirroring
    /// `zrangebyscore_exclusive_max`'s bound.
    async fn zremrangebyscore_exclusive_max(&self, key: &str, max: f64) -> Result<()>;

    // -- String --
    async fn incr(&self, key: &str) -> Result<i64>;
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> Result<()>;
    async fn pexpire(&self, key: &str, millis: i64) -> Result<()>;
    async fn pttl(&self, key: &str) -> Result<i64>;

    // -- Stream --
    async fn xadd(&self, key: &str, fields: Vec<(String, String)>) -> Result<()>;
    async fn xtrim_approx(&self, key: &str, maxlen: u64) -> Result<()>;
}

// ============================================================================
// In-memory fake for testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct State {
        hashes: HashMap<String, HashMap<String, String>>,
        lists: HashMap<String, Vec<String>>,
        sets: HashMap<String, std::collections::HashSet<String>>,
        zsets: HashMap<String, Vec<(String, f64)>>,
        strings: HashMap<String, String>,
        expirations: HashMap<String, i64>,
        streams: HashMap<String, Vec<Vec<(String, String)>>>,
    }

    /// In-memory `QueueStore` for unit and integration tests. Not meant to
    /// model TTL expiry precisely: `pttl` reports whatever was last set via
    /// `pexpire`/`incr`-with-expire and does not count down on its own.
    #[derive(Default)]
    pub struct FakeQueueStore {
        state: Mutex<State>,
    }

    impl FakeQueueStore {
        pub fn new() -> Self {
            Self::default()
        }
    }

    #[async_trait]
    impl QueueStore for FakeQueueStore {
        async fn hgetall(&self, key: &str) -> Result<HashMap<String, String>> {
            Ok(self
                .state
                .lock()
                .unwrap()
                .hashes
                .get(key)
                .cloned()
                .unwrap_or_default())
        }

        async fn hset(&self, key: &str, field: &str, value: &str) -> Result<()> {
            self.state
                .lock()
                .unwrap()
                .hashes
                .entry(key.to_string())
                .or_default()
                .insert(field.to_string(), value.to_string());
            Ok(())
        }

        async fn hmset(&self, key: &str, fields: &[(&str, &str)]) -> Result<()> {
            let mut state = self.state.lock().unwrap();
            let entry = state.hashes.entry(key.to_string()).or_default();
            for (field, value) in fields {
                entry.insert(field.to_string(), value.to_string());
            }
            Ok(())
        }

        async fn hdel(&self, key: &str, field: &str) -> Result<()> {
            if let Some(h) = self.state.lock().unwrap().hashes.get_mut(key) {
                h.remove(field);
            }
            Ok(())
        }

        async fn delete(&self, key: &str) -> Result<()> {
            let mut state = self.state.lock().unwrap();
            state.hashes.remove(key);
            state.lists.remove(key);
            state.sets.remove(key);
            state.zsets.remove(key);
            state.strings.remove(key);
            Ok(())
        }

        async fn exists(&self, key: &str) -> Result<bool> {
            let state = self.state.lock().unwrap();
            Ok(state.hashes.contains_key(key)
                || state.lists.contains_key(key)
                || state.sets.contains_key(key)
                || state.zsets.contains_key(key)
                || state.strings.contains_key(key))
        }

        async fn lrem(&self, key: &str, value: &str) -> Result<i64> {
            let mut state = self.state.lock().unwrap();
            if let Some(list) = state.lists.get_mut(key) {
                if let Some(pos) = list.iter().rposition(|v| v == value) {
                    list.remove(pos);
                    return Ok(1);
                }
            }
            Ok(0)
        }

        async fn rpoplpush(&self, src: &str, dst: &str) -> Result<Option<String>> {
            let mut state = self.state.lock().unwrap();
            let popped = state.lists.get_mut(src).and_then(|l| l.pop());
            if let Some(ref v) = popped {
                state.lists.entry(dst.to_string()).or_default().insert(0, v.clone());
            }
            Ok(popped)
        }

        async fn lpush(&self, key: &str, value: &str) -> Result<()> {
            self.state
                .lock()
                .unwrap()
                .lists
                .entry(key.to_string())
                .or_default()
                .insert(0, value.to_string());
            Ok(())
        }

        async fn rpush(&self, key: &str, value: &str) -> Result<()> {
            self.state
                .lock()
                .unwrap()
                .lists
                .entry(key.to_string())
                .or_default()
                .push(value.to_string());
            Ok(())
        }

        async fn llen(&self, key: &str) -> Result<i64> {
            Ok(self
                .state
                .lock()
                .unwrap()
                .lists
                .get(key)
                .map(|l| l.len() as i64)
                .unwrap_or(0))
        }

        async fn lset(&self, key: &str, index: i64, value: &str) -> Result<()> {
            let mut state = self.state.lock().unwrap();
            if let Some(list) = state.lists.get_mut(key) {
                let idx = if index < 0 {
                    (list.len() as i64 + index).max(0) as usize
                } else {
                    index as usize
                };
                if let Some(slot) = list.get_mut(idx) {
                    *slot = value.to_string();
                }
            }
            Ok(())
        }

        async fn ltrim(&self, key: &str, len: u64) -> Result<()> {
            if let Some(list) = self.state.lock().unwrap().lists.get_mut(key) {
                list.truncate(len as usize);
            }
            Ok(())
        }

        async fn sadd(&self, key: &str, member: &str) -> Result<i64> {
            let mut state = self.state.lock().unwrap();
            let set = state.sets.entry(key.to_string()).or_default();
            Ok(if set.insert(member.to_string()) { 1 } else { 0 })
        }

        async fn srem(&self, key: &str, member: &str) -> Result<i64> {
            let mut state = self.state.lock().unwrap();
            if let Some(set) = state.sets.get_mut(key) {
                return Ok(if set.remove(member) { 1 } else { 0 });
            }
            Ok(0)
        }

        async fn scard(&self, key: &str) -> Result<i64> {
            Ok(self
                .state
                .lock()
                .unwrap()
                .sets
                .get(key)
                .map(|s| s.len() as i64)
                .unwrap_or(0))
        }

        async fn sismember(&self, key: &str, member: &str) -> Result<bool> {
            Ok(self
                .state
                .lock()
                .unwrap()
                .sets
                .get(key)
                .map(|s| s.contains(member))
                .unwrap_or(false))
        }

        async fn zadd(&self, key: &str, score: f64, member: &str) -> Result<()> {
            let mut state = self.state.lock().unwrap();
            let zset = state.zsets.entry(key.to_string()).or_default();
            zset.retain(|(m, _)| m != member);
            zset.push((member.to_string(), score));
            zset.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap());
            Ok(())
        }

        async fn zrem(&self, key: &str, member: &str) -> Result<i64> {
            let mut state = self.state.lock().unwrap();
            if let Some(zset) = state.zsets.get_mut(key) {
                let before = zset.len();
                zset.retain(|(m, _)| m != member);
                return Ok((before - zset.len()) as i64);
            }
            Ok(0)
        }

        async fn zcard(&self, key: &str) -> Result<i64> {
            Ok(self
                .state
                .lock()
                .unwrap()
                .zsets
                .get(key)
                .map(|z| z.len() as i64)
                .unwrap_or(0))
        }

        async fn zrangebyscore(
            &self,
            key: &str,
            min: f64,
            max: f64,
            limit: Option<i64>,
        ) -> Result<Vec<String>> {
            let state = self.state.lock().unwrap();
            let mut out: Vec<String> = state
                .zsets
                .get(key)
                .map(|z| {
                    z.iter()
                        .filter(|(_, s)| *s >= min && *s <= max)
                        .map(|(m, _)| m.clone())
                        .collect()
                })
                .unwrap_or_default();
            if let Some(limit) = limit {
                out.truncate(limit.max(0) as usize);
            }
            Ok(out)
        }

        async fn zpopmin(&self, key: &str) -> Result<Option<(String, f64)>> {
            let mut state = self.state.lock().unwrap();
            if let Some(zset) = state.zsets.get_mut(key) {
                if !zset.is_empty() {
                    return Ok(Some(zset.remove(0)));
                }
            }
            Ok(None)
        }

        async fn zrange_withscores(
            &self,
            key: &str,
            start: i64,
            stop: i64,
        ) -> Result<Vec<(String, f64)>> {
            let state = self.state.lock().unwrap();
            let zset = match state.zsets.get(key) {
                Some(z) => z,
                None => return Ok(Vec::new()),
            };
            let len = zset.len() as i64;
            if len == 0 {
                return Ok(Vec::new());
            }
            let norm = |i: i64| -> i64 {
                if i < 0 {
                    (len + i).max(0)
                } else {
                    i.min(len - 1)
                }
            };
            let (s, e) = (norm(start), norm(stop));
            if s > e {
                return Ok(Vec::new());
            }
            Ok(zset[s as usize..=e as usize].to_vec())
        }

        async fn zremrangebyscore(&self, key: &str, min: f64, max: f64) -> Result<()> {
            if let Some(zset) = self.state.lock().unwrap().zsets.get_mut(key) {
                zset.retain(|(_, s)| !(*s >= min && *s <= max));
            }
            Ok(())
        }

        async fn zrangebyscore_exclusive_max(&self, key: &str, max: f64) -> Result<Vec<String>> {
            let state = self.state.lock().unwrap();
            Ok(state
                .zsets
                .get(key)
                .map(|z| {
                    z.iter()
                        .filter(|(_, s)| *s < max)
                        .map(|(m, _)| m.clone())
                        .collect()
                })
                .unwrap_or_default())
        }

        async fn zremrangebyscore_exclusive_max(&self, key: &str, max: f64) -> Result<()> {
            if let Some(zset) = self.state.lock().unwrap().zsets.get_mut(key) {
                zset.retain(|(_, s)| *s >= max);
            }
            Ok(())
        }

        async fn incr(&self, key: &str) -> Result<i64> {
            let mut state = self.state.lock().unwrap();
            let entry = state.strings.entry(key.to_string()).or_insert_with(|| "0".to_string());
            let next = entry.parse::<i64>().unwrap_or(0) + 1;
            *entry = next.to_string();
            Ok(next)
        }

        async fn get(&self, key: &str) -> Result<Option<String>> {
            Ok(self.state.lock().unwrap().strings.get(key).cloned())
        }

        async fn set(&self, key: &str, value: &str) -> Result<()> {
            self.state
                .lock()
                .unwrap()
                .strings
                .insert(key.to_string(), value.to_string());
            Ok(())
        }

        async fn pexpire(&self, key: &str, millis: i64) -> Result<()> {
            self.state
                .lock()
                .unwrap()
                .expirations
                .insert(key.to_string(), millis);
            Ok(())
        }

        async fn pttl(&self, key: &str) -> Result<i64> {
            Ok(self
                .state
                .lock()
                .unwrap()
                .expirations
                .get(key)
                .copied()
                .unwrap_or(-2))
        }

        async fn xadd(&self, key: &str, fields: Vec<(String, String)>) -> Result<()> {
            self.state
                .lock()
                .unwrap()
                .streams
                .entry(key.to_string())
                .or_default()
                .push(fields);
            Ok(())
        }

        async fn xtrim_approx(&self, key: &str, maxlen: u64) -> Result<()> {
            if let Some(stream) = self.state.lock().unwrap().streams.get_mut(key) {
                let maxlen = maxlen as usize;
                if stream.len() > maxlen {
                    let drop = stream.len() - maxlen;
                    stream.drain(0..drop);
                }
            }
            Ok(())
        }
    }

    impl FakeQueueStore {
        /// Test helper: read back the full contents of a stream in append
        /// order, for asserting on emitted events.
        pub fn stream_events(&self, key: &str) -> Vec<Vec<(String, String)>> {
            self.state
                .lock()
                .unwrap()
                .streams
                .get(key)
                .cloned()
                .unwrap_or_default()
        }

        /// Test helper: read back a list's contents in order.
        pub fn list_contents(&self, key: &str) -> Vec<String> {
            self.state.lock().unwrap().lists.get(key).cloned().unwrap_or_default()
        }
    }
}
