// Redis-backed `QueueStore` adapter.
//
// Each trait method maps to exactly one Redis command (or, where the
// high-level `AsyncCommands` API doesn't cover the exact shape needed —
// `ZRANGEBYSCORE` with a `LIMIT`, `XADD`/`XTRIM` — a raw `redis::cmd`
// call). `map_redis_error` mirrors the teacher's `map_sqlx_error` helper:
// one place that turns a client-library error into the crate's `AppError`.

use std::collections::HashMap;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

use queue_core::error::AppError;
use queue_core::port::QueueStore;
use queue_core::Result;

fn map_redis_error(err: redis::RedisError) -> AppError {
    AppError::Store(err.to_string())
}

pub struct RedisQueueStore {
    conn: ConnectionManager,
}

impl RedisQueueStore {
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }

    fn conn(&self) -> ConnectionManager {
        self.conn.clone()
    }
}

#[async_trait]
impl QueueStore for RedisQueueStore {
    async fn hgetall(&self, key: &str) -> Result<HashMap<String, String>> {
        self.conn().hgetall(key).await.map_err(map_redis_error)
    }

    async fn hset(&self, key: &str, field: &str, value: &str) -> Result<()> {
        self.conn()
            .hset::<_, _, _, ()>(key, field, value)
            .await
            .map_err(map_redis_error)
    }

    async fn hmset(&self, key: &str, fields: &[(&str, &str)]) -> Result<()> {
        self.conn()
            .hset_multiple::<_, _, _, ()>(key, fields)
            .await
            .map_err(map_redis_error)
    }

    async fn hdel(&self, key: &str, field: &str) -> Result<()> {
        self.conn()
            .hdel::<_, _, ()>(key, field)
            .await
            .map_err(map_redis_error)
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.conn().del::<_, ()>(key).await.map_err(map_redis_error)
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        self.conn().exists(key).await.map_err(map_redis_error)
    }

    async fn lrem(&self, key: &str, value: &str) -> Result<i64> {
        // count = -1: remove the first match searching from the tail.
        self.conn()
            .lrem(key, -1, value)
            .await
            .map_err(map_redis_error)
    }

    async fn rpoplpush(&self, src: &str, dst: &str) -> Result<Option<String>> {
        self.conn()
            .rpoplpush(src, dst)
            .await
            .map_err(map_redis_error)
    }

    async fn lpush(&self, key: &str, value: &str) -> Result<()> {
        self.conn()
            .lpush::<_, _, ()>(key, value)
            .await
            .map_err(map_redis_error)
    }

    async fn rpush(&self, key: &str, value: &str) -> Result<()> {
        self.conn()
            .rpush::<_, _, ()>(key, value)
            .await
            .map_err(map_redis_error)
    }

    async fn llen(&self, key: &str) -> Result<i64> {
        self.conn().llen(key).await.map_err(map_redis_error)
    }

    async fn lset(&self, key: &str, index: i64, value: &str) -> Result<()> {
        self.conn()
            .lset::<_, _, ()>(key, index, value)
            .await
            .map_err(map_redis_error)
    }

    async fn ltrim(&self, key: &str, len: u64) -> Result<()> {
        self.conn()
            .ltrim::<_, ()>(key, 0, len as isize - 1)
            .await
            .map_err(map_redis_error)
    }

    async fn sadd(&self, key: &str, member: &str) -> Result<i64> {
        self.conn().sadd(key, member).await.map_err(map_redis_error)
    }

    async fn srem(&self, key: &str, member: &str) -> Result<i64> {
        self.conn().srem(key, member).await.map_err(map_redis_error)
    }

    async fn scard(&self, key: &str) -> Result<i64> {
        self.conn().scard(key).await.map_err(map_redis_error)
    }

    async fn sismember(&self, key: &str, member: &str) -> Result<bool> {
        self.conn()
            .sismember(key, member)
            .await
            .map_err(map_redis_error)
    }

    async fn zadd(&self, key: &str, score: f64, member: &str) -> Result<()> {
        self.conn()
            .zadd::<_, _, _, ()>(key, member, score)
            .await
            .map_err(map_redis_error)
    }

    async fn zrem(&self, key: &str, member: &str) -> Result<i64> {
        self.conn().zrem(key, member).await.map_err(map_redis_error)
    }

    async fn zcard(&self, key: &str) -> Result<i64> {
        self.conn().zcard(key).await.map_err(map_redis_error)
    }

    async fn zrangebyscore(
        &self,
        key: &str,
        min: f64,
        max: f64,
        limit: Option<i64>,
    ) -> Result<Vec<String>> {
        let mut cmd = redis::cmd("ZRANGEBYSCORE");
        cmd.arg(key).arg(min).arg(max);
        if let Some(limit) = limit {
            cmd.arg("LIMIT").arg(0).arg(limit);
        }
        cmd.query_async(&mut self.conn()).await.map_err(map_redis_error)
    }

    async fn zpopmin(&self, key: &str) -> Result<Option<(String, f64)>> {
        let result: Vec<(String, f64)> = self
            .conn()
            .zpopmin(key, 1)
            .await
            .map_err(map_redis_error)?;
        Ok(result.into_iter().next())
    }

    async fn zrange_withscores(
        &self,
        key: &str,
        start: i64,
        stop: i64,
    ) -> Result<Vec<(String, f64)>> {
        self.conn()
            .zrange_withscores(key, start as isize, stop as isize)
            .await
            .map_err(map_redis_error)
    }

    async fn zremrangebyscore(&self, key: &str, min: f64, max: f64) -> Result<()> {
        self.conn()
            .zrembyscore::<_, _, _, ()>(key, min, max)
            .await
            .map_err(map_redis_error)
    }

    async fn zrangebyscore_exclusive_max(&self, key: &str, max: f64) -> Result<Vec<String>> {
        let mut cmd = redis::cmd("ZRANGEBYSCORE");
        cmd.arg(key).arg("-inf").arg(format!("({max}"));
        cmd.query_async(&mut self.conn()).await.map_err(map_redis_error)
    }

    async fn zremrangebyscore_exclusive_max(&self, key: &str, max: f64) -> Result<()> {
        let mut cmd = redis::cmd("ZREMRANGEBYSCORE");
        cmd.arg(key).arg("-inf").arg(format!("({max}"));
        cmd.query_async::<()>(&mut self.conn()).await.map_err(map_redis_error)
    }

    async fn incr(&self, key: &str) -> Result<i64> {
        self.conn().incr(key, 1).await.map_err(map_redis_error)
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.conn().get(key).await.map_err(map_redis_error)
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.conn()
            .set::<_, _, ()>(key, value)
            .await
            .map_err(map_redis_error)
    }

    async fn pexpire(&self, key: &str, millis: i64) -> Result<()> {
        self.conn()
            .pexpire::<_, ()>(key, millis)
            .await
            .map_err(map_redis_error)
    }

    async fn pttl(&self, key: &str) -> Result<i64> {
        self.conn().pttl(key).await.map_err(map_redis_error)
    }

    async fn xadd(&self, key: &str, fields: Vec<(String, String)>) -> Result<()> {
        let mut cmd = redis::cmd("XADD");
        cmd.arg(key).arg("*");
        for (field, value) in fields {
            cmd.arg(field).arg(value);
        }
        cmd.query_async::<_, String>(&mut self.conn())
            .await
            .map_err(map_redis_error)?;
        Ok(())
    }

    async fn xtrim_approx(&self, key: &str, maxlen: u64) -> Result<()> {
        redis::cmd("XTRIM")
            .arg(key)
            .arg("MAXLEN")
            .arg("~")
            .arg(maxlen)
            .query_async::<_, i64>(&mut self.conn())
            .await
            .map_err(map_redis_error)?;
        Ok(())
    }
}
