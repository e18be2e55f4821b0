// Redis connection bring-up
//
// Env-var-configurable, mirroring the teacher's SQLite pool bring-up
// convention (one env var per knob, sane defaults, WAL-equivalent client
// behavior delegated to the `redis` crate's connection manager).

use redis::aio::ConnectionManager;
use redis::Client;

fn env_var(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

/// Builds a `ConnectionManager` from `QUEUE_REDIS_URL` (default
/// `redis://127.0.0.1:6379`). The connection manager auto-reconnects and
/// is safe to clone and share across tasks.
pub async fn connect() -> Result<ConnectionManager, redis::RedisError> {
    let url = env_var("QUEUE_REDIS_URL", "redis://127.0.0.1:6379");
    tracing::info!(url = %url, "connecting to redis");
    let client = Client::open(url)?;
    client.get_connection_manager().await
}
