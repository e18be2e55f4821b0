//! Queue Daemon - Main Entry Point
//!
//! Composition root: wires the Redis-backed store into a QueueEngine and
//! exposes the two procedures over JSON-RPC.

mod telemetry;

use std::sync::Arc;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use queue_api_rpc::{server::RpcServerConfig, RpcServer};
use queue_core::application::QueueEngine;
use queue_core::port::QueueStore;
use queue_infra_redis::RedisQueueStore;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    let log_format = std::env::var("QUEUE_LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("queue=info"))
        .expect("Failed to create env filter");

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().pretty())
                .init();
        }
    }

    info!("Queue daemon v{} starting...", VERSION);

    if let Err(e) = telemetry::init_telemetry() {
        tracing::warn!(error = ?e, "Failed to initialize OpenTelemetry (continuing without it)");
    }

    let rpc_port: u16 = std::env::var("QUEUE_RPC_PORT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(9528);

    info!("Connecting to Redis...");
    let conn = queue_infra_redis::connect()
        .await
        .map_err(|e| anyhow::anyhow!("Redis connection failed: {}", e))?;
    let store: Arc<dyn QueueStore> = Arc::new(RedisQueueStore::new(conn));

    let engine = Arc::new(QueueEngine::new(store));

    info!("Starting JSON-RPC server...");
    let rpc_config = RpcServerConfig {
        port: rpc_port,
        ..Default::default()
    };
    let rpc_server = RpcServer::new(rpc_config, engine);
    let rpc_handle = rpc_server
        .start()
        .await
        .map_err(|e| anyhow::anyhow!("RPC server start failed: {}", e))?;

    info!("System ready. Waiting for requests...");
    info!("Press Ctrl+C to shutdown");

    tokio::signal::ctrl_c().await?;

    info!("Shutdown signal received. Exiting gracefully...");

    rpc_handle
        .stop()
        .map_err(|e| anyhow::anyhow!("RPC server stop failed: {}", e))?;

    info!("Shutdown complete.");

    Ok(())
}
