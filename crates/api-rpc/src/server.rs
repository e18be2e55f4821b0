//! JSON-RPC Server
//!
//! Implements the JSON-RPC 2.0 server over TCP (localhost only).

use std::path::PathBuf;
use std::sync::Arc;

use jsonrpsee::server::{Server, ServerHandle};
use jsonrpsee::RpcModule;
use tracing::info;

use queue_core::application::QueueEngine;

use crate::handler::RpcHandler;
use crate::types::{FinishActiveJobRequest, RetryFailedJobRequest};

// Note: jsonrpsee doesn't support Unix sockets directly (hyper limitation).
// Using TCP on localhost as secure alternative (no external access).
const DEFAULT_SOCKET_PATH: &str = "~/.queue/queue.sock";
const DEFAULT_RPC_HOST: &str = "127.0.0.1";
const DEFAULT_RPC_PORT: u16 = 9528;

/// RPC Server Configuration
pub struct RpcServerConfig {
    pub socket_path: PathBuf, // Reserved for future UDS support
    pub host: String,
    pub port: u16,
}

impl Default for RpcServerConfig {
    fn default() -> Self {
        Self {
            socket_path: shellexpand::tilde(DEFAULT_SOCKET_PATH).into_owned().into(),
            host: DEFAULT_RPC_HOST.to_string(),
            port: DEFAULT_RPC_PORT,
        }
    }
}

/// RPC Server
pub struct RpcServer {
    config: RpcServerConfig,
    handler: Arc<RpcHandler>,
}

impl RpcServer {
    pub fn new(config: RpcServerConfig, engine: Arc<QueueEngine>) -> Self {
        Self {
            config,
            handler: Arc::new(RpcHandler::new(engine)),
        }
    }

    /// Start the JSON-RPC server
    ///
    /// Security: Only binds to 127.0.0.1 (no external access)
    pub async fn start(self) -> Result<ServerHandle, String> {
        let addr = format!("{}:{}", self.config.host, self.config.port);

        info!(
            host = %self.config.host,
            port = %self.config.port,
            "Starting JSON-RPC server on TCP (localhost only)"
        );

        let server = Server::builder()
            .build(&addr)
            .await
            .map_err(|e| format!("Failed to build server on {}: {}", addr, e))?;

        let mut module = RpcModule::new(());

        let handler = self.handler.clone();
        module
            .register_async_method("queue.finishActiveJob.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: FinishActiveJobRequest = params.parse()?;
                    handler.finish_active_job(req).await
                }
            })
            .map_err(|e| e.to_string())?;

        let handler = self.handler.clone();
        module
            .register_async_method("queue.retryFailedJob.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: RetryFailedJobRequest = params.parse()?;
                    handler.retry_failed_job(req).await
                }
            })
            .map_err(|e| e.to_string())?;

        info!("JSON-RPC server started successfully");

        let handle = server.start(module);
        Ok(handle)
    }
}
