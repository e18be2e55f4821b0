//! RPC Method Handlers
//!
//! Implements the two queue procedures over JSON-RPC. The rate limiter
//! here is ambient abuse protection for the RPC surface itself, distinct
//! from the queue's own business-logic rate limiter (`opts.limiter`,
//! component 4.7) that the procedures apply internally.

use std::sync::Arc;

use jsonrpsee::types::ErrorObjectOwned;

use queue_core::application::QueueEngine;

use crate::error::to_rpc_error;
use crate::rate_limiter::RateLimiter;
use crate::types::{
    FinishActiveJobRequest, FinishActiveJobResponse, RetryFailedJobRequest, RetryFailedJobResponse,
};

pub struct RpcHandler {
    engine: Arc<QueueEngine>,
    rate_limiter: Arc<RateLimiter>,
    start_time: std::time::Instant,
}

impl RpcHandler {
    pub fn new(engine: Arc<QueueEngine>) -> Self {
        let max_burst: u32 = std::env::var("QUEUE_RATE_LIMIT_BURST")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(200);

        let rate_per_sec: u32 = std::env::var("QUEUE_RATE_LIMIT_RATE")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(100);

        Self {
            engine,
            rate_limiter: Arc::new(RateLimiter::new(max_burst, rate_per_sec)),
            start_time: std::time::Instant::now(),
        }
    }

    fn throttled() -> ErrorObjectOwned {
        jsonrpsee::types::error::ErrorObject::owned(
            4003,
            "Rate limit exceeded. Please slow down.",
            None::<()>,
        )
    }

    /// queue.finishActiveJob.v1
    pub async fn finish_active_job(
        &self,
        params: FinishActiveJobRequest,
    ) -> Result<FinishActiveJobResponse, ErrorObjectOwned> {
        if !self.rate_limiter.check().await {
            return Err(Self::throttled());
        }

        let outcome = self
            .engine
            .finish_active_job(
                &params.prefix,
                &params.job_id,
                params.timestamp,
                &params.target,
                &params.result_field,
                &params.result_value,
                params.fetch_next,
                &params.opts,
            )
            .await
            .map_err(to_rpc_error)?;

        Ok(match outcome {
            queue_core::application::FinishOutcome::Done => FinishActiveJobResponse::Done,
            queue_core::application::FinishOutcome::NextJob { job_id, fields } => {
                FinishActiveJobResponse::NextJob { job_id, fields }
            }
            queue_core::application::FinishOutcome::RateLimited { ttl_millis } => {
                FinishActiveJobResponse::RateLimited { ttl_millis }
            }
            queue_core::application::FinishOutcome::NextDelayedAt { timestamp } => {
                FinishActiveJobResponse::NextDelayedAt { timestamp }
            }
        })
    }

    /// queue.retryFailedJob.v1
    pub async fn retry_failed_job(
        &self,
        params: RetryFailedJobRequest,
    ) -> Result<RetryFailedJobResponse, ErrorObjectOwned> {
        if !self.rate_limiter.check().await {
            return Err(Self::throttled());
        }

        self.engine
            .retry_failed_job(&params.prefix, &params.job_id, params.timestamp, &params.opts)
            .await
            .map_err(to_rpc_error)?;

        Ok(RetryFailedJobResponse {
            job_id: params.job_id,
        })
    }

    pub fn uptime_seconds(&self) -> i64 {
        self.start_time.elapsed().as_secs() as i64
    }
}
