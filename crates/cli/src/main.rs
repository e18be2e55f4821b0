//! Queue CLI - Command-line interface for the queue's transactional core

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use serde_json::json;

const DEFAULT_RPC_URL: &str = "http://127.0.0.1:9528";

#[derive(Parser)]
#[command(name = "queue")]
#[command(about = "Queue transactional core CLI", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// RPC server URL
    #[arg(long, env = "QUEUE_RPC_URL", default_value = DEFAULT_RPC_URL)]
    rpc_url: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Finish an active job (complete or fail it)
    Finish {
        /// Queue key prefix
        #[arg(long)]
        prefix: String,

        /// Job ID
        #[arg(long)]
        job_id: String,

        /// Lock token held for this job
        #[arg(long)]
        token: String,

        /// "completed" or "failed"
        #[arg(long)]
        target: String,

        /// "returnvalue" or "failedReason"
        #[arg(long)]
        result_field: String,

        /// Result payload (JSON-encoded return value, or failure reason text)
        #[arg(long)]
        result_value: String,

        /// Maximum processing attempts before a failure is terminal
        #[arg(long, default_value = "1")]
        attempts: u32,

        /// Lock duration in milliseconds, used for lock extension bookkeeping
        #[arg(long, default_value = "30000")]
        lock_duration: u64,

        /// Pop and return the next ready job after finishing this one
        #[arg(long)]
        fetch_next: bool,
    },

    /// Retry a failed job
    Retry {
        /// Queue key prefix
        #[arg(long)]
        prefix: String,

        /// Job ID
        #[arg(long)]
        job_id: String,

        /// Lock token held for this job
        #[arg(long)]
        token: String,

        /// Push to the head ("lpush") or tail ("rpush") of the wait list
        #[arg(long, default_value = "rpush")]
        push_cmd: String,
    },
}

#[derive(Serialize)]
struct JsonRpcRequest {
    jsonrpc: String,
    method: String,
    params: serde_json::Value,
    id: u64,
}

#[derive(Deserialize)]
struct JsonRpcResponse {
    #[allow(dead_code)]
    jsonrpc: String,
    #[allow(dead_code)]
    id: u64,
    result: Option<serde_json::Value>,
    error: Option<JsonRpcError>,
}

#[derive(Deserialize)]
struct JsonRpcError {
    code: i32,
    message: String,
}

async fn call_rpc(url: &str, method: &str, params: serde_json::Value) -> Result<serde_json::Value> {
    let request = JsonRpcRequest {
        jsonrpc: "2.0".to_string(),
        method: method.to_string(),
        params,
        id: 1,
    };

    let client = reqwest::Client::new();
    let response: JsonRpcResponse = client
        .post(url)
        .json(&request)
        .send()
        .await
        .context("Failed to connect to daemon")?
        .json()
        .await
        .context("Failed to parse response")?;

    if let Some(error) = response.error {
        anyhow::bail!("RPC error ({}): {}", error.code, error.message);
    }

    response
        .result
        .ok_or_else(|| anyhow::anyhow!("No result in response"))
}

fn now_millis() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("system clock before epoch")
        .as_millis() as i64
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Finish {
            prefix,
            job_id,
            token,
            target,
            result_field,
            result_value,
            attempts,
            lock_duration,
            fetch_next,
        } => {
            let params = json!({
                "prefix": prefix,
                "job_id": job_id,
                "timestamp": now_millis(),
                "target": target,
                "result_field": result_field,
                "result_value": result_value,
                "fetch_next": fetch_next,
                "opts": {
                    "token": token,
                    "keep_jobs": { "count": null, "age": null },
                    "lock_duration": lock_duration,
                    "attempts": attempts,
                    "max_len_events": null,
                    "max_metrics_size": null,
                    "limiter": null,
                },
            });

            let result = call_rpc(&cli.rpc_url, "queue.finishActiveJob.v1", params).await?;

            println!("{}", "✓ Job finished".green().bold());
            println!("{}", serde_json::to_string_pretty(&result)?);
        }

        Commands::Retry {
            prefix,
            job_id,
            token,
            push_cmd,
        } => {
            let push_cmd = push_cmd.to_uppercase();
            let params = json!({
                "prefix": prefix,
                "job_id": job_id,
                "timestamp": now_millis(),
                "opts": {
                    "token": token,
                    "push_cmd": push_cmd,
                },
            });

            let result = call_rpc(&cli.rpc_url, "queue.retryFailedJob.v1", params).await?;

            println!(
                "{}",
                format!("✓ Job {} queued for retry", job_id).green().bold()
            );
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
    }

    Ok(())
}
