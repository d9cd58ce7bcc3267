//! QueueKeeper CLI - Command-line interface for the QueueKeeper daemon

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tabled::{Table, Tabled};

const DEFAULT_RPC_URL: &str = "http://127.0.0.1:9640";

#[derive(Parser)]
#[command(name = "qk")]
#[command(about = "QueueKeeper CLI", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// RPC server URL
    #[arg(long, env = "QUEUEKEEPER_RPC_URL", default_value = DEFAULT_RPC_URL)]
    rpc_url: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new named queue
    Create {
        queue: String,

        /// Maximum number of items (unbounded when omitted)
        #[arg(short, long)]
        max_size: Option<usize>,
    },

    /// Delete a queue and its stored data
    Delete { queue: String },

    /// Append an item at the rear of a queue
    Enqueue { queue: String, item: String },

    /// Remove and print the front item
    Dequeue { queue: String },

    /// Print the front item without removing it
    Front { queue: String },

    /// Print the rear item without removing it
    Rear { queue: String },

    /// Find the front-relative position of an item
    Search { queue: String, item: String },

    /// Remove every item from a queue
    Clear { queue: String },

    /// List all queues
    List,

    /// Show items and recent operations of a queue
    Show {
        queue: String,

        /// Number of recent operations to show
        #[arg(short = 'n', long, default_value = "20")]
        log_limit: usize,
    },

    /// Persist one queue now
    Save { queue: String },

    /// Persist every queue now
    Flush,
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

#[derive(Deserialize)]
struct QueueInfo {
    name: String,
    size: usize,
    max_size: Option<usize>,
    created_at: i64,
}

#[derive(Tabled)]
struct QueueRow {
    name: String,
    size: usize,
    capacity: String,
    created: String,
}

impl From<QueueInfo> for QueueRow {
    fn from(info: QueueInfo) -> Self {
        Self {
            name: info.name,
            size: info.size,
            capacity: format_capacity(info.max_size),
            created: format_timestamp(info.created_at),
        }
    }
}

#[derive(Deserialize)]
struct OperationInfo {
    #[serde(rename = "type")]
    op_type: String,
    item: Option<String>,
    timestamp: i64,
    queue_size: usize,
}

#[derive(Tabled)]
struct OperationRow {
    time: String,
    operation: String,
    item: String,
    size: usize,
}

impl From<OperationInfo> for OperationRow {
    fn from(op: OperationInfo) -> Self {
        Self {
            time: format_timestamp(op.timestamp),
            operation: op.op_type,
            item: op.item.unwrap_or_else(|| "-".to_string()),
            size: op.queue_size,
        }
    }
}

#[derive(Deserialize)]
struct ShowResult {
    name: String,
    size: usize,
    max_size: Option<usize>,
    created_at: i64,
    items: Vec<String>,
    recent_operations: Vec<OperationInfo>,
}

#[derive(Deserialize)]
struct FlushFailureInfo {
    queue: String,
    error: String,
}

#[derive(Deserialize)]
struct FlushResult {
    attempted: usize,
    saved: usize,
    skipped: usize,
    failures: Vec<FlushFailureInfo>,
}

fn format_capacity(max_size: Option<usize>) -> String {
    max_size
        .map(|m| m.to_string())
        .unwrap_or_else(|| "unbounded".to_string())
}

fn format_timestamp(millis: i64) -> String {
    chrono::DateTime::from_timestamp_millis(millis)
        .map(|t| t.format("%Y-%m-%d %H:%M:%S%.3f").to_string())
        .unwrap_or_else(|| millis.to_string())
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

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let url = cli.rpc_url.as_str();

    match cli.command {
        Commands::Create { queue, max_size } => {
            let params = json!({ "queue": queue, "max_size": max_size });
            let result = call_rpc(url, "queue.create.v1", params).await?;
            let info: QueueInfo = serde_json::from_value(result["queue"].clone())?;

            println!(
                "{}",
                format!(
                    "✓ Queue '{}' created (capacity: {})",
                    info.name,
                    format_capacity(info.max_size)
                )
                .green()
                .bold()
            );
        }

        Commands::Delete { queue } => {
            let result = call_rpc(url, "queue.delete.v1", json!({ "queue": queue })).await?;

            println!("{}", format!("✓ Queue '{}' deleted", queue).green().bold());
            if let Some(warning) = result["warning"].as_str() {
                println!("  {} {}", "Warning:".yellow().bold(), warning);
            }
        }

        Commands::Enqueue { queue, item } => {
            let params = json!({ "queue": queue, "item": item });
            let result = call_rpc(url, "queue.enqueue.v1", params).await?;

            println!(
                "{} {}",
                "✓ Enqueued".green().bold(),
                format!("(size: {})", result["size"]).dimmed()
            );
        }

        Commands::Dequeue { queue } => {
            let result = call_rpc(url, "queue.dequeue.v1", json!({ "queue": queue })).await?;

            println!(
                "{} {}",
                result["item"].as_str().unwrap_or_default(),
                format!("(size: {})", result["size"]).dimmed()
            );
        }

        Commands::Front { queue } => {
            let result = call_rpc(url, "queue.front.v1", json!({ "queue": queue })).await?;
            println!("{}", result["item"].as_str().unwrap_or_default());
        }

        Commands::Rear { queue } => {
            let result = call_rpc(url, "queue.rear.v1", json!({ "queue": queue })).await?;
            println!("{}", result["item"].as_str().unwrap_or_default());
        }

        Commands::Search { queue, item } => {
            let params = json!({ "queue": queue, "item": item });
            let result = call_rpc(url, "queue.search.v1", params).await?;

            match result["index"].as_u64() {
                Some(index) => println!("{}", index),
                None => println!("{}", format!("'{}' not found in '{}'", item, queue).yellow()),
            }
        }

        Commands::Clear { queue } => {
            let result = call_rpc(url, "queue.clear.v1", json!({ "queue": queue })).await?;

            println!(
                "{}",
                format!("✓ Queue '{}' cleared ({} removed)", queue, result["removed"])
                    .green()
                    .bold()
            );
        }

        Commands::List => {
            let result = call_rpc(url, "queue.list.v1", json!({})).await?;
            let queues: Vec<QueueInfo> = serde_json::from_value(result["queues"].clone())?;

            if queues.is_empty() {
                println!("{}", "No queues".yellow());
            } else {
                let rows: Vec<QueueRow> = queues.into_iter().map(QueueRow::from).collect();
                println!("{}", Table::new(rows));
            }
        }

        Commands::Show { queue, log_limit } => {
            let params = json!({ "queue": queue, "log_limit": log_limit });
            let result = call_rpc(url, "queue.show.v1", params).await?;
            let details: ShowResult = serde_json::from_value(result)?;

            println!("{}", format!("Queue '{}'", details.name).cyan().bold());
            println!();
            println!("  {} {}", "Size:".bold(), details.size);
            println!("  {} {}", "Capacity:".bold(), format_capacity(details.max_size));
            println!("  {} {}", "Created:".bold(), format_timestamp(details.created_at));
            println!();

            if details.items.is_empty() {
                println!("  {}", "(empty)".dimmed());
            } else {
                for (index, item) in details.items.iter().enumerate() {
                    println!("  {:>4}  {}", index, item);
                }
            }

            if !details.recent_operations.is_empty() {
                println!();
                println!("{}", "Recent operations".cyan().bold());
                let rows: Vec<OperationRow> = details
                    .recent_operations
                    .into_iter()
                    .map(OperationRow::from)
                    .collect();
                println!("{}", Table::new(rows));
            }
        }

        Commands::Save { queue } => {
            call_rpc(url, "queue.save.v1", json!({ "queue": queue })).await?;
            println!("{}", format!("✓ Queue '{}' saved", queue).green().bold());
        }

        Commands::Flush => {
            let result = call_rpc(url, "admin.flush.v1", json!({})).await?;
            let report: FlushResult = serde_json::from_value(result)?;

            if report.failures.is_empty() {
                println!(
                    "{}",
                    format!("✓ Flushed {} of {} queues", report.saved, report.attempted)
                        .green()
                        .bold()
                );
            } else {
                println!(
                    "{}",
                    format!(
                        "✗ Flushed {} of {} queues, {} failed",
                        report.saved,
                        report.attempted,
                        report.failures.len()
                    )
                    .red()
                    .bold()
                );
                for failure in &report.failures {
                    println!("  {} {}: {}", "•".bold(), failure.queue, failure.error);
                }
            }
            if report.skipped > 0 {
                println!("  ○ {} deleted during flush", report.skipped);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_subcommands() {
        let cli = Cli::try_parse_from(["qk", "create", "orders", "--max-size", "3"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Create { ref queue, max_size: Some(3) } if queue == "orders"
        ));

        let cli = Cli::try_parse_from(["qk", "enqueue", "orders", "a"]).unwrap();
        assert!(matches!(cli.command, Commands::Enqueue { .. }));

        assert!(Cli::try_parse_from(["qk", "enqueue", "orders"]).is_err());
    }

    #[test]
    fn test_format_capacity() {
        assert_eq!(format_capacity(Some(5)), "5");
        assert_eq!(format_capacity(None), "unbounded");
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(0), "1970-01-01 00:00:00.000");
        assert_eq!(format_timestamp(1_500), "1970-01-01 00:00:01.500");
    }

    #[test]
    fn test_operation_row_without_item() {
        let op: OperationInfo = serde_json::from_value(json!({
            "type": "clear",
            "timestamp": 0,
            "queue_size": 0
        }))
        .unwrap();
        let row = OperationRow::from(op);
        assert_eq!(row.operation, "clear");
        assert_eq!(row.item, "-");
    }
}
