//! Card-reader log replay client.
//!
//! Reads a JSON-lines log as produced by an SI reader station and posts the
//! records to an otime server, optionally paced to simulate a live reader.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use serde_json::Value;
use tokio::time::sleep;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "otime-reader")]
#[command(about = "Replays a recorded card-reader log against an otime server")]
struct Args {
    /// Server base URL
    #[arg(long, default_value = "http://localhost:8080")]
    server: String,

    /// Event key the reads are routed to
    #[arg(long)]
    key: String,

    /// Pause between records in milliseconds (0 = replay as fast as possible)
    #[arg(long, default_value = "0")]
    interval_ms: u64,

    /// Records per request
    #[arg(long, default_value = "1")]
    batch_size: usize,

    /// JSON-lines card-reader log
    file: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let content = std::fs::read_to_string(&args.file)?;
    let mut records = Vec::new();
    for (number, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<Value>(line) {
            Ok(value) => records.push(value),
            Err(e) => warn!(line = number + 1, error = %e, "skipping unparseable record"),
        }
    }
    info!(records = records.len(), file = %args.file.display(), "log loaded");

    let client = reqwest::Client::new();
    let url = format!("{}/api/cardreader/log", args.server);
    let batch_size = args.batch_size.max(1);

    for batch in records.chunks(batch_size) {
        let responses: Vec<Value> = client
            .post(&url)
            .query(&[("key", &args.key)])
            .json(&batch)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        for response in &responses {
            match response.get("error").and_then(Value::as_str) {
                Some(error) => warn!(%error, "reader response"),
                None => info!(
                    card = response
                        .get("controlCard")
                        .and_then(serde_json::Value::as_str)
                        .unwrap_or("-"),
                    status = response.get("status").and_then(serde_json::Value::as_str).unwrap_or("-"),
                    "reader response"
                ),
            }
        }
        if args.interval_ms > 0 {
            sleep(Duration::from_millis(args.interval_ms)).await;
        }
    }

    Ok(())
}
