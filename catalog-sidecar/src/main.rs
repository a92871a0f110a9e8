//! Catalog Sidecar - JSON-RPC driver for the course discovery pipeline
//!
//! Communicates with the host UI via JSON-RPC over stdin/stdout: one request
//! per line in, one response per line out. Requests run concurrently, so a
//! response may overtake an earlier one; match them by `id`.

mod handlers;
mod rpc;

use anyhow::{Context, Result};
use catalog_lib::{AppState, CatalogConfig};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;

use rpc::{JsonRpcError, JsonRpcRequest, JsonRpcResponse};

const DEFAULT_LOG_DIRECTIVES: &str = "catalog_sidecar=info,catalog_lib=info";

/// Serialize responses onto stdout in the order they finish
async fn write_responses(mut rx: mpsc::UnboundedReceiver<JsonRpcResponse>) {
    let mut stdout = tokio::io::stdout();

    while let Some(response) = rx.recv().await {
        let mut line = match serde_json::to_string(&response) {
            Ok(line) => line,
            Err(e) => {
                log::error!("Failed to encode response {}: {}", response.id, e);
                continue;
            }
        };
        line.push('\n');

        if let Err(e) = stdout.write_all(line.as_bytes()).await {
            log::error!("Failed to write response: {}", e);
            continue;
        }
        let _ = stdout.flush().await;
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Set up panic hook to log panics to stderr before exiting
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("Catalog Sidecar PANIC: {}", panic_info);
        if let Some(location) = panic_info.location() {
            eprintln!("  at {}:{}:{}", location.file(), location.line(), location.column());
        }
    }));

    // Initialize logging to stderr (stdout is for JSON-RPC)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(DEFAULT_LOG_DIRECTIVES)),
        )
        .with_writer(std::io::stderr)
        .init();

    log::info!("Catalog Sidecar starting...");

    let state = Arc::new(
        AppState::from_config(CatalogConfig::from_env())
            .context("Failed to initialize course catalog")?,
    );

    let (tx, rx) = mpsc::unbounded_channel();
    let writer = tokio::spawn(write_responses(rx));

    // Read JSON-RPC requests line by line from stdin
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        if line.trim().is_empty() {
            continue;
        }

        let request: JsonRpcRequest = match serde_json::from_str(&line) {
            Ok(r) => r,
            Err(e) => {
                log::error!("Failed to parse request: {}", e);
                let _ = tx.send(JsonRpcResponse::failure(0, JsonRpcError::parse_error(e)));
                continue;
            }
        };

        log::debug!("Received request: {} (id={})", request.method, request.id);

        if request.method == "shutdown" {
            let response = handlers::process_request(&state, request).await;
            let _ = tx.send(response);
            break;
        }

        let state = state.clone();
        let tx = tx.clone();
        tokio::spawn(async move {
            let response = handlers::process_request(&state, request).await;
            if tx.send(response).is_err() {
                log::warn!("Response writer closed, dropping response");
            }
        });
    }

    // In-flight requests keep their own senders; the writer drains them
    drop(tx);
    if let Err(e) = writer.await {
        log::error!("Response writer failed: {}", e);
    }

    log::info!("Catalog Sidecar shutting down");
    Ok(())
}
