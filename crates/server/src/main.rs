//! mcp-search server entry point.
//!
//! This is the main binary that boots the MCP server on stdio transport.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::Result;
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use search_client::{BraveClient, BraveConfig};
use search_core::{AppConfig, SearchEngine};
use tracing_subscriber::EnvFilter;

mod handler;
mod health;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;

    let provider = BraveClient::new(BraveConfig {
        api_key: config.require_brave_api_key()?.to_string(),
        timeout: config.timeout(),
        ..Default::default()
    })?;

    let engine = Arc::new(SearchEngine::open(&config, Arc::new(provider)).await);

    if let Some(addr) = config.health_addr {
        tokio::spawn(async move {
            if let Err(e) = health::serve(addr).await {
                tracing::error!(%addr, error = %e, "health endpoint failed");
            }
        });
    }

    tracing::info!("Starting mcp-search server on stdio transport");

    let handler = handler::McpSearchServer::new(engine.clone(), config.default_options());
    let server = serve_server(handler, stdio()).await?;

    tokio::select! {
        quit = server.waiting() => {
            tracing::info!(reason = ?quit, "stdio transport closed");
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("interrupt received");
        }
    }

    if tokio::time::timeout(config.shutdown_timeout(), engine.shutdown()).await.is_err() {
        tracing::warn!(timeout_ms = config.shutdown_timeout_ms, "shutdown timed out, abandoning outstanding work");
    }

    Ok(())
}
