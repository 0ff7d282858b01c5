//! pulse-sw entry point.
//!
//! Boots the offline worker and serves it as an MCP server on stdio.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use pulse_client::{FetchClient, FetchConfig, HttpSync};
use pulse_core::{AppConfig, CacheDb};
use pulse_worker::{PulseServer, Worker};
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use tracing_subscriber::EnvFilter;

/// How long shutdown waits for background refreshes.
const REFRESH_GRACE: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load().context("loading configuration")?;
    tracing::info!(version = %config.version, store = %config.store_name(), db = %config.db_path.display(), "starting pulse-sw on stdio transport");

    let db = CacheDb::open(&config.db_path).await.context("opening cache database")?;
    let network = FetchClient::new(FetchConfig::from_app(&config))?;

    let sync_endpoint = config.sync_endpoint_url().context("resolving sync_endpoint")?;
    let sync = HttpSync::new(sync_endpoint, &config.user_agent)?;

    let worker = Arc::new(Worker::new(config, db, Arc::new(network), Arc::new(sync))?);

    let handler = PulseServer::new(Arc::clone(&worker));
    let server = serve_server(handler, stdio()).await?;
    server.waiting().await?;

    let lost = worker.settle(REFRESH_GRACE).await;
    tracing::info!(lost_refreshes = lost, "pulse-sw stopped");

    Ok(())
}
