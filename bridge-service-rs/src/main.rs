//! Bridge service entry point.
//!
//! Loads configuration from the environment (and `.env` when present),
//! wires the Rally client, classifier, and tool registry together, and
//! serves MCP over stdio.

use std::sync::Arc;

use anyhow::Context as _;
use tracing_subscriber::EnvFilter;

mod protocol;
mod recovery;
mod registry;
mod server;
mod tools;

use error_handling_rs::ErrorClassifier;
use rally_sdk::{RallyClient, RallyConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    // Stdout carries the protocol; all logging goes to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = RallyConfig::from_env();
    let client =
        Arc::new(RallyClient::new(config).context("failed to build the Rally client")?);
    let classifier = ErrorClassifier::new();

    let registry = Arc::new(registry::ToolRegistry::new());
    tools::register_artifact_tools(&registry, client, classifier)
        .context("failed to register tools")?;
    tracing::info!(tools = registry.descriptors().len(), "bridge ready");

    server::BridgeServer::new(registry).run().await?;
    Ok(())
}
