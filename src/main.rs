// Entry point of the Drive document reader.
//
// **Architecture Overview:**
// - `core/` = Path resolution and content flattening (no I/O of its own)
// - `infra/` = Google API implementations of the core traits
// - `tools/` = The MCP tool server
//
// This file's job is to:
// 1. Load configuration
// 2. Initialize services (dependency injection)
// 3. Serve MCP tool calls until the client disconnects

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with several mod.rs files that all look the same.
#[path = "core/core_layer.rs"]
mod core;
#[path = "infra/infra_layer.rs"]
mod infra;
#[path = "tools/tools_layer.rs"]
mod tools;

use std::sync::Arc;

use anyhow::Context;
use rmcp::{transport::stdio, ServiceExt};
use tracing_subscriber::EnvFilter;

use crate::core::drive::{DriveConfig, DriveService};
use crate::infra::google_drive::{GoogleAuth, GoogleDriveClient};
use crate::tools::drive_tools::DriveToolHandler;
use crate::tools::models::FunctionCallHandler;
use crate::tools::server::DriveMcp;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file (if it exists)
    dotenv::dotenv().ok();

    // stdout carries the MCP protocol, so logs go to stderr
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = DriveConfig::from_env();
    tracing::info!(
        "Drive config: roots {:?}, named roots {:?}, max depth {}, timeout {:?}, tie-break {:?}, cache {}",
        config.root_labels,
        config.named_root_labels,
        config.max_folder_depth,
        config.call_timeout,
        config.tie_break,
        config.cache_enabled
    );

    // ========================================================================
    // DEPENDENCY INJECTION
    // ========================================================================

    let auth = GoogleAuth::from_env()
        .await
        .context("Google credentials are not configured")?;
    let client = Arc::new(
        GoogleDriveClient::new(auth, config.call_timeout)
            .context("Failed to create Google API client")?,
    );

    // One client serves both metadata lookups and content fetches.
    let service = Arc::new(DriveService::new(Arc::clone(&client), client, &config));
    let handler: Arc<dyn FunctionCallHandler> = Arc::new(DriveToolHandler::new(service));

    tracing::info!(
        "Serving MCP tools on stdio: {}",
        handler.supported_functions().join(", ")
    );

    let server = DriveMcp::new(handler)
        .serve(stdio())
        .await
        .inspect_err(|e| tracing::error!("MCP server error: {:?}", e))
        .context("MCP handshake failed")?;

    server.waiting().await.context("MCP server task failed")?;

    tracing::info!("Client disconnected, shutting down");
    Ok(())
}
