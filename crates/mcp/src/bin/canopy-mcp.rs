// Standalone MCP server binary

use anyhow::{Context, Result};
use canopy_mcp::context::{ToolContext, MCP_TOKEN_HEADER};
use canopy_mcp::server::McpServer;
use canopy_mcp::tools::*;
use canopy_sdk::{CanopyClient, ClientConfig};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing. Stdout carries the protocol, so logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Canopy MCP server starting...");

    // Fail fast on bad configuration, before the first tool call.
    let config = ClientConfig::from_env().context("invalid configuration")?;
    let client = CanopyClient::from_config(config).context("failed to build client")?;

    // Stdio deployments have no per-call HTTP headers; a token from the
    // environment seeds every call's context instead. Per-call
    // `_meta.headers` still override it.
    let base_context = match std::env::var("CANOPY_MCP_TOKEN") {
        Ok(token) => ToolContext::from_headers([(MCP_TOKEN_HEADER, token)]),
        Err(_) => ToolContext::new(),
    };

    // Create tool registry
    let mut registry = ToolRegistry::new();

    // Branch and ref tools
    registry.register(Arc::new(CreateBranchTool::new(client.clone())));
    registry.register(Arc::new(CheckoutBranchTool::new(client.clone())));
    registry.register(Arc::new(MergeBranchTool::new(client.clone())));
    registry.register(Arc::new(ListBranchesTool::new(client.clone())));
    registry.register(Arc::new(CurrentRefTool::new(client.clone())));
    registry.register(Arc::new(CommitTool::new(client.clone())));

    // Block mutation tools
    registry.register(Arc::new(CreateBlocksTool::new(client.clone())));
    registry.register(Arc::new(UpdateBlocksTool::new(client.clone())));
    registry.register(Arc::new(DeleteBlocksTool::new(client.clone())));

    // Read tools
    registry.register(Arc::new(QueryContentTool::new(client.clone())));
    registry.register(Arc::new(ContentStructureTool::new(client.clone())));
    registry.register(Arc::new(DiffTool::new(client.clone())));
    registry.register(Arc::new(GraphqlSchemaTool::new(client.clone())));

    // Documentation tools
    registry.register(Arc::new(BlockTypesTool));
    registry.register(Arc::new(MutationGuidelinesTool));
    registry.register(Arc::new(QueryGuidelinesTool));
    registry.register(Arc::new(SearchDeveloperDocsTool::new(client.clone())));

    // Token and upload tools
    registry.register(Arc::new(GetTokenTool::new(client.clone())));
    registry.register(Arc::new(UploadUrlTool::new(client)));

    tracing::info!("Registered {} tools", registry.len());

    // Start MCP server
    let server = McpServer::new(registry).with_base_context(base_context);
    server.start().await
}
