// serve.rs: Start the MCP server on stdio.

use rmcp::ServiceExt;

use pk_gateway::{GatewayConfig, KeeperServer, ToolRegistry};

pub fn execute(config: &GatewayConfig) -> anyhow::Result<()> {
    let registry = ToolRegistry::build(config)?;
    if registry.is_empty() {
        tracing::warn!("no tools registered; check the configured project roots");
    }
    tracing::info!(
        base = %config.base_dir.display(),
        projects = config.projects.len(),
        tools = registry.len(),
        "starting MCP server on stdio"
    );
    let server = KeeperServer::new(registry);

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let transport = rmcp::transport::stdio();
        let server_handle = server
            .serve(transport)
            .await
            .map_err(|e| anyhow::anyhow!("MCP server error: {}", e))?;
        let _ = server_handle.waiting().await;
        Ok::<(), anyhow::Error>(())
    })
}
