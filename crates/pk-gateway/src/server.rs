// server.rs: MCP server backed by the tool registry.
//
// Tool names depend on the configured project prefixes, so tools are listed
// and dispatched from the registry at runtime rather than declared with the
// rmcp tool macros. Engine calls do blocking file I/O and run on tokio's
// blocking pool.

use std::sync::Arc;

use rmcp::model::*;
use rmcp::service::RequestContext;
use rmcp::{ErrorData as McpError, RoleServer, ServerHandler};
use serde_json::Value;

use crate::registry::{ToolOutput, ToolRegistry};

/// The Project Keeper MCP server.
#[derive(Clone)]
pub struct KeeperServer {
    registry: Arc<ToolRegistry>,
    tools: Arc<Vec<Tool>>,
}

impl KeeperServer {
    pub fn new(registry: ToolRegistry) -> Self {
        let tools = registry
            .specs()
            .map(|spec| {
                Tool::new(
                    spec.name.clone(),
                    spec.description.clone(),
                    Arc::new(spec.input_schema.clone()),
                )
            })
            .collect();
        Self {
            registry: Arc::new(registry),
            tools: Arc::new(tools),
        }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }
}

impl ServerHandler for KeeperServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "project-keeper".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                title: Some("Project Keeper".into()),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Project Keeper MCP server. Reads, edits, creates and moves run directly; \
                 edits to files that are open elsewhere are staged under .staging/ for review. \
                 Deletions and renames are never performed: they are logged under logs/ for a \
                 human to carry out."
                    .into(),
            ),
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        Ok(ListToolsResult::with_all_items(self.tools.as_ref().clone()))
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let name = request.name.to_string();
        let args = Value::Object(request.arguments.unwrap_or_default());
        let registry = Arc::clone(&self.registry);

        let tool = name.clone();
        let output = tokio::task::spawn_blocking(move || registry.call(&tool, args))
            .await
            .map_err(|e| McpError::internal_error(format!("tool task failed: {}", e), None))?
            .ok_or_else(|| McpError::invalid_params(format!("unknown tool: {}", name), None))?;

        match output {
            ToolOutput::Text(text) => Ok(CallToolResult::success(vec![Content::text(text)])),
            ToolOutput::Json(value) => Ok(CallToolResult::success(vec![Content::json(value)?])),
            ToolOutput::Error(text) => Ok(CallToolResult::error(vec![Content::text(text)])),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GatewayConfig;
    use tempfile::tempdir;

    #[test]
    fn advertises_every_registered_tool() {
        let dir = tempdir().unwrap();
        let registry = ToolRegistry::build(&GatewayConfig::for_base(dir.path())).unwrap();
        let expected = registry.len();

        let server = KeeperServer::new(registry);

        assert_eq!(server.tools.len(), expected);
        assert!(server
            .tools
            .iter()
            .any(|t| t.name == "read_keeper_file"));
    }

    #[test]
    fn info_enables_tools() {
        let dir = tempdir().unwrap();
        let server = KeeperServer::new(
            ToolRegistry::build(&GatewayConfig::for_base(dir.path())).unwrap(),
        );
        let info = server.get_info();

        assert!(info.capabilities.tools.is_some());
        assert_eq!(info.server_info.name, "project-keeper");
    }
}
