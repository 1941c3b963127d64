// MCP server: JSON-RPC 2.0 over stdio, one line per message.

use crate::context::ToolContext;
use crate::protocol::{
    CallToolParams, CallToolResult, InitializeResult, JsonRpcError, JsonRpcRequest,
    JsonRpcResponse, ListToolsResult, ServerCapabilities, ServerInfo, ToolsCapability,
};
use crate::tools::ToolRegistry;
use anyhow::Result;
use serde_json::Value;
use std::time::Instant;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{info, warn};

const PROTOCOL_VERSION: &str = "2024-11-05";

pub struct McpServer {
    registry: ToolRegistry,
    base_context: ToolContext,
}

impl McpServer {
    pub fn new(registry: ToolRegistry) -> Self {
        Self {
            registry,
            base_context: ToolContext::new(),
        }
    }

    /// Headers applied to every call (e.g. a credential from the
    /// environment for stdio deployments). Per-call `_meta.headers` are
    /// layered on top and win.
    pub fn with_base_context(mut self, base_context: ToolContext) -> Self {
        self.base_context = base_context;
        self
    }

    /// Serve JSON-RPC over stdio until stdin closes.
    pub async fn start(&self) -> Result<()> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut stdout = tokio::io::stdout();
        info!("MCP server listening on stdio");

        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            if let Some(response) = self.handle_line(&line).await {
                let mut payload = serde_json::to_vec(&response)?;
                payload.push(b'\n');
                stdout.write_all(&payload).await?;
                stdout.flush().await?;
            }
        }

        info!("stdin closed, shutting down");
        Ok(())
    }

    async fn handle_line(&self, line: &str) -> Option<JsonRpcResponse> {
        match serde_json::from_str::<JsonRpcRequest>(line) {
            Ok(request) => self.handle_request(request).await,
            Err(e) => {
                warn!(error = %e, "unparseable request line");
                Some(JsonRpcResponse::error(
                    Value::Null,
                    JsonRpcError::parse_error(),
                ))
            }
        }
    }

    /// Dispatch a single request. Notifications get no response.
    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        if request.is_notification() {
            return None;
        }
        let id = request.id.clone().unwrap_or(Value::Null);

        let response = match request.method.as_str() {
            "initialize" => JsonRpcResponse::success(id, self.initialize_result()),
            "ping" => JsonRpcResponse::success(id, serde_json::json!({})),
            "tools/list" => JsonRpcResponse::success(
                id,
                ListToolsResult {
                    tools: self.registry.list_schemas(),
                },
            ),
            "tools/call" => self.handle_tool_call(id, request.params).await,
            method => JsonRpcResponse::error(id, JsonRpcError::method_not_found(method)),
        };
        Some(response)
    }

    fn initialize_result(&self) -> InitializeResult {
        InitializeResult {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability {
                    list_changed: false,
                }),
            },
            server_info: ServerInfo {
                name: "canopy-mcp".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        }
    }

    async fn handle_tool_call(&self, id: Value, params: Option<Value>) -> JsonRpcResponse {
        let params: CallToolParams = match params.map(serde_json::from_value).transpose() {
            Ok(Some(params)) => params,
            _ => {
                return JsonRpcResponse::error(
                    id,
                    JsonRpcError::invalid_params("expected tool call params"),
                )
            }
        };

        let Some(tool) = self.registry.get(&params.name) else {
            return JsonRpcResponse::error(
                id,
                JsonRpcError::invalid_params(format!("Unknown tool: {}", params.name)),
            );
        };

        let ctx = self
            .base_context
            .merged(params.meta.as_ref().and_then(|meta| meta.headers.as_ref()));

        // Clients may omit `arguments` entirely.
        let arguments = if params.arguments.is_null() {
            serde_json::json!({})
        } else {
            params.arguments
        };

        // Nothing a tool does may escape this boundary as a raw error: the
        // caller always gets a structured result.
        let started = Instant::now();
        let result = match tool.execute(&ctx, arguments).await {
            Ok(result) => result,
            Err(e) => CallToolResult::error(format!("Error: {}", e)),
        };
        info!(
            tool = %params.name,
            duration_ms = started.elapsed().as_millis() as u64,
            is_error = result.is_error(),
            "tool call"
        );

        JsonRpcResponse::success(id, result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{ToolAnnotations, ToolSchema};
    use crate::tools::{json_schema_object, Tool};
    use std::sync::Arc;

    /// Echoes the resolved credential, or fails when asked to.
    struct EchoTool;

    #[async_trait::async_trait]
    impl Tool for EchoTool {
        fn schema(&self) -> ToolSchema {
            ToolSchema {
                name: "echo_credential".to_string(),
                description: "test tool".to_string(),
                input_schema: json_schema_object(serde_json::json!({}), vec![]),
                annotations: Some(ToolAnnotations::read_only("Echo")),
            }
        }

        async fn execute(
            &self,
            ctx: &ToolContext,
            arguments: serde_json::Value,
        ) -> Result<CallToolResult> {
            if arguments.get("explode").is_some() {
                anyhow::bail!("boom");
            }
            match ctx.credential() {
                Ok(token) => Ok(CallToolResult::text(token)),
                Err(e) => Ok(CallToolResult::error(format!("Error: {}", e))),
            }
        }
    }

    fn server() -> McpServer {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool));
        McpServer::new(registry)
            .with_base_context(ToolContext::from_headers([("x-canopy-mcp-token", "env_tok")]))
    }

    fn request(id: u64, method: &str, params: serde_json::Value) -> JsonRpcRequest {
        JsonRpcRequest {
            jsonrpc: "2.0".to_string(),
            id: Some(serde_json::json!(id)),
            method: method.to_string(),
            params: Some(params),
        }
    }

    #[tokio::test]
    async fn test_initialize() {
        let response = server()
            .handle_request(request(1, "initialize", serde_json::json!({})))
            .await
            .unwrap();
        let result = response.result.unwrap();
        assert_eq!(result["protocolVersion"], PROTOCOL_VERSION);
        assert_eq!(result["serverInfo"]["name"], "canopy-mcp");
    }

    #[tokio::test]
    async fn test_tools_list() {
        let response = server()
            .handle_request(request(2, "tools/list", serde_json::json!({})))
            .await
            .unwrap();
        let tools = &response.result.unwrap()["tools"];
        assert_eq!(tools[0]["name"], "echo_credential");
        assert_eq!(tools[0]["annotations"]["readOnlyHint"], true);
    }

    #[tokio::test]
    async fn test_tool_call_uses_base_context() {
        let response = server()
            .handle_request(request(
                3,
                "tools/call",
                serde_json::json!({"name": "echo_credential", "arguments": {}}),
            ))
            .await
            .unwrap();
        let result = response.result.unwrap();
        assert_eq!(result["content"][0]["text"], "env_tok");
    }

    #[tokio::test]
    async fn test_tool_call_meta_headers_override() {
        let response = server()
            .handle_request(request(
                4,
                "tools/call",
                serde_json::json!({
                    "name": "echo_credential",
                    "arguments": {},
                    "_meta": {"headers": {"Authorization": "Bearer call_tok", "x-canopy-mcp-token": ""}}
                }),
            ))
            .await
            .unwrap();
        let result = response.result.unwrap();
        assert_eq!(result["content"][0]["text"], "call_tok");
    }

    #[tokio::test]
    async fn test_tool_call_unknown_tool() {
        let response = server()
            .handle_request(request(
                5,
                "tools/call",
                serde_json::json!({"name": "nope", "arguments": {}}),
            ))
            .await
            .unwrap();
        let error = response.error.unwrap();
        assert_eq!(error.code, -32602);
        assert!(error.message.contains("Unknown tool"));
    }

    #[tokio::test]
    async fn test_tool_failure_becomes_structured_error() {
        let response = server()
            .handle_request(request(
                6,
                "tools/call",
                serde_json::json!({"name": "echo_credential", "arguments": {"explode": true}}),
            ))
            .await
            .unwrap();
        // The JSON-RPC layer still answers success; the error is in the
        // tool result, per the MCP contract.
        assert!(response.error.is_none());
        let result = response.result.unwrap();
        assert_eq!(result["isError"], true);
        assert_eq!(result["content"][0]["text"], "Error: boom");
    }

    #[tokio::test]
    async fn test_notifications_get_no_response() {
        let notification = JsonRpcRequest {
            jsonrpc: "2.0".to_string(),
            id: None,
            method: "notifications/initialized".to_string(),
            params: None,
        };
        assert!(server().handle_request(notification).await.is_none());
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let response = server()
            .handle_request(request(7, "resources/list", serde_json::json!({})))
            .await
            .unwrap();
        assert_eq!(response.error.unwrap().code, -32601);
    }

    #[tokio::test]
    async fn test_parse_error() {
        let response = server().handle_line("{not json").await.unwrap();
        assert_eq!(response.error.unwrap().code, -32700);
    }
}
