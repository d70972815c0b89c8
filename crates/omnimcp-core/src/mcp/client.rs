//! MCP client on the official rmcp SDK
//!
//! Connects to tool servers over a child process (stdio) or Streamable HTTP.

use std::sync::Arc;

use rmcp::{
    model::{
        CallToolRequestParams, CallToolResult, ClientCapabilities, ClientInfo, Implementation,
        RawContent, Tool,
    },
    service::{Peer, RunningService},
    transport::{ConfigureCommandExt, TokioChildProcess},
    RoleClient, ServiceExt,
};
use serde_json::Value;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::logging::Logger;

/// MCP transport and connection errors
#[derive(Error, Debug)]
pub enum McpError {
    #[error("Server script not found: {0}")]
    ScriptNotFound(String),

    #[error("Unsupported server script type: {0}")]
    UnsupportedScript(String),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Initialization failed: {0}")]
    InitializationFailed(String),

    #[error("Connection timeout after {0}s")]
    Timeout(u64),

    #[error("Failed to connect to '{server}' after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        server: String,
        attempts: u32,
        last_error: String,
    },

    #[error("Tool '{tool}' not available. Available tools: {available:?}")]
    ToolNotFound { tool: String, available: Vec<String> },

    #[error("Tool call failed: {0}")]
    ToolCallFailed(String),

    #[error("Not connected to server")]
    NotConnected,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Protocol error: {0}")]
    Protocol(String),
}

pub type McpResult<T> = Result<T, McpError>;

fn client_info() -> ClientInfo {
    ClientInfo {
        meta: None,
        protocol_version: Default::default(),
        capabilities: ClientCapabilities::default(),
        client_info: Implementation {
            name: "omnimcp".to_string(),
            title: Some("OmniMCP".to_string()),
            version: env!("CARGO_PKG_VERSION").to_string(),
            description: None,
            icons: None,
            website_url: None,
        },
    }
}

/// Newline-joined text content of a tool result
pub fn result_text(result: &CallToolResult) -> String {
    result
        .content
        .iter()
        .filter_map(|c| match &c.raw {
            RawContent::Text(t) => Some(t.text.as_str()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Live session with one MCP server
pub struct McpClient {
    /// Held only so the session can be shut down; calls go through `peer`
    service: Mutex<Option<RunningService<RoleClient, ClientInfo>>>,
    peer: Peer<RoleClient>,
    server_info: Option<Implementation>,
    logger: Arc<dyn Logger>,
}

impl McpClient {
    fn from_service(service: RunningService<RoleClient, ClientInfo>, logger: Arc<dyn Logger>) -> Self {
        let peer = service.peer().clone();
        let server_info = service.peer_info().map(|info| info.server_info.clone());
        Self {
            service: Mutex::new(Some(service)),
            peer,
            server_info,
            logger,
        }
    }

    /// Spawn `command args..` and speak MCP over its stdio
    pub async fn connect_stdio(
        command: &str,
        args: &[String],
        logger: Arc<dyn Logger>,
    ) -> McpResult<Self> {
        crate::log_info!(logger, "[McpClient] Running command: {} {}", command, args.join(" "));

        let transport = TokioChildProcess::new(tokio::process::Command::new(command).configure(|cmd| {
            cmd.args(args);
        }))
        .map_err(|e| McpError::ConnectionFailed(e.to_string()))?;

        let service = client_info()
            .serve(transport)
            .await
            .map_err(|e| McpError::InitializationFailed(e.to_string()))?;

        logger.info("[McpClient] Connected and initialized successfully");
        Ok(Self::from_service(service, logger))
    }

    /// Connect to an MCP server over HTTP (Streamable HTTP transport)
    pub async fn connect_http(url: &str, logger: Arc<dyn Logger>) -> McpResult<Self> {
        use rmcp::transport::StreamableHttpClientTransport;

        crate::log_info!(logger, "[McpClient] Connecting to HTTP: {}", url);

        let transport = StreamableHttpClientTransport::from_uri(url);
        let service = client_info()
            .serve(transport)
            .await
            .map_err(|e| McpError::InitializationFailed(e.to_string()))?;

        logger.info("[McpClient] Connected and initialized successfully");
        Ok(Self::from_service(service, logger))
    }

    /// List every tool, following pagination
    pub async fn list_tools(&self) -> McpResult<Vec<Tool>> {
        let tools = self
            .peer
            .list_all_tools()
            .await
            .map_err(|e| McpError::Protocol(e.to_string()))?;

        crate::log_info!(self.logger, "[McpClient] Listed {} tools", tools.len());
        Ok(tools)
    }

    /// Call a tool by name; non-object arguments are sent as no arguments
    pub async fn call_tool(&self, name: &str, arguments: Value) -> McpResult<CallToolResult> {
        crate::log_debug!(self.logger, "[McpClient] Calling tool '{}' with args: {}", name, arguments);

        let params = CallToolRequestParams {
            meta: None,
            name: name.to_owned().into(),
            arguments: arguments.as_object().cloned(),
            task: None,
        };

        self.peer
            .call_tool(params)
            .await
            .map_err(|e| McpError::ToolCallFailed(e.to_string()))
    }

    pub fn server_info(&self) -> Option<&Implementation> {
        self.server_info.as_ref()
    }

    pub async fn is_closed(&self) -> bool {
        self.service.lock().await.is_none()
    }

    /// Close the session; later calls are no-ops
    pub async fn close(&self) -> McpResult<()> {
        let Some(service) = self.service.lock().await.take() else {
            return Ok(());
        };
        self.logger.info("[McpClient] Closing connection");
        service
            .cancel()
            .await
            .map_err(|e| McpError::Protocol(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rmcp::model::Content;

    #[test]
    fn test_result_text_joins_text_parts() {
        let result = CallToolResult::success(vec![Content::text("18C"), Content::text("cloudy")]);
        assert_eq!(result_text(&result), "18C\ncloudy");
    }

    #[test]
    fn test_error_messages() {
        let err = McpError::ToolNotFound {
            tool: "x".to_string(),
            available: vec!["a".to_string()],
        };
        assert_eq!(err.to_string(), r#"Tool 'x' not available. Available tools: ["a"]"#);
        assert_eq!(McpError::Timeout(30).to_string(), "Connection timeout after 30s");
    }

    #[tokio::test]
    async fn test_connect_stdio_missing_binary() {
        let logger = Arc::new(crate::logging::NoOpLogger::new());
        let result =
            McpClient::connect_stdio("omnimcp-definitely-missing-binary", &[], logger).await;
        assert!(matches!(result, Err(McpError::ConnectionFailed(_))));
    }
}
