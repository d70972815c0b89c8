//! MCP (Model Context Protocol) client module
//!
//! Uses the official rmcp SDK. Servers are launched as child processes
//! speaking MCP over stdio; Streamable HTTP is available for remote servers.
//!
//! # Example
//!
//! ```rust,ignore
//! use omnimcp_core::mcp::{LaunchPolicy, ServerLauncher, ToolServer};
//!
//! let launcher = ServerLauncher::new(LaunchPolicy::default(), logger);
//! let server = launcher.launch("weather", Path::new("servers/weather.py")).await?;
//!
//! let tools = server.list_tools().await?;
//! let text = server.call_tool("get_secret", json!({"secret_name": "OWM-API-KEY"})).await?;
//! ```

mod client;
mod connection;

pub use client::{result_text, McpClient, McpError, McpResult};
pub use connection::{interpreter_for, LaunchPolicy, ServerConnection, ServerLauncher, ToolServer};

// Re-export rmcp types that consumers might need
pub use rmcp::model::{CallToolResult as McpToolResult, Tool as McpTool};
