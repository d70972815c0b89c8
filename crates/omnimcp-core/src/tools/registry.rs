//! Namespaced tool registry over connected servers

use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::logging::Logger;
use crate::mcp::ToolServer;
use crate::profile::ToolDescriptor;
use crate::types::{Tool, ToolCall, ToolResult};

/// Name the model sees for `tool` on `server_id`
pub fn namespaced_name(server_id: &str, tool: &str) -> String {
    format!("{}_{}", server_id, tool)
}

/// A server tool as offered to the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInfo {
    /// `{server}_{tool}`
    pub name: String,
    pub server_id: String,
    pub original_name: String,
    pub description: String,
    pub input_schema: Value,
}

impl ToolInfo {
    pub fn new(server_id: &str, tool: &ToolDescriptor) -> Self {
        Self {
            name: namespaced_name(server_id, &tool.name),
            server_id: server_id.to_string(),
            original_name: tool.name.clone(),
            description: format!("[{}] {}", server_id, tool.description_or_empty()),
            input_schema: tool.input_schema.clone(),
        }
    }
}

impl From<&ToolInfo> for Tool {
    fn from(info: &ToolInfo) -> Self {
        Tool {
            name: info.name.clone(),
            description: info.description.clone(),
            input_schema: Some(info.input_schema.clone()),
        }
    }
}

/// Outcome of one model tool call
#[derive(Debug, Clone)]
pub struct ToolExecution {
    /// Fed back to the model
    pub result: ToolResult,
    /// Transcript marker, absent when the tool name was unknown
    pub marker: Option<String>,
    /// Resolved original tool name, absent when the tool name was unknown
    pub original_name: Option<String>,
}

struct ServerEntry {
    server: Arc<dyn ToolServer>,
    tools: Vec<ToolInfo>,
}

/// Connected servers, in connection order, with their namespaced tools
pub struct ToolRegistry {
    servers: RwLock<Vec<ServerEntry>>,
    logger: Arc<dyn Logger>,
}

impl ToolRegistry {
    pub fn new(logger: Arc<dyn Logger>) -> Self {
        Self {
            servers: RwLock::new(Vec::new()),
            logger,
        }
    }

    /// Add a server or replace the one with the same id, keeping its position
    ///
    /// Returns the replaced server so the caller can shut it down.
    pub fn register(
        &self,
        server: Arc<dyn ToolServer>,
        tools: &[ToolDescriptor],
    ) -> Option<Arc<dyn ToolServer>> {
        let server_id = server.server_id().to_string();
        let entry = ServerEntry {
            tools: tools.iter().map(|t| ToolInfo::new(&server_id, t)).collect(),
            server,
        };

        crate::log_debug!(
            self.logger,
            "[ToolRegistry] Registered {} tools for '{}'",
            entry.tools.len(),
            server_id
        );

        let mut servers = self.servers.write();
        match servers.iter_mut().find(|e| e.server.server_id() == server_id) {
            Some(existing) => Some(std::mem::replace(existing, entry).server),
            None => {
                servers.push(entry);
                None
            }
        }
    }

    /// Replace the cached tool list of an already registered server
    pub fn update_tools(&self, server_id: &str, tools: &[ToolDescriptor]) {
        let mut servers = self.servers.write();
        if let Some(entry) = servers.iter_mut().find(|e| e.server.server_id() == server_id) {
            entry.tools = tools.iter().map(|t| ToolInfo::new(server_id, t)).collect();
        }
    }

    pub fn remove(&self, server_id: &str) -> Option<Arc<dyn ToolServer>> {
        let mut servers = self.servers.write();
        let index = servers.iter().position(|e| e.server.server_id() == server_id)?;
        Some(servers.remove(index).server)
    }

    pub fn server(&self, server_id: &str) -> Option<Arc<dyn ToolServer>> {
        self.servers
            .read()
            .iter()
            .find(|e| e.server.server_id() == server_id)
            .map(|e| e.server.clone())
    }

    pub fn servers(&self) -> Vec<Arc<dyn ToolServer>> {
        self.servers.read().iter().map(|e| e.server.clone()).collect()
    }

    pub fn server_ids(&self) -> Vec<String> {
        self.servers
            .read()
            .iter()
            .map(|e| e.server.server_id().to_string())
            .collect()
    }

    /// Server id → original tool names, in connection order
    pub fn tool_names_by_server(&self) -> Vec<(String, Vec<String>)> {
        self.servers
            .read()
            .iter()
            .map(|e| {
                (
                    e.server.server_id().to_string(),
                    e.tools.iter().map(|t| t.original_name.clone()).collect(),
                )
            })
            .collect()
    }

    /// Tools offered to the model for `server_id`
    pub fn get_llm_tools(&self, server_id: &str) -> Vec<Tool> {
        self.servers
            .read()
            .iter()
            .filter(|e| e.server.server_id() == server_id)
            .flat_map(|e| e.tools.iter().map(Tool::from))
            .collect()
    }

    /// Tools of every server
    pub fn all_llm_tools(&self) -> Vec<Tool> {
        self.servers
            .read()
            .iter()
            .flat_map(|e| e.tools.iter().map(Tool::from))
            .collect()
    }

    /// Look up a namespaced name
    pub fn resolve(&self, name: &str) -> Option<ToolInfo> {
        self.servers
            .read()
            .iter()
            .flat_map(|e| e.tools.iter())
            .find(|t| t.name == name)
            .cloned()
    }

    /// Look up a namespaced name among the tools of `server_id` only
    pub fn resolve_in(&self, server_id: &str, name: &str) -> Option<ToolInfo> {
        self.servers
            .read()
            .iter()
            .filter(|e| e.server.server_id() == server_id)
            .flat_map(|e| e.tools.iter())
            .find(|t| t.name == name)
            .cloned()
    }

    pub fn tool_count(&self) -> usize {
        self.servers.read().iter().map(|e| e.tools.len()).sum()
    }

    /// Execute a tool call against the tools offered for `server_id`
    ///
    /// Never fails: unknown tools and server errors become error results
    /// that the model gets to see. A name belonging to another server counts
    /// as unknown.
    pub async fn execute_tool_call(&self, server_id: &str, call: &ToolCall) -> ToolExecution {
        let Some(info) = self.resolve_in(server_id, &call.name) else {
            crate::log_warn!(self.logger, "[ToolRegistry] Unknown tool requested: {}", call.name);
            return ToolExecution {
                result: ToolResult::error(&call.id, format!("Error: Tool '{}' not found", call.name)),
                marker: None,
                original_name: None,
            };
        };

        let Some(server) = self.server(&info.server_id) else {
            let message = format!("Tool execution failed: server '{}' is not connected", info.server_id);
            return ToolExecution {
                result: ToolResult::error(&call.id, message.clone()),
                marker: Some(format!("[Error: {}]", message)),
                original_name: Some(info.original_name),
            };
        };

        crate::log_info!(
            self.logger,
            "[ToolRegistry] Executing {}:{} with args: {}",
            info.server_id,
            info.original_name,
            call.input
        );

        match server.call_tool(&info.original_name, call.input.clone()).await {
            Ok(text) => ToolExecution {
                result: ToolResult::success(&call.id, text),
                marker: Some(format!("[Executed {}:{}]", info.server_id, info.original_name)),
                original_name: Some(info.original_name),
            },
            Err(e) => {
                let message = format!("Tool execution failed: {}", e);
                crate::log_error!(self.logger, "[ToolRegistry] {}", message);
                ToolExecution {
                    result: ToolResult::error(&call.id, message.clone()),
                    marker: Some(format!("[Error: {}]", message)),
                    original_name: Some(info.original_name),
                }
            }
        }
    }
}
