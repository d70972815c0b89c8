//! Server launching and live connections
//!
//! [`ToolServer`] is the seam the rest of the crate consumes: list tools and
//! call one by name. [`ServerLauncher`] turns a script path into a
//! [`ServerConnection`] with per-attempt timeouts and linear backoff.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;

use super::client::{result_text, McpClient, McpError, McpResult};
use crate::config::ClientConfig;
use crate::logging::Logger;
use crate::profile::ToolDescriptor;

/// A connected tool server as seen by the client
#[async_trait]
pub trait ToolServer: Send + Sync {
    fn server_id(&self) -> &str;

    /// Current tool list
    async fn list_tools(&self) -> McpResult<Vec<ToolDescriptor>>;

    /// Invoke `name`; the result is the text content of the reply
    async fn call_tool(&self, name: &str, arguments: Value) -> McpResult<String>;

    async fn shutdown(&self) -> McpResult<()>;
}

/// Interpreter for a server script, chosen by extension
pub fn interpreter_for(path: &Path) -> McpResult<&'static str> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("py") => Ok("python"),
        Some("js") => Ok("node"),
        Some(other) => Err(McpError::UnsupportedScript(format!(".{}", other))),
        None => Err(McpError::UnsupportedScript(path.display().to_string())),
    }
}

/// Retry and timeout policy for launching servers
#[derive(Debug, Clone)]
pub struct LaunchPolicy {
    pub timeout: Duration,
    pub retry_attempts: u32,
    pub retry_delay: Duration,
}

impl LaunchPolicy {
    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            timeout: config.connection_timeout(),
            retry_attempts: config.retry_attempts.max(1),
            retry_delay: config.retry_delay(),
        }
    }

    /// Pause after the 0-based `attempt` failed
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.retry_delay * (attempt + 1)
    }
}

impl Default for LaunchPolicy {
    fn default() -> Self {
        Self::from_config(&ClientConfig::default())
    }
}

pub struct ServerLauncher {
    policy: LaunchPolicy,
    logger: Arc<dyn Logger>,
}

impl ServerLauncher {
    pub fn new(policy: LaunchPolicy, logger: Arc<dyn Logger>) -> Self {
        Self { policy, logger }
    }

    pub fn policy(&self) -> &LaunchPolicy {
        &self.policy
    }

    /// Launch the script at `path` and connect to it as `server_id`
    ///
    /// A missing script or unknown extension fails at once; transport
    /// failures are retried until the policy's attempts run out.
    pub async fn launch(&self, server_id: &str, path: &Path) -> McpResult<ServerConnection> {
        if !path.exists() {
            return Err(McpError::ScriptNotFound(path.display().to_string()));
        }
        let command = interpreter_for(path)?;
        let args = vec![path.display().to_string()];

        let attempts = self.policy.retry_attempts;
        let mut last_error = String::new();
        for attempt in 0..attempts {
            match self.attempt(server_id, command, &args).await {
                Ok(connection) => {
                    crate::log_info!(
                        self.logger,
                        "[ServerLauncher] Connected to server '{}' (attempt {})",
                        server_id,
                        attempt + 1
                    );
                    return Ok(connection);
                }
                Err(e) => {
                    crate::log_warn!(
                        self.logger,
                        "[ServerLauncher] Connection attempt {} failed: {}",
                        attempt + 1,
                        e
                    );
                    last_error = e.to_string();
                    if attempt + 1 < attempts {
                        tokio::time::sleep(self.policy.backoff(attempt)).await;
                    }
                }
            }
        }

        Err(McpError::RetriesExhausted {
            server: server_id.to_string(),
            attempts,
            last_error,
        })
    }

    async fn attempt(
        &self,
        server_id: &str,
        command: &str,
        args: &[String],
    ) -> McpResult<ServerConnection> {
        let connect = async {
            let client = McpClient::connect_stdio(command, args, self.logger.clone()).await?;
            ServerConnection::open(server_id, client, self.logger.clone()).await
        };

        tokio::time::timeout(self.policy.timeout, connect)
            .await
            .map_err(|_| McpError::Timeout(self.policy.timeout.as_secs()))?
    }
}

/// One live server session plus its last known tool list
pub struct ServerConnection {
    server_id: String,
    client: McpClient,
    tools: RwLock<Vec<ToolDescriptor>>,
    logger: Arc<dyn Logger>,
}

impl ServerConnection {
    /// Wrap an initialized client and fetch its tools
    pub async fn open(server_id: &str, client: McpClient, logger: Arc<dyn Logger>) -> McpResult<Self> {
        let tools: Vec<ToolDescriptor> = client
            .list_tools()
            .await?
            .into_iter()
            .map(ToolDescriptor::from)
            .collect();

        crate::log_info!(
            logger,
            "[ServerConnection] Server '{}' initialized with {} tools: {:?}",
            server_id,
            tools.len(),
            tools.iter().map(|t| t.name.as_str()).collect::<Vec<_>>()
        );

        Ok(Self {
            server_id: server_id.to_string(),
            client,
            tools: RwLock::new(tools),
            logger,
        })
    }

    pub fn client(&self) -> &McpClient {
        &self.client
    }

    pub fn tool_names(&self) -> Vec<String> {
        self.tools.read().iter().map(|t| t.name.clone()).collect()
    }
}

#[async_trait]
impl ToolServer for ServerConnection {
    fn server_id(&self) -> &str {
        &self.server_id
    }

    async fn list_tools(&self) -> McpResult<Vec<ToolDescriptor>> {
        let tools: Vec<ToolDescriptor> = self
            .client
            .list_tools()
            .await?
            .into_iter()
            .map(ToolDescriptor::from)
            .collect();
        *self.tools.write() = tools.clone();
        Ok(tools)
    }

    async fn call_tool(&self, name: &str, arguments: Value) -> McpResult<String> {
        if self.client.is_closed().await {
            return Err(McpError::NotConnected);
        }
        let known = self.tools.read().iter().any(|t| t.name == name);
        if !known {
            return Err(McpError::ToolNotFound {
                tool: name.to_string(),
                available: self.tool_names(),
            });
        }

        let result = self.client.call_tool(name, arguments).await.map_err(|e| {
            crate::log_error!(self.logger, "[ServerConnection] Tool execution failed for '{}': {}", name, e);
            e
        })?;

        let text = result_text(&result);
        if result.is_error.unwrap_or(false) {
            return Err(McpError::ToolCallFailed(text));
        }
        crate::log_debug!(self.logger, "[ServerConnection] Tool '{}' completed successfully", name);
        Ok(text)
    }

    async fn shutdown(&self) -> McpResult<()> {
        self.client.close().await?;
        crate::log_info!(self.logger, "[ServerConnection] Disconnected from server '{}'", self.server_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::NoOpLogger;
    use std::path::PathBuf;

    fn launcher() -> ServerLauncher {
        let policy = LaunchPolicy {
            timeout: Duration::from_secs(1),
            retry_attempts: 2,
            retry_delay: Duration::from_millis(1),
        };
        ServerLauncher::new(policy, Arc::new(NoOpLogger::new()))
    }

    #[test]
    fn test_interpreter_by_extension() {
        assert_eq!(interpreter_for(Path::new("servers/weather.py")).unwrap(), "python");
        assert_eq!(interpreter_for(Path::new("servers/files.js")).unwrap(), "node");
        assert!(matches!(
            interpreter_for(Path::new("servers/tool.sh")),
            Err(McpError::UnsupportedScript(ext)) if ext == ".sh"
        ));
        assert!(interpreter_for(Path::new("servers/README")).is_err());
    }

    #[test]
    fn test_linear_backoff() {
        let policy = LaunchPolicy {
            timeout: Duration::from_secs(30),
            retry_attempts: 3,
            retry_delay: Duration::from_millis(1000),
        };
        assert_eq!(policy.backoff(0), Duration::from_millis(1000));
        assert_eq!(policy.backoff(1), Duration::from_millis(2000));
        assert_eq!(policy.backoff(2), Duration::from_millis(3000));
    }

    #[test]
    fn test_policy_from_config() {
        let config = ClientConfig {
            retry_attempts: 0,
            ..ClientConfig::default()
        };
        let policy = LaunchPolicy::from_config(&config);
        assert_eq!(policy.retry_attempts, 1);
        assert_eq!(policy.timeout, Duration::from_secs(30));
    }

    #[tokio::test]
    async fn test_launch_missing_script() {
        let err = launcher()
            .launch("ghost", &PathBuf::from("/nonexistent/ghost.py"))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, McpError::ScriptNotFound(_)));
    }

    #[tokio::test]
    async fn test_launch_unsupported_script() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("server.rb");
        std::fs::write(&script, "puts 'hi'").unwrap();

        let err = launcher().launch("ruby", &script).await.err().unwrap();
        assert!(matches!(err, McpError::UnsupportedScript(_)));
    }
}
