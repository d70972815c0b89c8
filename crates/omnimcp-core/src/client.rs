//! Universal MCP client
//!
//! Connects to any number of tool servers, profiles each one from its tool
//! list alone, and answers queries by routing them to the best-fitting
//! server and driving the tool-calling loop against it.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use parking_lot::RwLock;

use crate::agent::{LoopSettings, ToolLoop};
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::logging::Logger;
use crate::mcp::{LaunchPolicy, ServerLauncher, ToolServer};
use crate::profile::{build_profile, ServerProfile, ToolDescriptor};
use crate::prompt::generate_prompt;
use crate::providers::{create_provider, Provider};
use crate::routing::route;
use crate::secrets::SecretResolver;
use crate::tools::ToolRegistry;
use crate::types::CancellationToken;
use crate::workflow::{infer_workflows, WorkflowCompletion};

/// Script extensions picked up by [`UniversalClient::auto_discover_servers`]
pub const SERVER_SCRIPT_EXTENSIONS: &[&str] = &["py", "js"];

pub struct UniversalClient {
    config: ClientConfig,
    provider: Arc<dyn Provider>,
    secrets: SecretResolver,
    launcher: ServerLauncher,
    registry: ToolRegistry,
    /// Connection order
    profiles: RwLock<Vec<ServerProfile>>,
    cancel: CancellationToken,
    logger: Arc<dyn Logger>,
}

impl UniversalClient {
    /// Client with the configured provider and environment secrets
    pub fn new(config: ClientConfig, logger: Arc<dyn Logger>) -> ClientResult<Self> {
        let provider = create_provider(&config.provider, logger.clone())?;
        let secrets = SecretResolver::from_env(logger.clone());
        Self::with_provider(config, provider, secrets, logger)
    }

    pub fn with_provider(
        config: ClientConfig,
        provider: Arc<dyn Provider>,
        secrets: SecretResolver,
        logger: Arc<dyn Logger>,
    ) -> ClientResult<Self> {
        config.validate()?;
        let launcher = ServerLauncher::new(LaunchPolicy::from_config(&config), logger.clone());

        crate::log_info!(
            logger,
            "[UniversalClient] Initialized with provider '{}' and model '{}'",
            provider.name(),
            config.model
        );

        Ok(Self {
            config,
            provider,
            secrets,
            launcher,
            registry: ToolRegistry::new(logger.clone()),
            profiles: RwLock::new(Vec::new()),
            cancel: CancellationToken::new(),
            logger,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Token checked by every running query; cancelling it is permanent
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Launch the script at `path` and register it as `server_id`
    pub async fn connect_to_server(&self, server_id: &str, path: &Path) -> ClientResult<ServerProfile> {
        crate::log_info!(
            self.logger,
            "[UniversalClient] Connecting to server '{}' at '{}'",
            server_id,
            path.display()
        );
        let connection = self.launcher.launch(server_id, path).await?;
        self.add_server(Arc::new(connection)).await
    }

    /// Profile an already connected server and make it routable
    ///
    /// Re-adding a server id replaces its profile and tools wholesale.
    pub async fn add_server(&self, server: Arc<dyn ToolServer>) -> ClientResult<ServerProfile> {
        let tools = server.list_tools().await?;
        let profile = build_profile(server.server_id(), &tools);

        crate::log_info!(
            self.logger,
            "[UniversalClient] Server '{}' profiled: {} domain with {} tools",
            profile.server_id,
            profile.domain.map(|d| d.as_str()).unwrap_or("unknown"),
            profile.tools.len()
        );

        let replaced = self.registry.register(server.clone(), &tools);
        {
            let mut profiles = self.profiles.write();
            match profiles.iter_mut().find(|p| p.server_id == profile.server_id) {
                Some(existing) => *existing = profile.clone(),
                None => profiles.push(profile.clone()),
            }
        }

        if let Some(old) = replaced.filter(|old| !Arc::ptr_eq(old, &server)) {
            crate::log_info!(
                self.logger,
                "[UniversalClient] Closing previous connection for '{}'",
                profile.server_id
            );
            if let Err(e) = old.shutdown().await {
                crate::log_error!(
                    self.logger,
                    "[UniversalClient] Error disconnecting previous '{}': {}",
                    profile.server_id,
                    e
                );
            }
        }
        Ok(profile)
    }

    /// Connect to every `*.py` / `*.js` script in `dir`
    ///
    /// Scripts are launched with at most `max_concurrent_servers` in flight
    /// and registered in file-name order. Individual failures are logged and
    /// skipped. Returns the ids that connected.
    pub async fn auto_discover_servers(&self, dir: &Path) -> ClientResult<Vec<String>> {
        crate::log_info!(self.logger, "[UniversalClient] Auto-discovering servers in: {}", dir.display());

        let scripts = discover_scripts(dir)?;
        if scripts.is_empty() {
            return Err(ClientError::NoScriptsFound(dir.display().to_string()));
        }

        let launches: Vec<_> = stream::iter(scripts)
            .map(|path| async move {
                let server_id = server_id_for(&path);
                let result = self.launcher.launch(&server_id, &path).await;
                (server_id, path, result)
            })
            .buffered(self.config.max_concurrent_servers.max(1))
            .collect()
            .await;

        let mut connected = Vec::new();
        for (server_id, path, result) in launches {
            let outcome = match result {
                Ok(connection) => self.add_server(Arc::new(connection)).await,
                Err(e) => Err(e.into()),
            };
            match outcome {
                Ok(_) => connected.push(server_id),
                Err(e) => crate::log_warn!(
                    self.logger,
                    "[UniversalClient] Failed to connect to {}: {}",
                    path.display(),
                    e
                ),
            }
        }

        if self.profiles.read().is_empty() {
            return Err(ClientError::NoServersConnected);
        }
        crate::log_info!(
            self.logger,
            "[UniversalClient] Successfully connected to {} servers",
            connected.len()
        );
        Ok(connected)
    }

    /// Profiles in connection order
    pub fn profiles(&self) -> Vec<ServerProfile> {
        self.profiles.read().clone()
    }

    pub fn profile(&self, server_id: &str) -> Option<ServerProfile> {
        self.profiles
            .read()
            .iter()
            .find(|p| p.server_id == server_id)
            .cloned()
    }

    /// Server id and its tool names, in connection order
    pub fn list_connected_servers(&self) -> Vec<(String, Vec<String>)> {
        self.registry.tool_names_by_server()
    }

    /// Live tools of `server_id`, refreshing the registry
    async fn live_tools(&self, server_id: &str) -> ClientResult<(Arc<dyn ToolServer>, Vec<ToolDescriptor>)> {
        let server = self
            .registry
            .server(server_id)
            .ok_or_else(|| ClientError::UnknownServer(server_id.to_string()))?;
        let tools = server.list_tools().await?;
        self.registry.update_tools(server_id, &tools);
        Ok((server, tools))
    }

    /// System prompt for `server_id` built from its current tools
    pub async fn system_prompt(&self, server_id: &str) -> ClientResult<String> {
        let profile = self
            .profile(server_id)
            .ok_or_else(|| ClientError::UnknownServer(server_id.to_string()))?;
        let (_, tools) = self.live_tools(server_id).await?;

        let prompt = generate_prompt(&profile, &tools);
        crate::log_info!(
            self.logger,
            "[UniversalClient] Generated {} character system prompt for '{}'",
            prompt.len(),
            server_id
        );
        crate::log_debug!(self.logger, "[UniversalClient] System prompt: {}", prompt);
        Ok(prompt)
    }

    /// Answer `query` with the best-fitting server's tools
    pub async fn process_query(&self, query: &str) -> ClientResult<String> {
        crate::log_info!(self.logger, "[UniversalClient] Processing query: {}", query);

        let plan = route(query, &self.profiles())?;
        crate::log_info!(
            self.logger,
            "[UniversalClient] Routed to '{}' as {} query",
            plan.primary_server,
            plan.query_type.as_str()
        );

        let profile = self
            .profile(&plan.primary_server)
            .ok_or_else(|| ClientError::UnknownServer(plan.primary_server.clone()))?;
        let (_, tools) = self.live_tools(&plan.primary_server).await?;
        let system_prompt = generate_prompt(&profile, &tools);
        let completion = WorkflowCompletion::from_patterns(&infer_workflows(&tools));

        let api_key = if self.provider.requires_api_key() {
            Some(self.secrets.get_secret(&self.config.llm_secret_name).await?)
        } else {
            None
        };
        let settings = LoopSettings::from_config(&self.config, api_key);

        let tool_loop = ToolLoop::new(
            self.provider.as_ref(),
            &self.registry,
            &completion,
            &settings,
            self.logger.clone(),
        );
        let outcome = tool_loop
            .run(&plan.primary_server, &system_prompt, query, &self.cancel)
            .await?;

        crate::log_info!(
            self.logger,
            "[UniversalClient] Query finished after {} tool rounds",
            outcome.rounds
        );
        Ok(outcome.response)
    }

    /// Close every connection; errors are logged, not returned
    pub async fn shutdown(&self) {
        self.logger.info("[UniversalClient] Shutting down...");
        for server in self.registry.servers() {
            let server_id = server.server_id().to_string();
            if let Err(e) = server.shutdown().await {
                crate::log_error!(
                    self.logger,
                    "[UniversalClient] Error disconnecting '{}': {}",
                    server_id,
                    e
                );
            }
            self.registry.remove(&server_id);
        }
        self.profiles.write().clear();
        self.logger.info("[UniversalClient] Shutdown complete");
    }
}

/// Server id for a script: its file stem
pub fn server_id_for(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Server scripts directly inside `dir`, sorted by path
pub fn discover_scripts(dir: &Path) -> ClientResult<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir).map_err(|_| ClientError::NoScriptsFound(dir.display().to_string()))?;

    let mut scripts: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file())
        .filter(|path| {
            path.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|ext| SERVER_SCRIPT_EXTENSIONS.contains(&ext))
        })
        .collect();
    scripts.sort();
    Ok(scripts)
}
