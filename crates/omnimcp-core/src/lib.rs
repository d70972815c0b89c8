//! OmniMCP Core
//!
//! A client for any MCP tool server. Servers are never described ahead of
//! time: each one is profiled from its advertised tool list (names,
//! descriptions and input schemas), and that profile drives query routing,
//! the system prompt and the completion check of the tool-calling loop.
//!
//! ## Pipeline
//!
//! - `profile`: tool categories, domain, capability flags, schema hints
//! - `workflow`: lexical dependencies, traced tool chains, completion predicates
//! - `prompt`: system prompt synthesized from a profile and the live tools
//! - `routing`: picks the primary server for a query
//! - `agent`: the tool-calling state machine
//!
//! ```rust,ignore
//! use omnimcp_core::{ClientConfig, TracingLogger, UniversalClient};
//!
//! let client = UniversalClient::new(ClientConfig::load(None, None)?, Arc::new(TracingLogger::new()))?;
//! client.connect_to_server("weather", Path::new("servers/weather.py")).await?;
//!
//! let answer = client.process_query("What's the weather in Paris?").await?;
//! client.shutdown().await;
//! ```

pub mod types;
pub mod secrets;
pub mod logging;
pub mod config;
pub mod providers;
pub mod tools;
pub mod mcp;
pub mod profile;
pub mod workflow;
pub mod prompt;
pub mod routing;
pub mod agent;
pub mod error;
pub mod client;

// Re-export commonly used types
pub use types::{
    ChatMessage, ContentPart, MessageRole, MessageContent,
    Tool, ToolCall, ToolResult,
    CancellationToken,
};

pub use secrets::{
    SecretStore, SecretInfo, SecretStoreError, SecretStoreResult,
    EnvSecretStore, MemorySecretStore, ChainSecretStore, SecretResolver,
};

pub use logging::{Logger, SharedLogger, NoOpLogger, TracingLogger};

pub use config::{ClientConfig, ConfigError, ConfigResult, FileConfigProvider};

pub use providers::{
    Provider, ProviderError, ProviderResult, ChatOptions, ChatResponse,
    MockProvider, OpenAiProvider, create_provider,
};

pub use tools::{ToolRegistry, ToolInfo};

pub use mcp::{McpClient, McpError, McpResult, ServerLauncher, ServerConnection, ToolServer};

pub use profile::{build_profile, classify_tool, detect_domain, Domain, ServerProfile, ToolCategory, ToolDescriptor};

pub use workflow::{infer_workflows, CompletionPredicate, WorkflowChecklist, WorkflowCompletion, WorkflowPattern};

pub use prompt::generate_prompt;

pub use routing::{route, QueryType, RoutingError, RoutingPlan};

pub use agent::{LoopOutcome, LoopState, ToolLoop};

pub use error::{ClientError, ClientResult};

pub use client::UniversalClient;
