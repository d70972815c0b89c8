//! Client-level error type

use thiserror::Error;

use crate::config::ConfigError;
use crate::mcp::McpError;
use crate::providers::ProviderError;
use crate::routing::RoutingError;
use crate::secrets::SecretStoreError;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error(transparent)]
    Mcp(#[from] McpError),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("Secret error: {0}")]
    Secret(#[from] SecretStoreError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Routing(#[from] RoutingError),

    #[error("No server scripts found in: {0}")]
    NoScriptsFound(String),

    #[error("No servers successfully connected")]
    NoServersConnected,

    #[error("Unknown server: {0}")]
    UnknownServer(String),

    #[error("Operation cancelled")]
    Cancelled,
}

impl ClientError {
    /// Provider errors, folding provider-side cancellation into [`ClientError::Cancelled`]
    pub fn from_provider(err: ProviderError) -> Self {
        match err {
            ProviderError::Cancelled => ClientError::Cancelled,
            other => ClientError::Provider(other),
        }
    }
}

pub type ClientResult<T> = Result<T, ClientError>;
