//! Provider error types

use thiserror::Error;

/// Errors that can occur during provider operations
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("API key is required for {provider}")]
    MissingApiKey { provider: String },

    #[error("{provider} API error ({status}): {message}")]
    ApiError {
        provider: String,
        status: u16,
        message: String,
    },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Request cancelled")]
    Cancelled,

    #[error("Invalid response from {provider}: {message}")]
    InvalidResponse { provider: String, message: String },

    #[error("{provider} rate limited: {message}")]
    RateLimited { provider: String, message: String },

    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    #[error("{0}")]
    Other(String),
}

impl ProviderError {
    pub fn api_error(provider: impl Into<String>, status: u16, message: impl Into<String>) -> Self {
        Self::ApiError {
            provider: provider.into(),
            status,
            message: message.into(),
        }
    }

    pub fn missing_api_key(provider: impl Into<String>) -> Self {
        Self::MissingApiKey {
            provider: provider.into(),
        }
    }

    pub fn invalid_response(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn rate_limited(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::RateLimited {
            provider: provider.into(),
            message: message.into(),
        }
    }
}

pub type ProviderResult<T> = Result<T, ProviderError>;
