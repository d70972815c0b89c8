//! Runtime settings for the universal client

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::file::FileConfigProvider;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid YAML in {path}: {message}")]
    Parse { path: String, message: String },

    #[error("Invalid value for {key}: '{value}'")]
    InvalidValue { key: String, value: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Everything the client reads at startup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// LLM provider id (`openai`, or `mock` for offline runs)
    pub provider: String,
    pub model: String,
    /// Override for OpenAI-compatible endpoints
    pub api_base: Option<String>,
    pub max_tokens: u32,
    pub temperature: f32,
    pub connection_timeout_secs: u64,
    pub retry_attempts: u32,
    pub retry_delay_ms: u64,
    pub max_concurrent_servers: usize,
    /// Upper bound on model turns that may request tools within one query
    pub max_tool_rounds: u32,
    /// Secret holding the LLM backend credential
    pub llm_secret_name: String,
    pub log_level: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_base: None,
            max_tokens: 5000,
            temperature: 0.7,
            connection_timeout_secs: 30,
            retry_attempts: 3,
            retry_delay_ms: 1000,
            max_concurrent_servers: 5,
            max_tool_rounds: 10,
            llm_secret_name: "openai-api-key".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl ClientConfig {
    /// Load defaults, config files and environment, then validate
    ///
    /// `explicit` replaces the workspace file when given.
    pub fn load(explicit: Option<&Path>, workspace_root: Option<&Path>) -> ConfigResult<Self> {
        let mut config = Self::default();

        FileConfigProvider::user().load()?.apply_to(&mut config);
        match (explicit, workspace_root) {
            (Some(path), _) => FileConfigProvider::explicit(path).load_required()?.apply_to(&mut config),
            (None, Some(root)) => FileConfigProvider::workspace(root).load()?.apply_to(&mut config),
            (None, None) => {}
        }

        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from the process environment
    pub fn apply_env(&mut self) -> ConfigResult<()> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any variable lookup
    pub fn apply_env_from<F>(&mut self, lookup: F) -> ConfigResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("LLM_PROVIDER") {
            self.provider = v;
        }
        if let Some(v) = get("OPENAI_MODEL") {
            self.model = v;
        }
        if let Some(v) = get("OPENAI_API_BASE") {
            self.api_base = Some(v);
        }
        if let Some(v) = get("LLM_SECRET_NAME") {
            self.llm_secret_name = v;
        }
        if let Some(v) = get("LOG_LEVEL") {
            self.log_level = v.to_lowercase();
        }

        parse_into(&get, "MAX_TOKENS", &mut self.max_tokens)?;
        parse_into(&get, "TEMPERATURE", &mut self.temperature)?;
        parse_into(&get, "CONNECTION_TIMEOUT", &mut self.connection_timeout_secs)?;
        parse_into(&get, "RETRY_ATTEMPTS", &mut self.retry_attempts)?;
        parse_into(&get, "RETRY_DELAY_MS", &mut self.retry_delay_ms)?;
        parse_into(&get, "MAX_CONCURRENT_SERVERS", &mut self.max_concurrent_servers)?;
        parse_into(&get, "MAX_TOOL_ROUNDS", &mut self.max_tool_rounds)?;

        Ok(())
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.max_tokens == 0 {
            return Err(ConfigError::Invalid("max_tokens must be positive".to_string()));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::Invalid(format!(
                "temperature must be between 0 and 2, got {}",
                self.temperature
            )));
        }
        if self.retry_attempts == 0 {
            return Err(ConfigError::Invalid("retry_attempts must be at least 1".to_string()));
        }
        if self.max_concurrent_servers == 0 {
            return Err(ConfigError::Invalid("max_concurrent_servers must be at least 1".to_string()));
        }
        if self.max_tool_rounds == 0 {
            return Err(ConfigError::Invalid("max_tool_rounds must be at least 1".to_string()));
        }
        Ok(())
    }

    pub fn connection_timeout(&self) -> Duration {
        Duration::from_secs(self.connection_timeout_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

fn parse_into<T, G>(get: &G, key: &str, slot: &mut T) -> ConfigResult<()>
where
    T: FromStr,
    G: Fn(&str) -> Option<String>,
{
    if let Some(raw) = get(key) {
        *slot = raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
            key: key.to_string(),
            value: raw.clone(),
        })?;
    }
    Ok(())
}
