//! File-based configuration (YAML)
//!
//! Supports user-level (`~/.config/omnimcp/config.yaml`), workspace-level
//! (`.config/omnimcp/config.yaml`) and explicitly named files.

use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use super::settings::{ClientConfig, ConfigError, ConfigResult};

/// On-disk shape: every key optional, unset keys leave the lower layer alone
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_timeout_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_attempts: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_delay_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_concurrent_servers: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tool_rounds: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub llm_secret_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
}

impl ConfigFile {
    /// Overlay the keys present in this file onto `config`
    pub fn apply_to(&self, config: &mut ClientConfig) {
        fn set<T: Clone>(slot: &mut T, value: &Option<T>) {
            if let Some(v) = value {
                *slot = v.clone();
            }
        }

        set(&mut config.provider, &self.provider);
        set(&mut config.model, &self.model);
        if self.api_base.is_some() {
            config.api_base = self.api_base.clone();
        }
        set(&mut config.max_tokens, &self.max_tokens);
        set(&mut config.temperature, &self.temperature);
        set(&mut config.connection_timeout_secs, &self.connection_timeout_secs);
        set(&mut config.retry_attempts, &self.retry_attempts);
        set(&mut config.retry_delay_ms, &self.retry_delay_ms);
        set(&mut config.max_concurrent_servers, &self.max_concurrent_servers);
        set(&mut config.max_tool_rounds, &self.max_tool_rounds);
        set(&mut config.llm_secret_name, &self.llm_secret_name);
        set(&mut config.log_level, &self.log_level);
    }
}

/// Config level (user, workspace, or a path given on the command line)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigLevel {
    User,
    Workspace,
    Explicit,
}

impl ConfigLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigLevel::User => "user",
            ConfigLevel::Workspace => "workspace",
            ConfigLevel::Explicit => "explicit",
        }
    }
}

/// Reads and writes one YAML config file
///
/// # Example
///
/// ```no_run
/// use omnimcp_core::config::{ClientConfig, FileConfigProvider};
///
/// let mut config = ClientConfig::default();
/// FileConfigProvider::user().load().unwrap().apply_to(&mut config);
/// ```
pub struct FileConfigProvider {
    path: PathBuf,
    level: ConfigLevel,
    cache: RwLock<Option<ConfigFile>>,
}

impl FileConfigProvider {
    pub fn new(path: impl Into<PathBuf>, level: ConfigLevel) -> Self {
        Self {
            path: path.into(),
            level,
            cache: RwLock::new(None),
        }
    }

    /// `~/.config/omnimcp/config.yaml` (platform config dir)
    pub fn user() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")).join(".config"));
        Self::new(config_dir.join("omnimcp").join("config.yaml"), ConfigLevel::User)
    }

    /// `<root>/.config/omnimcp/config.yaml`
    pub fn workspace(workspace_root: impl AsRef<Path>) -> Self {
        let path = workspace_root.as_ref().join(".config").join("omnimcp").join("config.yaml");
        Self::new(path, ConfigLevel::Workspace)
    }

    pub fn explicit(path: impl Into<PathBuf>) -> Self {
        Self::new(path, ConfigLevel::Explicit)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn level(&self) -> ConfigLevel {
        self.level
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Load the file; a missing file is an empty overlay
    pub fn load(&self) -> ConfigResult<ConfigFile> {
        if let Some(config) = self.cache.read().as_ref() {
            return Ok(config.clone());
        }
        if !self.exists() {
            return Ok(ConfigFile::default());
        }
        self.reload()
    }

    /// Load the file; a missing file is an error
    pub fn load_required(&self) -> ConfigResult<ConfigFile> {
        if !self.exists() {
            return Err(ConfigError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("config file not found: {}", self.path.display()),
            )));
        }
        self.load()
    }

    /// Re-read from disk, bypassing the cache
    pub fn reload(&self) -> ConfigResult<ConfigFile> {
        let content = fs::read_to_string(&self.path)?;
        let config: ConfigFile = if content.trim().is_empty() {
            ConfigFile::default()
        } else {
            serde_yaml::from_str(&content).map_err(|e| ConfigError::Parse {
                path: self.path.display().to_string(),
                message: e.to_string(),
            })?
        };
        *self.cache.write() = Some(config.clone());
        Ok(config)
    }

    pub fn save(&self, config: &ConfigFile) -> ConfigResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = serde_yaml::to_string(config).map_err(|e| ConfigError::Parse {
            path: self.path.display().to_string(),
            message: e.to_string(),
        })?;
        fs::write(&self.path, content)?;

        *self.cache.write() = Some(config.clone());
        Ok(())
    }
}

impl std::fmt::Debug for FileConfigProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileConfigProvider")
            .field("path", &self.path)
            .field("level", &self.level)
            .field("exists", &self.exists())
            .finish()
    }
}
