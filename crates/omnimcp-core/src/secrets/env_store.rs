//! Environment variable secret store

use std::collections::HashMap;
use std::env;

use once_cell::sync::Lazy;

use super::traits::{SecretStore, SecretStoreError, SecretStoreResult};

/// Well-known secret names and the variables that may hold them
static ENV_VAR_MAP: Lazy<HashMap<&'static str, Vec<&'static str>>> = Lazy::new(|| {
    let mut m = HashMap::new();
    m.insert("openai-api-key", vec!["OPENAI_API_KEY"]);
    m.insert("openai", vec!["OPENAI_API_KEY"]);
    m.insert("azure-openai-api-key", vec!["AZURE_OPENAI_API_KEY", "AZURE_API_KEY"]);
    m.insert("openrouter-api-key", vec!["OPENROUTER_API_KEY"]);
    m
});

/// Read-only store over the process environment
///
/// A key is looked up three ways, first hit wins:
/// 1. the key itself (`OPENAI_API_KEY`)
/// 2. the well-known mapping (`openai-api-key` → `OPENAI_API_KEY`)
/// 3. the upper-snake form of the key (`owm-api-key` → `OWM_API_KEY`)
///
/// Empty values count as missing.
#[derive(Debug, Default)]
pub struct EnvSecretStore {
    _private: (),
}

impl EnvSecretStore {
    pub fn new() -> Self {
        Self { _private: () }
    }

    /// Upper-snake form of a secret name
    pub fn env_var_name(key: &str) -> String {
        key.chars()
            .map(|c| match c {
                '-' | '.' | ' ' => '_',
                c => c.to_ascii_uppercase(),
            })
            .collect()
    }

    fn read(var: &str) -> Option<String> {
        env::var(var).ok().filter(|v| !v.is_empty())
    }
}

impl SecretStore for EnvSecretStore {
    fn name(&self) -> &str {
        "env"
    }

    fn get(&self, key: &str) -> Option<String> {
        if let Some(value) = Self::read(key) {
            return Some(value);
        }

        if let Some(vars) = ENV_VAR_MAP.get(key.to_lowercase().as_str()) {
            if let Some(value) = vars.iter().find_map(|v| Self::read(v)) {
                return Some(value);
            }
        }

        Self::read(&Self::env_var_name(key))
    }

    fn store(&self, _key: &str, _value: &str) -> SecretStoreResult<()> {
        Err(SecretStoreError::ReadOnly)
    }

    fn delete(&self, _key: &str) -> SecretStoreResult<()> {
        Err(SecretStoreError::ReadOnly)
    }
}
