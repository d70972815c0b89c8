//! Core traits and types for secret storage

use thiserror::Error;

/// Information about a secret
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretInfo {
    pub available: bool,
    /// Which store provided the secret (useful for chain stores)
    pub source: String,
}

impl SecretInfo {
    pub fn new(available: bool, source: impl Into<String>) -> Self {
        Self {
            available,
            source: source.into(),
        }
    }

    pub fn not_found() -> Self {
        Self {
            available: false,
            source: "none".to_string(),
        }
    }
}

#[derive(Error, Debug)]
pub enum SecretStoreError {
    #[error("Store is read-only")]
    ReadOnly,

    #[error("Secret not found: {0}")]
    NotFound(String),

    #[error("Store error: {0}")]
    Other(String),
}

pub type SecretStoreResult<T> = Result<T, SecretStoreError>;

/// Trait for secret storage implementations
///
/// Keys are secret names as the client knows them, e.g. `openai-api-key`.
/// How a name maps onto the backing storage is up to the store.
///
/// # Example
///
/// ```
/// use omnimcp_core::secrets::{SecretStore, MemorySecretStore};
///
/// let store = MemorySecretStore::new();
/// store.store("openai-api-key", "sk-test").unwrap();
/// assert!(store.has("openai-api-key"));
/// ```
pub trait SecretStore: Send + Sync {
    fn name(&self) -> &str;

    /// A store may be compiled in but unusable on this host
    fn is_available(&self) -> bool {
        true
    }

    fn get(&self, key: &str) -> Option<String>;

    /// Returns `Err(SecretStoreError::ReadOnly)` if the store doesn't support writing.
    fn store(&self, key: &str, value: &str) -> SecretStoreResult<()>;

    fn delete(&self, key: &str) -> SecretStoreResult<()>;

    fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    fn get_info(&self, key: &str) -> SecretInfo {
        if self.has(key) {
            SecretInfo::new(true, self.name())
        } else {
            SecretInfo::not_found()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_info() {
        let info = SecretInfo::new(true, "env");
        assert!(info.available);
        assert_eq!(info.source, "env");

        let not_found = SecretInfo::not_found();
        assert!(!not_found.available);
        assert_eq!(not_found.source, "none");
    }
}
