//! In-memory secret store

use std::collections::HashMap;

use parking_lot::RwLock;

use super::traits::{SecretStore, SecretStoreResult};

/// Read-write store kept in process memory, for tests and ephemeral overrides
#[derive(Debug, Default)]
pub struct MemorySecretStore {
    secrets: RwLock<HashMap<String, String>>,
}

impl MemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_secrets(initial: HashMap<String, String>) -> Self {
        Self {
            secrets: RwLock::new(initial),
        }
    }

    pub fn len(&self) -> usize {
        self.secrets.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SecretStore for MemorySecretStore {
    fn name(&self) -> &str {
        "memory"
    }

    fn get(&self, key: &str) -> Option<String> {
        self.secrets.read().get(key).cloned()
    }

    fn store(&self, key: &str, value: &str) -> SecretStoreResult<()> {
        self.secrets.write().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> SecretStoreResult<()> {
        self.secrets.write().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_crud() {
        let store = MemorySecretStore::new();
        assert_eq!(store.name(), "memory");
        assert!(store.is_empty());

        store.store("openai-api-key", "sk-1").unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("openai-api-key"), Some("sk-1".to_string()));

        store.store("openai-api-key", "sk-2").unwrap();
        assert_eq!(store.get("openai-api-key"), Some("sk-2".to_string()));

        store.delete("openai-api-key").unwrap();
        assert!(!store.has("openai-api-key"));
        assert!(store.is_empty());
    }

    #[test]
    fn test_memory_store_with_initial() {
        let mut initial = HashMap::new();
        initial.insert("a".to_string(), "1".to_string());
        initial.insert("b".to_string(), "2".to_string());

        let store = MemorySecretStore::with_secrets(initial);
        assert_eq!(store.len(), 2);
        assert_eq!(store.get_info("a").source, "memory");
        assert!(!store.get_info("c").available);
    }
}
