//! Chained secret store with fallback behavior

use std::sync::Arc;

use super::traits::{SecretStore, SecretInfo, SecretStoreError, SecretStoreResult};

/// Tries each store in order on reads; writes go to the first store
///
/// # Example
///
/// ```
/// use omnimcp_core::secrets::{SecretStore, ChainSecretStore, EnvSecretStore, MemorySecretStore};
/// use std::sync::Arc;
///
/// let memory = Arc::new(MemorySecretStore::new());
/// let stores: Vec<Arc<dyn SecretStore>> = vec![memory.clone(), Arc::new(EnvSecretStore::new())];
/// let chain = ChainSecretStore::new(stores);
///
/// chain.store("openai-api-key", "sk-test").unwrap();
/// assert_eq!(memory.get("openai-api-key").as_deref(), Some("sk-test"));
/// ```
pub struct ChainSecretStore {
    stores: Vec<Arc<dyn SecretStore>>,
}

impl ChainSecretStore {
    pub fn new(stores: Vec<Arc<dyn SecretStore>>) -> Self {
        Self { stores }
    }

    pub fn stores(&self) -> &[Arc<dyn SecretStore>] {
        &self.stores
    }

    /// First available store holding `key`
    pub fn find_store(&self, key: &str) -> Option<&Arc<dyn SecretStore>> {
        self.stores
            .iter()
            .find(|s| s.is_available() && s.has(key))
    }
}

impl SecretStore for ChainSecretStore {
    fn name(&self) -> &str {
        "chain"
    }

    fn is_available(&self) -> bool {
        self.stores.iter().any(|s| s.is_available())
    }

    fn get(&self, key: &str) -> Option<String> {
        self.stores
            .iter()
            .filter(|s| s.is_available())
            .find_map(|s| s.get(key))
    }

    fn store(&self, key: &str, value: &str) -> SecretStoreResult<()> {
        match self.stores.first() {
            Some(store) => store.store(key, value),
            None => Err(SecretStoreError::Other("empty store chain".to_string())),
        }
    }

    fn delete(&self, key: &str) -> SecretStoreResult<()> {
        // Read-only members keep their copy
        for store in self.stores.iter().filter(|s| s.has(key)) {
            let _ = store.delete(key);
        }
        Ok(())
    }

    fn get_info(&self, key: &str) -> SecretInfo {
        match self.find_store(key) {
            Some(store) => SecretInfo::new(true, store.name()),
            None => SecretInfo::not_found(),
        }
    }
}

impl std::fmt::Debug for ChainSecretStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainSecretStore")
            .field("stores", &self.stores.iter().map(|s| s.name()).collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secrets::{EnvSecretStore, MemorySecretStore};

    #[test]
    fn test_chain_store_fallback_and_priority() {
        let first = Arc::new(MemorySecretStore::new());
        let second = Arc::new(MemorySecretStore::new());
        second.store("key", "from_second").unwrap();

        let chain = ChainSecretStore::new(vec![first.clone(), second.clone()]);
        assert_eq!(chain.get("key"), Some("from_second".to_string()));

        first.store("key", "from_first").unwrap();
        assert_eq!(chain.get("key"), Some("from_first".to_string()));
    }

    #[test]
    fn test_chain_store_write_goes_to_first() {
        let first = Arc::new(MemorySecretStore::new());
        let second = Arc::new(MemorySecretStore::new());
        let chain = ChainSecretStore::new(vec![first.clone(), second.clone()]);

        chain.store("key", "value").unwrap();
        assert!(first.has("key"));
        assert!(!second.has("key"));
    }

    #[test]
    fn test_chain_store_delete_skips_read_only() {
        let memory = Arc::new(MemorySecretStore::new());
        memory.store("key", "value").unwrap();
        let chain = ChainSecretStore::new(vec![Arc::new(EnvSecretStore::new()), memory.clone()]);

        chain.delete("key").unwrap();
        assert!(!memory.has("key"));
    }

    #[test]
    fn test_empty_chain() {
        let chain = ChainSecretStore::new(Vec::new());
        assert!(!chain.is_available());
        assert_eq!(chain.get("key"), None);
        assert!(chain.store("key", "value").is_err());
        assert!(!chain.get_info("key").available);
    }
}
