//! Async secret resolution with a per-resolver cache

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use super::traits::{SecretStore, SecretStoreError, SecretStoreResult};
use super::{ChainSecretStore, EnvSecretStore};
use crate::logging::Logger;

/// Suspending `get_secret(name)` over any [`SecretStore`]
///
/// Hits are cached for the lifetime of the resolver, misses are not, so a
/// key exported after a failed lookup is still picked up on the next query.
pub struct SecretResolver {
    store: Arc<dyn SecretStore>,
    cache: Mutex<HashMap<String, String>>,
    logger: Arc<dyn Logger>,
}

impl SecretResolver {
    pub fn new(store: Arc<dyn SecretStore>, logger: Arc<dyn Logger>) -> Self {
        Self {
            store,
            cache: Mutex::new(HashMap::new()),
            logger,
        }
    }

    /// Resolver over the process environment only
    pub fn from_env(logger: Arc<dyn Logger>) -> Self {
        let chain = ChainSecretStore::new(vec![Arc::new(EnvSecretStore::new())]);
        Self::new(Arc::new(chain), logger)
    }

    pub async fn get_secret(&self, name: &str) -> SecretStoreResult<String> {
        if let Some(value) = self.cache.lock().get(name) {
            return Ok(value.clone());
        }

        let store = Arc::clone(&self.store);
        let key = name.to_string();
        // Stores may block (keychains, files); keep that off the async workers
        let value = tokio::task::spawn_blocking(move || store.get(&key))
            .await
            .map_err(|e| SecretStoreError::Other(e.to_string()))?;

        match value {
            Some(value) => {
                crate::log_debug!(
                    self.logger,
                    "[SecretResolver] Resolved '{}' from {}",
                    name,
                    self.store.get_info(name).source
                );
                self.cache.lock().insert(name.to_string(), value.clone());
                Ok(value)
            }
            None => {
                crate::log_warn!(self.logger, "[SecretResolver] Secret '{}' not found", name);
                Err(SecretStoreError::NotFound(name.to_string()))
            }
        }
    }

    pub fn clear_cache(&self) {
        self.cache.lock().clear();
    }
}
