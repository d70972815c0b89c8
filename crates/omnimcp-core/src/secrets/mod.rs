//! Secret storage for the LLM backend credential
//!
//! - `SecretStore` trait for synchronous stores
//! - `EnvSecretStore`, `MemorySecretStore`, `ChainSecretStore`
//! - `SecretResolver`, the async, caching front door used by the client
//!
//! Domain secrets (a weather API key, say) are never read here: the model is
//! told to fetch those through the server's own secret tool.

mod traits;
mod env_store;
mod memory_store;
mod chain_store;
mod resolver;

pub use traits::{SecretStore, SecretInfo, SecretStoreError, SecretStoreResult};
pub use env_store::EnvSecretStore;
pub use memory_store::MemorySecretStore;
pub use chain_store::ChainSecretStore;
pub use resolver::SecretResolver;
