//! Secret storage for provider and embedding API keys
//!
//! - `SecretStore` trait for implementing custom stores
//! - Built-in implementations: `EnvSecretStore`, `MemorySecretStore`,
//!   `ChainSecretStore`, `KeychainSecretStore`

mod traits;
mod env_store;
mod memory_store;
mod chain_store;
mod keychain_store;

use std::sync::Arc;

pub use traits::{SecretStore, SecretStoreError, SecretStoreResult};
pub use env_store::EnvSecretStore;
pub use memory_store::MemorySecretStore;
pub use chain_store::ChainSecretStore;
pub use keychain_store::KeychainSecretStore;

/// The default lookup chain: system keychain first, then environment variables
pub fn default_secret_store() -> Arc<dyn SecretStore> {
    Arc::new(ChainSecretStore::new(vec![
        Arc::new(KeychainSecretStore::new()),
        Arc::new(EnvSecretStore::new()),
    ]))
}
