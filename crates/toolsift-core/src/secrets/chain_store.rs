//! Chained secret store with fallback behavior

use std::sync::Arc;

use super::traits::{SecretStore, SecretStoreError, SecretStoreResult};

/// Tries each store in order on reads; writes go to the designated write store
///
/// The usual chain is keychain first, then environment variables.
pub struct ChainSecretStore {
    stores: Vec<Arc<dyn SecretStore>>,
    write_store_index: usize,
}

impl ChainSecretStore {
    /// Create a chain; the first store receives writes
    pub fn new(stores: Vec<Arc<dyn SecretStore>>) -> Self {
        Self {
            stores,
            write_store_index: 0,
        }
    }

    /// Route writes to the store at `index` (clamped to the last store)
    pub fn with_write_store(mut self, index: usize) -> Self {
        self.write_store_index = index.min(self.stores.len().saturating_sub(1));
        self
    }

    /// Name of the first available store holding `key`
    pub fn source_of(&self, key: &str) -> Option<&str> {
        self.stores
            .iter()
            .find(|s| s.is_available() && s.has(key))
            .map(|s| s.name())
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
        match self.stores.get(self.write_store_index) {
            Some(store) => store.store(key, value),
            None => Err(SecretStoreError::NotAvailable("empty chain".to_string())),
        }
    }

    fn delete(&self, key: &str) -> SecretStoreResult<()> {
        // Read-only members keep their copy; that is not an error for the chain.
        for store in self.stores.iter().filter(|s| s.has(key)) {
            let _ = store.delete(key);
        }
        Ok(())
    }
}

impl std::fmt::Debug for ChainSecretStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainSecretStore")
            .field("stores", &self.stores.iter().map(|s| s.name()).collect::<Vec<_>>())
            .field("write_store_index", &self.write_store_index)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secrets::{EnvSecretStore, MemorySecretStore};

    #[test]
    fn test_chain_store_priority_and_fallback() {
        let first = Arc::new(MemorySecretStore::new());
        let second = Arc::new(MemorySecretStore::with_secrets([("key", "from_second")]));

        let chain = ChainSecretStore::new(vec![first.clone(), second.clone()]);
        assert_eq!(chain.get("key").as_deref(), Some("from_second"));

        first.store("key", "from_first").unwrap();
        assert_eq!(chain.get("key").as_deref(), Some("from_first"));
        assert_eq!(chain.source_of("key"), Some("memory"));
    }

    #[test]
    fn test_chain_store_write_routing() {
        let env = Arc::new(EnvSecretStore::new());
        let memory = Arc::new(MemorySecretStore::new());

        let chain = ChainSecretStore::new(vec![env, memory.clone()]);
        assert!(matches!(chain.store("k", "v"), Err(SecretStoreError::ReadOnly)));

        let chain = chain.with_write_store(1);
        chain.store("k", "v").unwrap();
        assert_eq!(memory.get("k").as_deref(), Some("v"));

        chain.delete("k").unwrap();
        assert!(!memory.has("k"));
    }

    #[test]
    fn test_empty_chain() {
        let chain = ChainSecretStore::new(vec![]).with_write_store(3);
        assert!(!chain.is_available());
        assert!(chain.get("anything").is_none());
        assert!(matches!(chain.store("k", "v"), Err(SecretStoreError::NotAvailable(_))));
    }
}
