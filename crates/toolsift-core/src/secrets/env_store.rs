//! Environment variable secret store

use std::collections::HashMap;
use std::env;

use once_cell::sync::Lazy;

use super::traits::{SecretStore, SecretStoreError, SecretStoreResult};

/// Provider ids mapped to the environment variables that conventionally hold their keys
static ENV_VAR_MAP: Lazy<HashMap<&'static str, &'static [&'static str]>> = Lazy::new(|| {
    let mut m: HashMap<&'static str, &'static [&'static str]> = HashMap::new();
    m.insert("openai", &["OPENAI_API_KEY"]);
    m.insert("anthropic", &["ANTHROPIC_API_KEY"]);
    m.insert("gemini", &["GEMINI_API_KEY", "GOOGLE_API_KEY"]);
    m.insert("groq", &["GROQ_API_KEY"]);
    m.insert("mistral", &["MISTRAL_API_KEY"]);
    m.insert("openrouter", &["OPENROUTER_API_KEY"]);
    m.insert("azure", &["AZURE_OPENAI_API_KEY", "AZURE_API_KEY"]);
    m.insert("embedding", &["TOOLSIFT_EMBEDDING_API_KEY", "OPENAI_API_KEY"]);
    m.insert("ollama", &[]);
    m
});

/// Read-only secret store backed by environment variables
///
/// Lookup order for a key:
/// 1. the key itself as a variable name (`OPENAI_API_KEY`)
/// 2. the variables mapped to a known provider id (`openai`)
/// 3. `<KEY>_API_KEY`
#[derive(Debug, Default)]
pub struct EnvSecretStore;

impl EnvSecretStore {
    pub fn new() -> Self {
        Self
    }

    /// Get the environment variable names for a provider
    pub fn env_vars_for(provider: &str) -> Option<&'static [&'static str]> {
        ENV_VAR_MAP.get(provider.to_lowercase().as_str()).copied()
    }

    fn non_empty(name: &str) -> Option<String> {
        env::var(name).ok().filter(|v| !v.is_empty())
    }
}

impl SecretStore for EnvSecretStore {
    fn name(&self) -> &str {
        "env"
    }

    fn get(&self, key: &str) -> Option<String> {
        if let Some(value) = Self::non_empty(key) {
            return Some(value);
        }

        if let Some(vars) = Self::env_vars_for(key) {
            if let Some(value) = vars.iter().find_map(|v| Self::non_empty(v)) {
                return Some(value);
            }
        }

        Self::non_empty(&format!("{}_API_KEY", key.to_uppercase()))
    }

    fn store(&self, _key: &str, _value: &str) -> SecretStoreResult<()> {
        Err(SecretStoreError::ReadOnly)
    }

    fn delete(&self, _key: &str) -> SecretStoreResult<()> {
        Err(SecretStoreError::ReadOnly)
    }
}
