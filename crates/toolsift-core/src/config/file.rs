//! File-based configuration provider (YAML)
//!
//! Supports user-level (~/.config/toolsift/config.yaml) and workspace-level
//! (.config/toolsift/config.yaml) files.

use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;

use super::error::ConfigResult;
use super::settings::ToolsiftConfig;

/// Config level (user or workspace)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigLevel {
    User,
    Workspace,
}

impl ConfigLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigLevel::User => "user",
            ConfigLevel::Workspace => "workspace",
        }
    }
}

/// Reads, caches and writes a `ToolsiftConfig` YAML file
///
/// A missing file loads as the default configuration.
///
/// ```no_run
/// use toolsift_core::config::FileConfigProvider;
///
/// let config = FileConfigProvider::user().get()?;
/// println!("top_k = {}", config.agent.top_k);
/// # Ok::<(), toolsift_core::config::ConfigError>(())
/// ```
pub struct FileConfigProvider {
    path: PathBuf,
    level: ConfigLevel,
    cache: RwLock<Option<ToolsiftConfig>>,
}

impl FileConfigProvider {
    pub fn new(path: impl Into<PathBuf>, level: ConfigLevel) -> Self {
        Self {
            path: path.into(),
            level,
            cache: RwLock::new(None),
        }
    }

    /// User-level config (`~/.config/toolsift/config.yaml` on Linux)
    pub fn user() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")).join(".config"));
        Self::new(config_dir.join("toolsift").join("config.yaml"), ConfigLevel::User)
    }

    /// Workspace-level config (`<root>/.config/toolsift/config.yaml`)
    pub fn workspace(workspace_root: impl AsRef<Path>) -> Self {
        let path = workspace_root
            .as_ref()
            .join(".config")
            .join("toolsift")
            .join("config.yaml");
        Self::new(path, ConfigLevel::Workspace)
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

    fn load(&self) -> ConfigResult<ToolsiftConfig> {
        if !self.path.exists() {
            return Ok(ToolsiftConfig::default());
        }

        let content = fs::read_to_string(&self.path)?;
        let config: ToolsiftConfig = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Cached configuration, loading it on first use
    pub fn get(&self) -> ConfigResult<ToolsiftConfig> {
        if let Some(config) = self.cache.read().as_ref() {
            return Ok(config.clone());
        }
        self.reload()
    }

    /// Re-read the file, replacing the cache
    pub fn reload(&self) -> ConfigResult<ToolsiftConfig> {
        let config = self.load()?;
        *self.cache.write() = Some(config.clone());
        Ok(config)
    }

    /// Validate and write `config`, creating parent directories as needed
    pub fn save(&self, config: &ToolsiftConfig) -> ConfigResult<()> {
        config.validate()?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_yaml::to_string(config)?)?;

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

/// Resolve the effective configuration: workspace file if present, else user file, else defaults
pub fn load_effective(workspace_root: Option<&Path>) -> ConfigResult<ToolsiftConfig> {
    if let Some(root) = workspace_root {
        let workspace = FileConfigProvider::workspace(root);
        if workspace.exists() {
            return workspace.get();
        }
    }
    FileConfigProvider::user().get()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigError, EmbeddingSettings};
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempdir().unwrap();
        let provider = FileConfigProvider::new(dir.path().join("config.yaml"), ConfigLevel::User);

        assert!(!provider.exists());
        assert_eq!(provider.get().unwrap(), ToolsiftConfig::default());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempdir().unwrap();
        let provider = FileConfigProvider::workspace(dir.path());
        assert_eq!(provider.level(), ConfigLevel::Workspace);

        let mut config = ToolsiftConfig::default();
        config.agent.top_k = 4;
        config.model.provider = "anthropic".to_string();
        config.embedding = EmbeddingSettings::Http {
            model: "text-embedding-3-small".to_string(),
            api_base: Some("http://localhost:8080/v1".to_string()),
        };
        provider.save(&config).unwrap();

        assert!(provider.exists());
        let content = fs::read_to_string(provider.path()).unwrap();
        assert!(content.contains("anthropic"));

        let fresh = FileConfigProvider::workspace(dir.path());
        assert_eq!(fresh.reload().unwrap(), config);
        assert_eq!(load_effective(Some(dir.path())).unwrap(), config);
    }

    #[test]
    fn test_invalid_file_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "agent:\n  top_k: 0\n").unwrap();

        let provider = FileConfigProvider::new(&path, ConfigLevel::User);
        assert!(matches!(provider.get(), Err(ConfigError::Invalid { .. })));

        fs::write(&path, "agent: [not, a, map]\n").unwrap();
        assert!(matches!(provider.reload(), Err(ConfigError::Yaml(_))));
    }
}
