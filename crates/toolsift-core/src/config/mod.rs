//! Configuration
//!
//! - `ToolsiftConfig`: agent, model and embedding settings (YAML)
//! - `FileConfigProvider`: user-level or workspace-level YAML file

mod error;
mod settings;
mod file;

pub use error::{ConfigError, ConfigResult};
pub use settings::{AgentConfig, EmbeddingSettings, ModelSettings, ToolsiftConfig};
pub use file::{load_effective, ConfigLevel, FileConfigProvider};
