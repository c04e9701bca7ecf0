//! Tool registry
//!
//! The single source of truth for which tools exist. One registry is shared
//! (behind an `Arc`) by the object index and the agent loop.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use thiserror::Error;

use super::tool::Tool;
use crate::logging::Logger;

/// Registry errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("tool '{0}' is already registered")]
    DuplicateName(String),

    #[error("tool '{0}' is not registered")]
    NotFound(String),
}

pub type RegistryResult<T> = Result<T, RegistryError>;

struct Entry {
    tool: Tool,
    seq: u64,
}

#[derive(Default)]
struct Inner {
    tools: HashMap<String, Entry>,
    next_seq: u64,
}

/// Name-keyed collection of tools
pub struct ToolRegistry {
    inner: RwLock<Inner>,
    logger: Arc<dyn Logger>,
}

impl ToolRegistry {
    /// Create an empty registry
    pub fn new(logger: Arc<dyn Logger>) -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            logger,
        }
    }

    /// Register a tool; its name must not already be taken
    pub fn register(&self, tool: Tool) -> RegistryResult<()> {
        let mut inner = self.inner.write();
        if inner.tools.contains_key(tool.name()) {
            self.logger.warn(&format!(
                "[ToolRegistry] Rejected duplicate tool: {}",
                tool.name()
            ));
            return Err(RegistryError::DuplicateName(tool.name().to_string()));
        }

        let seq = inner.next_seq;
        inner.next_seq += 1;
        self.logger.debug(&format!("[ToolRegistry] Registered tool: {}", tool.name()));
        inner.tools.insert(tool.name().to_string(), Entry { tool, seq });
        Ok(())
    }

    /// Register several tools, stopping at the first failure
    pub fn register_all(&self, tools: impl IntoIterator<Item = Tool>) -> RegistryResult<()> {
        for tool in tools {
            self.register(tool)?;
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> RegistryResult<Tool> {
        self.inner
            .read()
            .tools
            .get(name)
            .map(|e| e.tool.clone())
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))
    }

    pub fn remove(&self, name: &str) -> RegistryResult<Tool> {
        let removed = self.inner.write().tools.remove(name);
        match removed {
            Some(entry) => {
                self.logger.debug(&format!("[ToolRegistry] Removed tool: {}", name));
                Ok(entry.tool)
            }
            None => Err(RegistryError::NotFound(name.to_string())),
        }
    }

    /// Snapshot of every registered tool, in registration order
    ///
    /// Later registrations or removals do not affect a snapshot already taken.
    pub fn list(&self) -> impl Iterator<Item = Tool> {
        let inner = self.inner.read();
        let mut entries: Vec<(u64, Tool)> = inner
            .tools
            .values()
            .map(|e| (e.seq, e.tool.clone()))
            .collect();
        drop(inner);
        entries.sort_by_key(|(seq, _)| *seq);
        entries.into_iter().map(|(_, tool)| tool)
    }

    pub fn names(&self) -> Vec<String> {
        self.list().map(|t| t.name().to_string()).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.inner.read().tools.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.inner.read().tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::{LogLevel, MemoryLogger, NoOpLogger};
    use crate::tools::ToolSpec;
    use serde_json::Value;

    fn tool(name: &str) -> Tool {
        Tool::from_sync(ToolSpec::new(name, format!("{} tool", name)), |_| Ok(Value::Null))
    }

    #[test]
    fn test_register_and_get() {
        let registry = ToolRegistry::new(NoOpLogger::shared());
        registry.register(tool("multiply")).unwrap();

        assert_eq!(registry.get("multiply").unwrap().name(), "multiply");
        assert!(registry.contains("multiply"));
        assert_eq!(registry.len(), 1);
        assert_eq!(
            registry.get("add").unwrap_err(),
            RegistryError::NotFound("add".to_string())
        );
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let logger = Arc::new(MemoryLogger::new());
        let registry = ToolRegistry::new(logger.clone());
        registry.register(tool("add")).unwrap();

        assert_eq!(
            registry.register(tool("add")).unwrap_err(),
            RegistryError::DuplicateName("add".to_string())
        );
        assert_eq!(registry.len(), 1);
        assert!(logger.contains(LogLevel::Warn, "duplicate tool: add"));
    }

    #[test]
    fn test_list_is_ordered_snapshot() {
        let registry = ToolRegistry::new(NoOpLogger::shared());
        registry
            .register_all(["c", "a", "b"].into_iter().map(tool))
            .unwrap();

        let snapshot = registry.list();
        registry.register(tool("d")).unwrap();
        registry.remove("a").unwrap();

        let names: Vec<String> = snapshot.map(|t| t.name().to_string()).collect();
        assert_eq!(names, vec!["c", "a", "b"]);
        assert_eq!(registry.names(), vec!["c", "b", "d"]);
    }

    #[test]
    fn test_remove_missing() {
        let registry = ToolRegistry::new(NoOpLogger::shared());
        assert!(registry.is_empty());
        assert!(matches!(registry.remove("x"), Err(RegistryError::NotFound(_))));
    }
}
