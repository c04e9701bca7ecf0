//! Tool definitions, the registry and document mapping
//!
//! ## Architecture
//!
//! ```text
//! ToolSpec + ToolHandler ──► Tool ──► ToolRegistry (name ──► Tool)
//!                             │
//!                             └──► ObjectMapper ──► ToolDocument ──► index
//! ```

mod document;
mod registry;
mod spec;
mod tool;

pub use document::{MappingError, MappingResult, ObjectMapper, ToolDocument, ToolDocumentMapper};
pub use registry::{RegistryError, RegistryResult, ToolRegistry};
pub use spec::{ArgumentError, ParamSpec, ParamType, ToolArgs, ToolSpec};
pub use tool::{FnHandler, Tool, ToolError, ToolHandler, ToolOutput};
