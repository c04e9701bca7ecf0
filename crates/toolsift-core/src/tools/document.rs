//! Tool to document mapping
//!
//! The index never embeds a tool directly. It embeds a `ToolDocument`, a
//! plain-text rendering of the tool's name, description and parameters, and
//! keeps the tool name as a back-reference.

use thiserror::Error;

use super::spec::ToolSpec;

/// Text rendering of one tool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolDocument {
    pub tool_name: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MappingError {
    #[error("tool '{tool}' parameter '{parameter}' has unsupported type '{type_name}'")]
    UnsupportedSchema {
        tool: String,
        parameter: String,
        type_name: String,
    },
}

pub type MappingResult<T> = Result<T, MappingError>;

/// Turns tools into indexable documents and back into tool names
pub trait ObjectMapper: Send + Sync {
    fn to_document(&self, spec: &ToolSpec) -> MappingResult<ToolDocument>;

    fn from_document<'a>(&self, document: &'a ToolDocument) -> &'a str {
        &document.tool_name
    }
}

/// Default mapper
///
/// Output is a pure function of the `ToolSpec`:
///
/// ```text
/// multiply
/// Multiply two integers and return the result
/// parameters: a (integer, required); b (integer, required)
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct ToolDocumentMapper;

impl ToolDocumentMapper {
    pub fn new() -> Self {
        Self
    }
}

impl ObjectMapper for ToolDocumentMapper {
    fn to_document(&self, spec: &ToolSpec) -> MappingResult<ToolDocument> {
        let mut params = Vec::with_capacity(spec.parameters.len());
        for param in &spec.parameters {
            if !param.param_type.is_primitive() {
                return Err(MappingError::UnsupportedSchema {
                    tool: spec.name.clone(),
                    parameter: param.name.clone(),
                    type_name: param.param_type.json_type().to_string(),
                });
            }

            let presence = if param.required { "required" } else { "optional" };
            let mut rendered = format!("{} ({}, {})", param.name, param.param_type, presence);
            if !param.description.is_empty() {
                rendered.push_str(": ");
                rendered.push_str(&param.description);
            }
            params.push(rendered);
        }

        let mut text = format!("{}\n{}", spec.name, spec.description);
        if !params.is_empty() {
            text.push_str("\nparameters: ");
            text.push_str(&params.join("; "));
        }

        Ok(ToolDocument {
            tool_name: spec.name.clone(),
            text,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::{ParamSpec, ParamType};

    #[test]
    fn test_document_text_is_deterministic() {
        let spec = ToolSpec::new("multiply", "Multiply two integers and return the result")
            .with_param(ParamSpec::integer("a"))
            .with_param(ParamSpec::integer("b").with_description("second factor"));

        let mapper = ToolDocumentMapper::new();
        let doc = mapper.to_document(&spec).unwrap();

        assert_eq!(
            doc.text,
            "multiply\nMultiply two integers and return the result\n\
             parameters: a (integer, required); b (integer, required): second factor"
        );
        assert_eq!(mapper.to_document(&spec).unwrap(), doc);
        assert_eq!(mapper.from_document(&doc), "multiply");
    }

    #[test]
    fn test_no_parameters_and_long_description() {
        let description = "word ".repeat(2_000);
        let spec = ToolSpec::new("ping", description.clone());
        let doc = ToolDocumentMapper.to_document(&spec).unwrap();
        assert_eq!(doc.text, format!("ping\n{}", description));
    }

    #[test]
    fn test_unsupported_type_rejected() {
        let spec = ToolSpec::new("tag", "Tag items")
            .with_param(ParamSpec::new("items", ParamType::Other("array".to_string())));

        assert_eq!(
            ToolDocumentMapper.to_document(&spec),
            Err(MappingError::UnsupportedSchema {
                tool: "tag".to_string(),
                parameter: "items".to_string(),
                type_name: "array".to_string(),
            })
        );
    }
}
