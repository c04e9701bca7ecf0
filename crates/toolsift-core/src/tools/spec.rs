//! Declared tool schemas and argument validation

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use thiserror::Error;

use crate::types::ToolDefinition;

/// Type of a single tool parameter
///
/// Only the four primitives can be indexed and offered to a model. `Other`
/// preserves whatever an imported schema declared so the mapper can reject it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    Integer,
    Float,
    String,
    Boolean,
    Other(String),
}

impl ParamType {
    /// Map a JSON Schema `type` keyword
    pub fn from_json_type(name: &str) -> Self {
        match name {
            "integer" => ParamType::Integer,
            "number" => ParamType::Float,
            "string" => ParamType::String,
            "boolean" => ParamType::Boolean,
            other => ParamType::Other(other.to_string()),
        }
    }

    /// JSON Schema `type` keyword for this parameter
    pub fn json_type(&self) -> &str {
        match self {
            ParamType::Integer => "integer",
            ParamType::Float => "number",
            ParamType::String => "string",
            ParamType::Boolean => "boolean",
            ParamType::Other(name) => name,
        }
    }

    pub fn is_primitive(&self) -> bool {
        !matches!(self, ParamType::Other(_))
    }

    fn accepts(&self, value: &Value) -> bool {
        match self {
            ParamType::Integer => value.is_i64() || value.is_u64(),
            ParamType::Float => value.is_number(),
            ParamType::String => value.is_string(),
            ParamType::Boolean => value.is_boolean(),
            ParamType::Other(_) => false,
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamType::Float => f.write_str("float"),
            other => f.write_str(other.json_type()),
        }
    }
}

/// One named, typed parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub param_type: ParamType,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_required")]
    pub required: bool,
}

fn default_required() -> bool {
    true
}

impl ParamSpec {
    /// A required parameter
    pub fn new(name: impl Into<String>, param_type: ParamType) -> Self {
        Self {
            name: name.into(),
            param_type,
            description: String::new(),
            required: true,
        }
    }

    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, ParamType::Integer)
    }

    pub fn float(name: impl Into<String>) -> Self {
        Self::new(name, ParamType::Float)
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, ParamType::String)
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, ParamType::Boolean)
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }
}

/// Identity and schema of a tool: unique name, description, ordered parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub parameters: Vec<ParamSpec>,
}

impl ToolSpec {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: Vec::new(),
        }
    }

    pub fn with_param(mut self, param: ParamSpec) -> Self {
        self.parameters.push(param);
        self
    }

    pub fn param(&self, name: &str) -> Option<&ParamSpec> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// JSON Schema object describing the parameters
    pub fn json_schema(&self) -> Value {
        let mut properties = Map::new();
        for param in &self.parameters {
            let mut property = Map::new();
            property.insert("type".to_string(), json!(param.param_type.json_type()));
            if !param.description.is_empty() {
                property.insert("description".to_string(), json!(param.description));
            }
            properties.insert(param.name.clone(), Value::Object(property));
        }

        let required: Vec<&str> = self
            .parameters
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
            .collect();

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    /// Definition offered to the model
    pub fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(&self.name, &self.description, self.json_schema())
    }

    /// Check `input` against the declared parameters
    ///
    /// `null` is accepted as "no arguments". Unknown keys, missing required
    /// parameters and type mismatches are rejected.
    pub fn validate_args(&self, input: &Value) -> Result<ToolArgs, ArgumentError> {
        let args = match input {
            Value::Null => Map::new(),
            Value::Object(map) => map.clone(),
            other => {
                return Err(ArgumentError::NotAnObject {
                    found: json_kind(other).to_string(),
                })
            }
        };

        if let Some(unknown) = args.keys().find(|k| self.param(k).is_none()) {
            return Err(ArgumentError::Unknown(unknown.clone()));
        }

        for param in &self.parameters {
            match args.get(&param.name) {
                None | Some(Value::Null) if param.required => {
                    return Err(ArgumentError::Missing(param.name.clone()));
                }
                None | Some(Value::Null) => {}
                Some(value) if !param.param_type.accepts(value) => {
                    return Err(ArgumentError::TypeMismatch {
                        name: param.name.clone(),
                        expected: param.param_type.clone(),
                        found: json_kind(value).to_string(),
                    });
                }
                Some(_) => {}
            }
        }

        Ok(ToolArgs(args))
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Rejected tool arguments
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArgumentError {
    #[error("arguments must be a JSON object, got {found}")]
    NotAnObject { found: String },

    #[error("missing required argument '{0}'")]
    Missing(String),

    #[error("unknown argument '{0}'")]
    Unknown(String),

    #[error("argument '{name}' expected {expected}, got {found}")]
    TypeMismatch {
        name: String,
        expected: ParamType,
        found: String,
    },
}

/// Arguments that passed validation against a `ToolSpec`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolArgs(Map<String, Value>);

impl ToolArgs {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.0.get(key).and_then(Value::as_i64)
    }

    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.0.get(key).and_then(Value::as_f64)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.0.get(key).and_then(Value::as_bool)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}
