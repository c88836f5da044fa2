//! Tool descriptors and parameter schemas
//!
//! A [`ToolDescriptor`] pairs a tool name with its declared parameters and
//! the handler implementing it. The declared parameters drive both argument
//! validation in the dispatcher and the JSON Schema advertised via
//! `tools/list`.

use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value, json};

use crate::handler::ToolHandler;

/// Declared type of a tool parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    String,
    StringList,
    Boolean,
}

impl ParamType {
    /// Check whether a JSON value is acceptable for this type.
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            ParamType::String => value.is_string(),
            ParamType::Boolean => value.is_boolean(),
            ParamType::StringList => value
                .as_array()
                .is_some_and(|items| items.iter().all(Value::is_string)),
        }
    }

    fn json_schema(&self) -> Value {
        match self {
            ParamType::String => json!({ "type": "string" }),
            ParamType::Boolean => json!({ "type": "boolean" }),
            ParamType::StringList => json!({ "type": "array", "items": { "type": "string" } }),
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamType::String => write!(f, "string"),
            ParamType::StringList => write!(f, "array of strings"),
            ParamType::Boolean => write!(f, "boolean"),
        }
    }
}

/// Human-readable name of a JSON value's type, used in error messages.
pub fn describe_value(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(items) if items.iter().all(Value::is_string) => "array of strings",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// One declared parameter of a tool
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSpec {
    pub name: String,
    pub param_type: ParamType,
    pub required: bool,
    /// Substituted when an optional parameter is omitted
    pub default: Option<Value>,
    pub description: String,
    /// Advertised as a JSON Schema `enum`; membership is checked by the handler
    pub choices: Vec<String>,
    /// A string list that may also arrive as one comma-separated string
    pub comma_separated: bool,
}

impl ParameterSpec {
    /// A parameter that must be present in every request.
    pub fn required(name: &str, param_type: ParamType, description: &str) -> Self {
        Self {
            name: name.to_string(),
            param_type,
            required: true,
            default: None,
            description: description.to_string(),
            choices: Vec::new(),
            comma_separated: false,
        }
    }

    /// A parameter that may be omitted.
    pub fn optional(name: &str, param_type: ParamType, description: &str) -> Self {
        Self {
            required: false,
            ..Self::required(name, param_type, description)
        }
    }

    /// Set the value substituted when the parameter is omitted.
    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Advertise the accepted values.
    pub fn with_choices<I, S>(mut self, choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.choices = choices.into_iter().map(Into::into).collect();
        self
    }

    /// Also accept `"a,b"` for a string list.
    pub fn comma_separated(mut self) -> Self {
        self.comma_separated = true;
        self
    }

    /// Split a comma-separated string into a string list. Other values are
    /// returned unchanged.
    pub fn coerce(&self, value: Value) -> Value {
        match value {
            Value::String(text)
                if self.comma_separated && self.param_type == ParamType::StringList =>
            {
                text.split(',')
                    .map(str::trim)
                    .filter(|part| !part.is_empty())
                    .map(|part| Value::String(part.to_string()))
                    .collect()
            }
            other => other,
        }
    }

    fn json_schema(&self) -> Value {
        if self.comma_separated && self.param_type == ParamType::StringList {
            return json!({
                "anyOf": [self.param_type.json_schema(), { "type": "string" }],
                "description": self.description,
            });
        }
        let mut schema = self.param_type.json_schema();
        if let Value::Object(ref mut obj) = schema {
            obj.insert("description".into(), Value::String(self.description.clone()));
            if !self.choices.is_empty() {
                obj.insert("enum".into(), json!(self.choices));
            }
            if let Some(default) = &self.default {
                obj.insert("default".into(), default.clone());
            }
        }
        schema
    }
}

/// A named, schema-described tool and its handler
#[derive(Clone)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub parameters: Vec<ParameterSpec>,
    pub handler: Arc<dyn ToolHandler>,
}

impl ToolDescriptor {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        handler: Arc<dyn ToolHandler>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: Vec::new(),
            handler,
        }
    }

    /// Declare a parameter (builder pattern). Declaration order is kept.
    pub fn param(mut self, spec: ParameterSpec) -> Self {
        self.parameters.push(spec);
        self
    }

    pub fn parameter(&self, name: &str) -> Option<&ParameterSpec> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// JSON Schema for the tool's arguments, as advertised to clients.
    pub fn input_schema(&self) -> Value {
        let properties: Map<String, Value> = self
            .parameters
            .iter()
            .map(|p| (p.name.clone(), p.json_schema()))
            .collect();
        let required: Vec<&str> = self
            .parameters
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
            .collect();

        let mut schema = json!({
            "type": "object",
            "properties": properties,
        });
        if !required.is_empty() {
            schema["required"] = json!(required);
        }
        schema
    }
}

impl fmt::Debug for ToolDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolDescriptor")
            .field("name", &self.name)
            .field("parameters", &self.parameters)
            .finish_non_exhaustive()
    }
}
