//! Request validation and handler invocation

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::args::Arguments;
use crate::registry::ToolRegistry;
use crate::schema::{ParameterSpec, describe_value};
use crate::{Error, Result};

/// A single tool invocation as received from the caller
#[derive(Debug, Clone, PartialEq)]
pub struct ToolRequest {
    pub tool_name: String,
    pub arguments: Map<String, Value>,
}

impl ToolRequest {
    pub fn new(tool_name: impl Into<String>, arguments: Map<String, Value>) -> Self {
        Self {
            tool_name: tool_name.into(),
            arguments,
        }
    }

    /// Build a request from loosely-typed protocol arguments. `null` means no
    /// arguments; anything other than an object is rejected.
    pub fn from_value(tool_name: impl Into<String>, arguments: Value) -> Result<Self> {
        match arguments {
            Value::Null => Ok(Self::new(tool_name, Map::new())),
            Value::Object(map) => Ok(Self::new(tool_name, map)),
            other => Err(Error::InvalidArguments(format!(
                "tool arguments must be an object, got {}",
                describe_value(&other)
            ))),
        }
    }
}

/// Outcome of a dispatched tool call
#[derive(Debug, Clone, PartialEq)]
pub enum ToolResult {
    Success(Value),
    Failure(String),
}

impl ToolResult {
    pub fn is_success(&self) -> bool {
        matches!(self, ToolResult::Success(_))
    }
}

/// Validates requests against their descriptors and invokes handlers
#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: Arc<ToolRegistry>,
}

impl Dispatcher {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Dispatch a request, converting every failure into
    /// [`ToolResult::Failure`]. Nothing is retried.
    pub async fn dispatch(&self, request: ToolRequest) -> ToolResult {
        let tool = request.tool_name.clone();
        match self.try_dispatch(request).await {
            Ok(payload) => {
                tracing::info!(tool = %tool, "Tool call succeeded");
                ToolResult::Success(payload)
            }
            Err(e) => {
                tracing::warn!(tool = %tool, error = %e, "Tool call failed");
                ToolResult::Failure(e.to_string())
            }
        }
    }

    /// Dispatch a request, keeping the typed error.
    pub async fn try_dispatch(&self, request: ToolRequest) -> Result<Value> {
        let descriptor = self.registry.lookup(&request.tool_name)?;
        let args = normalize_arguments(&descriptor.parameters, request.arguments)?;

        tracing::debug!(tool = %descriptor.name, args = ?args, "Invoking handler");
        descriptor.handler.call(args).await
    }
}

/// Validate supplied arguments against declared parameters and fill in
/// defaults.
///
/// Parameters are checked in declaration order, so the first offending
/// parameter is the one reported. A `null` value counts as omitted.
/// Arguments that were not declared are dropped.
pub fn normalize_arguments(
    parameters: &[ParameterSpec],
    mut supplied: Map<String, Value>,
) -> Result<Arguments> {
    let mut normalized = Map::new();

    for spec in parameters {
        match supplied.remove(&spec.name) {
            Some(Value::Null) | None => {
                if spec.required {
                    return Err(Error::MissingParameter(spec.name.clone()));
                }
                if let Some(default) = &spec.default {
                    normalized.insert(spec.name.clone(), default.clone());
                }
            }
            Some(value) => {
                let value = spec.coerce(value);
                if !spec.param_type.matches(&value) {
                    return Err(Error::InvalidParameterType {
                        name: spec.name.clone(),
                        expected: spec.param_type,
                        actual: describe_value(&value).to_string(),
                    });
                }
                normalized.insert(spec.name.clone(), value);
            }
        }
    }

    if !supplied.is_empty() {
        tracing::debug!(
            ignored = ?supplied.keys().collect::<Vec<_>>(),
            "Ignoring undeclared arguments"
        );
    }

    Ok(Arguments::new(normalized))
}
