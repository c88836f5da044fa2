//! Error types for the MCP server

use std::path::PathBuf;

use conan_exec::ExecError;
use thiserror::Error;

use crate::schema::ParamType;
use crate::tools::new::Template;

/// Result type alias for MCP operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while serving tool calls
///
/// Every variant reaching the dispatcher is turned into a failure response;
/// none of them terminate the server.
#[derive(Debug, Error)]
pub enum Error {
    /// Unknown tool requested
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    /// A required parameter was not supplied
    #[error("missing required parameter: {0}")]
    MissingParameter(String),

    /// A parameter was supplied with the wrong JSON type
    #[error("invalid type for parameter '{name}': expected {expected}, got {actual}")]
    InvalidParameterType {
        name: String,
        expected: ParamType,
        actual: String,
    },

    /// `conan_new` was asked for a template Conan does not ship
    #[error("invalid template '{0}', expected one of: {names}", names = Template::NAMES.join(", "))]
    InvalidTemplate(String),

    /// The package manager has no profile with this name
    #[error("profile not found: {0}")]
    ProfileNotFound(String),

    /// Scaffolding would overwrite existing files and `force` was not set
    #[error("refusing to overwrite existing files (set force=true to overwrite): {0}")]
    FileExists(String),

    /// The package manager executable could not be located
    #[error("conan is not available: {0}")]
    DependencyUnavailable(String),

    /// Any other failure reported by the package manager, verbatim
    #[error("conan error: {0}")]
    UnderlyingToolError(String),

    /// Tool arguments are not a JSON object
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    /// Two tools were registered under one name at startup
    #[error("tool already registered: {0}")]
    DuplicateTool(String),

    /// Error during JSON serialization/deserialization
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file could not be read or parsed
    #[error("configuration error in {}: {message}", path.display())]
    Config { path: PathBuf, message: String },
}

impl From<ExecError> for Error {
    fn from(err: ExecError) -> Self {
        match err {
            ExecError::NotFound { .. } => Error::DependencyUnavailable(err.to_string()),
            ExecError::CommandFailed { stderr, .. } => Error::UnderlyingToolError(stderr),
            ExecError::Timeout { .. } => Error::UnderlyingToolError(err.to_string()),
            ExecError::Io(e) => Error::Io(e),
        }
    }
}
