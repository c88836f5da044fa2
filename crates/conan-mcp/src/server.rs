//! MCP Server implementation
//!
//! Reads newline-delimited JSON-RPC messages, answers protocol methods
//! directly and forwards `tools/call` to the [`Dispatcher`]. One message is
//! processed at a time.

use std::sync::Arc;

use conan_exec::{CONAN_PROGRAM, CommandRunner, MissingProgram, ProcessRunner, locate_conan};
use serde_json::{Value, json};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use crate::config::ServerConfig;
use crate::conan::Conan;
use crate::dispatch::{Dispatcher, ToolRequest};
use crate::protocol::{
    INTERNAL_ERROR, INVALID_PARAMS, INVALID_REQUEST, InitializeResult, JsonRpcRequest, JsonRpcResponse,
    METHOD_NOT_FOUND, PARSE_ERROR, PROTOCOL_VERSION, ServerCapabilities, ServerInfo,
    ToolCallParams, ToolsCapability,
};
use crate::response::CallToolResult;
use crate::tools::builtin_registry;
use crate::{Error, Result};

const SERVER_NAME: &str = "conan-mcp";

const INSTRUCTIONS: &str = "Tools for the Conan C/C++ package manager: inspect profiles, \
    scaffold projects from templates, list package versions and report dependency licenses.";

/// MCP Server for the Conan package manager
///
/// # Example
///
/// ```ignore
/// use conan_mcp::{McpServer, ServerConfig};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let server = McpServer::from_config(&ServerConfig::default())?;
///     server.run_stdio().await?;
///     Ok(())
/// }
/// ```
pub struct McpServer {
    dispatcher: Dispatcher,
}

impl McpServer {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self { dispatcher }
    }

    /// Build a server around an already constructed [`Conan`] client.
    pub fn with_conan(conan: Arc<Conan>) -> Result<Self> {
        let registry = builtin_registry(conan)?;
        Ok(Self::new(Dispatcher::new(Arc::new(registry))))
    }

    /// Build the production server from configuration.
    pub fn from_config(config: &ServerConfig) -> Result<Self> {
        Self::with_conan(Arc::new(conan_from_config(config)?))
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Serve over the process's stdin/stdout until stdin closes.
    pub async fn run_stdio(&self) -> Result<()> {
        let stdin = BufReader::new(tokio::io::stdin());
        let stdout = tokio::io::stdout();
        self.run(stdin, stdout).await
    }

    /// Serve newline-delimited messages from `reader`, writing responses to
    /// `writer`, until the reader is exhausted.
    ///
    /// Malformed lines are answered with an error response; only a failure
    /// to read or write the streams ends the loop.
    pub async fn run<R, W>(&self, mut reader: R, mut writer: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut line = Vec::new();

        tracing::info!("MCP server ready, listening on stdio");

        loop {
            line.clear();
            if reader.read_until(b'\n', &mut line).await? == 0 {
                break;
            }
            if line.iter().all(u8::is_ascii_whitespace) {
                continue;
            }

            tracing::debug!(request = %String::from_utf8_lossy(&line).trim_end(), "Received message");

            let response = match self.handle_bytes(&line).await {
                Ok(response) => response,
                Err(e) => {
                    tracing::error!(error = %e, "Error handling message");
                    let response = JsonRpcResponse::error(
                        None,
                        INTERNAL_ERROR,
                        format!("Internal error: {}", e),
                    );
                    serde_json::to_string(&response)?
                }
            };

            if !response.is_empty() {
                writer.write_all(response.as_bytes()).await?;
                writer.write_all(b"\n").await?;
                writer.flush().await?;
            }
        }

        tracing::info!("Input closed, shutting down");
        Ok(())
    }

    /// Handle a single MCP message
    ///
    /// Returns the serialized JSON-RPC response, or an empty string for
    /// notifications.
    pub async fn handle_message(&self, message: &str) -> Result<String> {
        self.handle_bytes(message.as_bytes()).await
    }

    /// Handle a single raw message line. Bytes that are not valid UTF-8 JSON
    /// are a parse error.
    pub async fn handle_bytes(&self, message: &[u8]) -> Result<String> {
        let value: Value = match serde_json::from_slice(message) {
            Ok(value) => value,
            Err(e) => {
                let response =
                    JsonRpcResponse::error(None, PARSE_ERROR, format!("Parse error: {}", e));
                return serde_json::to_string(&response).map_err(Error::from);
            }
        };

        let id = value.get("id").cloned().filter(|id| !id.is_null());
        let request: JsonRpcRequest = match serde_json::from_value(value) {
            Ok(request) => request,
            Err(e) => {
                let response =
                    JsonRpcResponse::error(id, INVALID_REQUEST, format!("Invalid Request: {}", e));
                return serde_json::to_string(&response).map_err(Error::from);
            }
        };

        if request.jsonrpc != "2.0" {
            let response = JsonRpcResponse::error(
                request.id,
                INVALID_REQUEST,
                format!("Invalid Request: unsupported jsonrpc version '{}'", request.jsonrpc),
            );
            return serde_json::to_string(&response).map_err(Error::from);
        }

        let notification = request.is_notification();
        let response = match request.method.as_str() {
            "initialize" => self.handle_initialize(request.id)?,
            "ping" => JsonRpcResponse::success(request.id, json!({})),
            "tools/list" => self.handle_tools_list(request.id),
            "tools/call" => self.handle_tools_call(request.id, request.params).await?,
            _ if notification => {
                tracing::debug!(method = %request.method, "Ignoring notification");
                return Ok(String::new());
            }
            _ => JsonRpcResponse::error(
                request.id,
                METHOD_NOT_FOUND,
                format!("Method not found: {}", request.method),
            ),
        };

        // Notifications never get a response, even when they did work
        if notification {
            return Ok(String::new());
        }
        serde_json::to_string(&response).map_err(Error::from)
    }

    fn handle_initialize(&self, id: Option<Value>) -> Result<JsonRpcResponse> {
        let result = InitializeResult {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: ToolsCapability {
                    list_changed: false,
                },
            },
            server_info: ServerInfo {
                name: SERVER_NAME.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            instructions: Some(INSTRUCTIONS.to_string()),
        };

        Ok(JsonRpcResponse::success(id, serde_json::to_value(result)?))
    }

    fn handle_tools_list(&self, id: Option<Value>) -> JsonRpcResponse {
        let tools: Vec<Value> = self
            .dispatcher
            .registry()
            .iter()
            .map(|t| {
                json!({
                    "name": t.name,
                    "description": t.description,
                    "inputSchema": t.input_schema()
                })
            })
            .collect();

        JsonRpcResponse::success(id, json!({ "tools": tools }))
    }

    /// Tool failures are successful JSON-RPC responses with `isError: true`;
    /// only malformed params are protocol errors.
    async fn handle_tools_call(&self, id: Option<Value>, params: Value) -> Result<JsonRpcResponse> {
        let params: ToolCallParams = match serde_json::from_value(params) {
            Ok(params) => params,
            Err(e) => {
                return Ok(JsonRpcResponse::error(
                    id,
                    INVALID_PARAMS,
                    format!("Invalid params: {}", e),
                ));
            }
        };

        let request = match ToolRequest::from_value(params.name, params.arguments) {
            Ok(request) => request,
            Err(e) => {
                return Ok(JsonRpcResponse::error(
                    id,
                    INVALID_PARAMS,
                    format!("Invalid params: {}", e),
                ));
            }
        };

        let result = CallToolResult::from(self.dispatcher.dispatch(request).await);
        Ok(JsonRpcResponse::success(id, serde_json::to_value(result)?))
    }
}

/// Build the [`Conan`] client described by `config`.
///
/// A missing executable does not prevent startup; each tool call then
/// fails with a dependency-unavailable error.
pub fn conan_from_config(config: &ServerConfig) -> Result<Conan> {
    let runner: Arc<dyn CommandRunner> = match locate_conan(config.conan_path.as_deref()) {
        Ok(program) => {
            tracing::info!(program = %program.display(), "Using conan executable");
            Arc::new(ProcessRunner::new(program))
        }
        Err(e) => {
            tracing::warn!(error = %e, "conan executable not found; tool calls will fail");
            let program = config
                .conan_path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| CONAN_PROGRAM.to_string());
            Arc::new(MissingProgram::new(program))
        }
    };

    let work_dir = config.resolve_work_dir()?;
    if !work_dir.is_dir() {
        return Err(Error::Config {
            path: work_dir,
            message: "working directory does not exist".to_string(),
        });
    }

    Ok(Conan::new(runner, work_dir).with_timeout(config.timeout()))
}
