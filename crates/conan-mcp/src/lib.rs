//! MCP Server for the Conan package manager
//!
//! This crate exposes a handful of Conan 2 operations via the Model Context
//! Protocol (MCP), so that agentic IDEs can inspect build profiles, scaffold
//! new packages and query dependencies without shelling out themselves.
//!
//! # Architecture
//!
//! ```text
//! [ MCP Client ]
//!        | (JSON-RPC over stdio)
//!        v
//! [ server ]  --tools/call-->  [ dispatch ]  --validated args-->  [ tools ]
//!                                                                    |
//!                                                                    v
//!                                                 [ conan ] -> conan_exec::CommandRunner
//! ```
//!
//! The tool registry is built once at startup and never mutated afterwards;
//! the dispatcher shares it behind an `Arc`.
//!
//! # Tools
//!
//! - `get_conan_profile` - Show a build profile
//! - `list_conan_profiles` - List build profile names
//! - `conan_new` - Scaffold a project from a template
//! - `list_conan_packages` - Query available package versions
//! - `check_conan_dependencies_licenses` - Report dependency licenses

pub mod args;
pub mod conan;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod handler;
pub mod protocol;
pub mod registry;
pub mod response;
pub mod schema;
pub mod server;
pub mod tools;

pub use args::Arguments;
pub use conan::Conan;
pub use config::ServerConfig;
pub use dispatch::{Dispatcher, ToolRequest, ToolResult};
pub use error::{Error, Result};
pub use handler::{ToolHandler, handler_fn};
pub use registry::ToolRegistry;
pub use response::{CallToolResult, ToolContent};
pub use schema::{ParamType, ParameterSpec, ToolDescriptor};
pub use server::McpServer;
pub use tools::builtin_registry;
pub use tools::new::Template;
