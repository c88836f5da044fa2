//! Shared test utilities for the conan-mcp workspace.
//!
//! Both runners implement [`conan_exec::CommandRunner`], so tests can drive
//! every tool without a Conan installation. Dev-dependency only, never
//! published.
//!
//! # Modules
//!
//! - [`scripted`]: [`ScriptedRunner`] replays canned outputs and records commands
//! - [`fake`]: [`FakeConan`] keeps profile state and writes scaffolded files

pub mod fake;
pub mod scripted;

pub use fake::FakeConan;
pub use scripted::ScriptedRunner;
