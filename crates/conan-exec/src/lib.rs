//! Subprocess integration with the Conan package manager
//!
//! This crate owns everything that touches the `conan` executable:
//!
//! - Locating the executable (explicit path or `PATH` search)
//! - Describing a single invocation ([`ConanCommand`])
//! - Running it through the [`CommandRunner`] seam and capturing its output
//!
//! Callers never spawn processes themselves; they hand a [`ConanCommand`] to a
//! runner. Tests substitute their own runner to avoid needing a real Conan
//! installation.

pub mod command;
pub mod discovery;
pub mod error;
pub mod runner;

pub use command::ConanCommand;
pub use discovery::{CONAN_PROGRAM, find_in_path, locate_conan};
pub use error::{ExecError, Result};
pub use runner::{CommandOutput, CommandRunner, MissingProgram, ProcessRunner};
