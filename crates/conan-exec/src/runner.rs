//! Execution of package manager commands
//!
//! [`CommandRunner`] is the seam between tool handlers and the outside world.
//! [`ProcessRunner`] spawns the real executable; [`MissingProgram`] stands in
//! when no executable could be located so that every call reports it.

use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;

use crate::command::ConanCommand;
use crate::error::{ExecError, Result};

/// Captured output of a successful invocation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// Create output with only stdout populated.
    pub fn stdout(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// Iterate over the lines of stdout followed by the lines of stderr.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.stdout.lines().chain(self.stderr.lines())
    }
}

/// Runs a [`ConanCommand`] and returns its output
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Execute the command once. Non-zero exit is reported as
    /// [`ExecError::CommandFailed`].
    async fn run(&self, command: &ConanCommand) -> Result<CommandOutput>;
}

/// Runner that spawns the package manager executable
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    program: PathBuf,
}

impl ProcessRunner {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, command: &ConanCommand) -> Result<CommandOutput> {
        let mut cmd = Command::new(&self.program);
        cmd.args(command.get_args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // Dropping the pending call must not leave a stray process behind
            .kill_on_drop(true);
        if let Some(dir) = command.get_current_dir() {
            // spawn() reports a missing cwd as NotFound, indistinguishable
            // from a missing executable
            if !dir.is_dir() {
                return Err(ExecError::Io(io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("working directory {} does not exist", dir.display()),
                )));
            }
            cmd.current_dir(dir);
        }

        tracing::debug!(
            program = %self.program.display(),
            args = ?command.get_args(),
            cwd = ?command.get_current_dir(),
            "Spawning subprocess"
        );

        let child = cmd
            .spawn()
            .map_err(|e| spawn_error(&self.program, e))?;

        let output = match command.get_timeout() {
            Some(limit) => tokio::time::timeout(limit, child.wait_with_output())
                .await
                .map_err(|_| ExecError::Timeout {
                    seconds: limit.as_secs_f64(),
                })??,
            None => child.wait_with_output().await?,
        };

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        if output.status.success() {
            Ok(CommandOutput { stdout, stderr })
        } else {
            let code = output.status.code().unwrap_or(-1);
            tracing::debug!(code, stderr = %stderr.trim(), "Subprocess failed");
            Err(failure(code, &stderr))
        }
    }
}

/// Runner used when the executable could not be located at startup
#[derive(Debug, Clone)]
pub struct MissingProgram {
    program: String,
}

impl MissingProgram {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

#[async_trait]
impl CommandRunner for MissingProgram {
    async fn run(&self, _command: &ConanCommand) -> Result<CommandOutput> {
        Err(ExecError::NotFound {
            program: self.program.clone(),
        })
    }
}

fn spawn_error(program: &Path, err: io::Error) -> ExecError {
    if err.kind() == io::ErrorKind::NotFound {
        ExecError::NotFound {
            program: program.display().to_string(),
        }
    } else {
        ExecError::Io(err)
    }
}

/// Build the failure for a non-zero exit, falling back to a generic message
/// when the subprocess wrote nothing to stderr.
fn failure(code: i32, stderr: &str) -> ExecError {
    let stderr = stderr.trim();
    let stderr = if stderr.is_empty() {
        format!("conan command failed with return code {}", code)
    } else {
        stderr.to_string()
    };
    ExecError::CommandFailed { code, stderr }
}
