//! Error types for subprocess execution

/// Errors that can occur while invoking the package manager
#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    /// The executable could not be located or spawned
    #[error("{program} not found. Install Conan 2 and make sure it is on PATH.")]
    NotFound {
        /// The program that was looked up
        program: String,
    },

    /// I/O error while spawning or talking to the subprocess
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Subprocess exited with non-zero status
    #[error("Command failed (exit code {code}): {stderr}")]
    CommandFailed {
        /// Exit code from the subprocess, -1 if killed by a signal
        code: i32,
        /// Captured stderr output
        stderr: String,
    },

    /// Subprocess did not finish within the configured limit
    #[error("Command timed out after {seconds}s")]
    Timeout {
        /// The limit that was exceeded
        seconds: f64,
    },
}

/// Result type alias for subprocess operations
pub type Result<T> = std::result::Result<T, ExecError>;
