//! [`ScriptedRunner`] replays queued outputs in order.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use conan_exec::{CommandOutput, CommandRunner, ConanCommand, ExecError, Result};

/// Runner that answers each call with the next queued response and records
/// every command it receives.
///
/// # Example
///
/// ```rust,no_run
/// use conan_test_utils::ScriptedRunner;
///
/// let runner = ScriptedRunner::new().ok("[\"default\"]");
/// // ... hand `runner` to the code under test ...
/// assert_eq!(runner.calls().len(), 0);
/// ```
#[derive(Default)]
pub struct ScriptedRunner {
    responses: Mutex<VecDeque<Result<CommandOutput>>>,
    calls: Mutex<Vec<ConanCommand>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful call printing `stdout`.
    pub fn ok(self, stdout: impl Into<String>) -> Self {
        self.output(CommandOutput::stdout(stdout))
    }

    /// Queue a successful call with both streams.
    pub fn output(self, output: CommandOutput) -> Self {
        self.push(Ok(output))
    }

    /// Queue a non-zero exit with the given stderr.
    pub fn fail(self, code: i32, stderr: impl Into<String>) -> Self {
        self.push(Err(ExecError::CommandFailed {
            code,
            stderr: stderr.into(),
        }))
    }

    /// Queue an arbitrary error.
    pub fn error(self, error: ExecError) -> Self {
        self.push(Err(error))
    }

    fn push(self, response: Result<CommandOutput>) -> Self {
        self.responses.lock().unwrap().push_back(response);
        self
    }

    /// Commands received so far, oldest first.
    pub fn calls(&self) -> Vec<ConanCommand> {
        self.calls.lock().unwrap().clone()
    }

    /// Arguments of the only command received.
    ///
    /// Panics unless exactly one command was run.
    pub fn single_call_args(&self) -> Vec<String> {
        let calls = self.calls();
        assert_eq!(calls.len(), 1, "expected exactly one conan call, got {calls:?}");
        calls[0].get_args().to_vec()
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(&self, command: &ConanCommand) -> Result<CommandOutput> {
        self.calls.lock().unwrap().push(command.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Err(ExecError::CommandFailed {
                    code: 1,
                    stderr: format!("no scripted response for `{command}`"),
                })
            })
    }
}
