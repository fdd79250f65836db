//! Child-process execution.

use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, instrument, warn};

use crate::{CommandPipeline, CommandStep, PipelineError, ProcessError};

/// Captured result of a step that exited with status 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Standard output (masked).
    pub stdout: String,
    /// Standard error (masked).
    pub stderr: String,
}

/// Executes [`CommandStep`]s.
///
/// The production implementation is [`TokioCommandRunner`]; tests substitute
/// fakes to mock the process boundary.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Runs `step` to completion.
    async fn run(&self, step: &CommandStep) -> Result<CommandOutput, ProcessError>;

    /// Runs the steps of `pipeline` in order, stopping at the first failure.
    ///
    /// Returns the output of every step on success.
    async fn run_pipeline(
        &self,
        pipeline: &CommandPipeline,
    ) -> Result<Vec<CommandOutput>, PipelineError> {
        let mut outputs = Vec::with_capacity(pipeline.steps().len());
        for (index, step) in pipeline.steps().iter().enumerate() {
            let output = self
                .run(step)
                .await
                .map_err(|source| PipelineError { index, source })?;
            outputs.push(output);
        }
        Ok(outputs)
    }
}

/// Runs steps as real child processes on the tokio runtime.
///
/// stdin is closed, stdout and stderr are captured, and every step is bounded
/// by a timeout after which the child is killed.
#[derive(Debug, Clone)]
pub struct TokioCommandRunner {
    timeout: Duration,
}

impl TokioCommandRunner {
    /// Default per-step timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(600);

    /// Creates a runner with the given per-step timeout.
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Returns the per-step timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Default for TokioCommandRunner {
    fn default() -> Self {
        Self::new(Self::DEFAULT_TIMEOUT)
    }
}

#[async_trait]
impl CommandRunner for TokioCommandRunner {
    #[instrument(skip_all, fields(program = %step.program()))]
    async fn run(&self, step: &CommandStep) -> Result<CommandOutput, ProcessError> {
        let command = step.command_line();
        debug!(%command, "exec");

        let mut cmd = tokio::process::Command::new(step.program());
        cmd.args(step.arguments())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = step.working_dir() {
            cmd.current_dir(dir);
        }
        for (key, value) in step.envs() {
            cmd.env(key, value);
        }

        let child = cmd.spawn().map_err(|source| ProcessError::Spawn {
            command: command.clone(),
            source,
        })?;

        // Dropping the wait future on timeout drops the child, and
        // `kill_on_drop` reaps it.
        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(source)) => return Err(ProcessError::Io { command, source }),
            Err(_) => {
                warn!(%command, timeout = ?self.timeout, "command timed out");
                return Err(ProcessError::TimedOut {
                    command,
                    after: self.timeout,
                });
            }
        };

        let stdout = step.mask(&String::from_utf8_lossy(&output.stdout));
        let stderr = step.mask(&String::from_utf8_lossy(&output.stderr));
        classify(command, output.status, stdout, stderr)
    }
}

fn classify(
    command: String,
    status: ExitStatus,
    stdout: String,
    stderr: String,
) -> Result<CommandOutput, ProcessError> {
    match status.code() {
        Some(0) => Ok(CommandOutput { stdout, stderr }),
        Some(code) => {
            debug!(%command, code, "command failed");
            Err(ProcessError::NonZeroExit {
                command,
                code,
                stdout,
                stderr,
            })
        }
        None => Err(ProcessError::Killed {
            command,
            signal: termination_signal(status),
        }),
    }
}

#[cfg(unix)]
fn termination_signal(status: ExitStatus) -> Option<i32> {
    use std::os::unix::process::ExitStatusExt;
    status.signal()
}

#[cfg(not(unix))]
fn termination_signal(_status: ExitStatus) -> Option<i32> {
    None
}
