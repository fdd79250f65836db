//! Process-layer errors.
//!
//! These are kept apart from API errors: a failed `git push` and a failed
//! HTTP call are different problems with different fixes.

use std::time::Duration;

use thiserror::Error;

/// A command template could not be rendered.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    /// The number of `?` placeholders differs from the number of arguments.
    #[error("template has {expected} placeholders but {actual} arguments were given")]
    ArgumentCount {
        /// Placeholders in the template.
        expected: usize,
        /// Arguments supplied.
        actual: usize,
    },
}

/// Why a child process did not complete successfully.
///
/// `command` is always the masked, shell-quoted rendering of the step, safe to
/// log.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// The program could not be started (not found, not executable, bad
    /// working directory).
    #[error("could not start `{command}`: {source}")]
    Spawn {
        /// Rendered command line.
        command: String,
        /// Underlying OS error.
        source: std::io::Error,
    },

    /// Collecting the child's output failed after it started.
    #[error("lost track of `{command}`: {source}")]
    Io {
        /// Rendered command line.
        command: String,
        /// Underlying OS error.
        source: std::io::Error,
    },

    /// The program ran and exited with a non-zero status.
    #[error("`{command}` exited with status {code}: {}", .stderr.trim())]
    NonZeroExit {
        /// Rendered command line.
        command: String,
        /// Exit status.
        code: i32,
        /// Captured standard output (masked).
        stdout: String,
        /// Captured standard error (masked).
        stderr: String,
    },

    /// The program was terminated by a signal.
    #[error("`{command}` was killed by signal {signal:?}")]
    Killed {
        /// Rendered command line.
        command: String,
        /// Terminating signal, where the platform reports one.
        signal: Option<i32>,
    },

    /// The program did not finish within the runner's timeout and was killed.
    #[error("`{command}` timed out after {after:?}")]
    TimedOut {
        /// Rendered command line.
        command: String,
        /// The timeout that elapsed.
        after: Duration,
    },
}

impl ProcessError {
    /// Returns the exit status for [`ProcessError::NonZeroExit`].
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::NonZeroExit { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Returns `true` if the captured stdout or stderr contains `needle`.
    pub fn output_contains(&self, needle: &str) -> bool {
        match self {
            Self::NonZeroExit { stdout, stderr, .. } => {
                stdout.contains(needle) || stderr.contains(needle)
            }
            _ => false,
        }
    }
}

/// A step of a [`CommandPipeline`](crate::CommandPipeline) failed; later
/// steps were not run.
#[derive(Debug, Error)]
#[error("pipeline step {index} failed: {source}")]
pub struct PipelineError {
    /// 0-based position of the failed step.
    pub index: usize,
    /// Why the step failed.
    pub source: ProcessError,
}
