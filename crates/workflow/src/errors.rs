//! Orchestration-level errors.

use std::path::PathBuf;

use model::{ApiError, ForkError, RepositoryId};
use process::ProcessError;
use thiserror::Error;

use crate::removal::RemovalOutcome;

/// Failures of clone and commit-and-push.
#[derive(Debug, Error)]
pub enum WorkspaceError {
    /// Preparing or inspecting the clone directory failed.
    #[error("could not prepare {}: {source}", .path.display())]
    Io {
        /// Directory being prepared.
        path: PathBuf,
        /// Underlying OS error.
        source: std::io::Error,
    },

    /// The authenticated remote URL could not be formed from the configured
    /// git host.
    #[error("cannot build remote URL for {repo} on host '{host}'")]
    RemoteUrl {
        /// Repository being cloned.
        repo: RepositoryId,
        /// Configured git host.
        host: String,
    },

    /// `git clone` failed. The process error keeps the exit code and stderr.
    #[error("clone of {repo} failed: {source}")]
    CloneFailed {
        /// Repository being cloned.
        repo: RepositoryId,
        /// Process failure.
        source: ProcessError,
    },

    /// There is no clone of the repository to commit in.
    #[error("{repo} has not been cloned to {}", .path.display())]
    NotCloned {
        /// Repository to commit.
        repo: RepositoryId,
        /// Expected clone directory.
        path: PathBuf,
    },

    /// `git commit` failed for a reason other than an unchanged tree.
    #[error("commit in {repo} failed: {source}")]
    CommitFailed {
        /// Repository being committed.
        repo: RepositoryId,
        /// Process failure.
        source: ProcessError,
    },

    /// The commit was created locally but `git push` failed. Local and remote
    /// have diverged; retrying is up to the caller.
    #[error("commit in {repo} was created but push failed: {source}")]
    PushFailed {
        /// Repository being pushed.
        repo: RepositoryId,
        /// Process failure.
        source: ProcessError,
    },
}

/// Every failed deletion of a bulk removal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{} of {attempted} repository deletions failed: {}", .failures.len(), summary(.failures))]
pub struct RemovalError {
    /// Number of deletions attempted.
    pub attempted: usize,
    /// The failed deletions, in input order.
    pub failures: Vec<RemovalOutcome>,
}

fn summary(failures: &[RemovalOutcome]) -> String {
    failures
        .iter()
        .map(|outcome| match &outcome.error {
            Some(err) => format!("{} ({err})", outcome.name),
            None => outcome.name.clone(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Errors surfaced by the [`crate::Bot`] facade.
#[derive(Debug, Error)]
pub enum BotError {
    /// An HTTP API call failed.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// A fork did not confirm.
    #[error(transparent)]
    Fork(#[from] ForkError),

    /// A local git operation failed.
    #[error(transparent)]
    Workspace(#[from] WorkspaceError),
}
