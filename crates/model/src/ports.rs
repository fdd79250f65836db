//! Port traits implemented by infrastructure crates.
//!
//! The workflow crate drives the hosting platform only through these traits,
//! which keeps the fork coordinator and bulk removal testable against
//! in-memory fakes.

use async_trait::async_trait;

use crate::{ApiError, Issue, NewIssue, NewPullRequest, PullRequest, Repository, RepositoryId};

/// The hosting platform, seen from the authenticated bot account.
///
/// Implementations must be `Send + Sync`; one instance is shared by every
/// concurrent operation.
#[async_trait]
pub trait RepositoryHost: Send + Sync {
    /// Lists every repository owned by the authenticated account.
    ///
    /// A listing is complete or an error; implementations that cap
    /// pagination fail with [`ApiError::ListingTruncated`] rather than
    /// return a partial list.
    async fn list_repositories(&self) -> Result<Vec<Repository>, ApiError>;

    /// Deletes the authenticated account's repository called `name`.
    async fn delete_repository(&self, name: &str) -> Result<(), ApiError>;

    /// Asks the platform to fork `repo` into the authenticated account.
    ///
    /// Success means the request was accepted, not that the fork exists.
    async fn create_fork(&self, repo: &RepositoryId) -> Result<(), ApiError>;

    /// Opens an issue on `repo`.
    async fn create_issue(&self, repo: &RepositoryId, issue: &NewIssue) -> Result<Issue, ApiError>;

    /// Opens a pull request on `repo`.
    async fn create_pull_request(
        &self,
        repo: &RepositoryId,
        pull: &NewPullRequest,
    ) -> Result<PullRequest, ApiError>;
}

/// A read-only directory of published components.
#[async_trait]
pub trait ComponentCatalog: Send + Sync {
    /// Fetches every catalogue entry as raw JSON.
    async fn list_components(&self) -> Result<Vec<serde_json::Value>, ApiError>;
}
