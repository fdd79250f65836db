//! Shared value types for the forkbot domain.
//!
//! Unlike the newtype identifiers in [`crate::identifiers`], these types carry
//! meaningful values with invariants (credentials never print their secret,
//! poll budgets are non-zero) and participate in domain computations.

use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{BranchName, RepositoryId, UserLogin};

// ---------------------------------------------------------------------------
// Credentials
// ---------------------------------------------------------------------------

/// The bot identity: an account login and its password or access token.
///
/// Read-only after construction and shared by every component. `Debug` never
/// prints the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    user: UserLogin,
    password: String,
}

impl Credentials {
    /// Creates credentials for `user`.
    pub fn new(user: UserLogin, password: impl Into<String>) -> Self {
        Self {
            user,
            password: password.into(),
        }
    }

    /// Returns the account login.
    pub fn user(&self) -> &UserLogin {
        &self.user
    }

    /// Returns the secret. Only transport code should call this.
    pub fn password(&self) -> &str {
        &self.password
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &"***")
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

/// A UTC wall-clock timestamp.
///
/// Wraps [`chrono::DateTime<Utc>`] so callers never depend on `chrono` types
/// directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Returns the current UTC time as a [`Timestamp`].
    pub fn now() -> Self {
        Self(Utc::now())
    }

}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

// ---------------------------------------------------------------------------
// Fork polling configuration
// ---------------------------------------------------------------------------

/// How a listed repository is recognised as the awaited fork.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForkMatch {
    /// Exact short-name equality against the bot's own repositories.
    #[default]
    NameOnly,
    /// Short-name equality and the listing marks the repository as a fork.
    NameAndForkFlag,
}

impl ForkMatch {
    /// Returns `true` if `repo` is `owner`'s fork of a repository named
    /// `short_name`.
    ///
    /// Repositories of other accounts never match, whatever the policy.
    pub fn matches(self, repo: &Repository, owner: &UserLogin, short_name: &str) -> bool {
        if !repo.is_owned_by(owner) || repo.name != short_name {
            return false;
        }
        match self {
            Self::NameOnly => true,
            Self::NameAndForkFlag => repo.fork,
        }
    }
}

/// Budget and cadence for the fork-confirmation poll loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Delay before each poll, including the first.
    pub interval: Duration,

    /// Maximum number of polls. Always at least one.
    pub max_attempts: u32,

    /// Optional wall-clock limit measured from the moment the fork request
    /// was accepted.
    pub deadline: Option<Duration>,

    /// How a listed repository is recognised as the fork.
    pub match_policy: ForkMatch,
}

impl PollPolicy {
    /// Default delay between polls.
    pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(500);

    /// Default maximum number of polls (one minute at the default interval).
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 120;

    /// Returns a copy with `max_attempts` clamped to at least one.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.max_attempts = self.max_attempts.max(1);
        self
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Self::DEFAULT_INTERVAL,
            max_attempts: Self::DEFAULT_MAX_ATTEMPTS,
            deadline: None,
            match_policy: ForkMatch::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Fork lifecycle values
// ---------------------------------------------------------------------------

/// A fork in flight. Exists only for the duration of one poll loop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForkRequest {
    /// Correlation id for log spans; not persisted anywhere.
    pub id: Uuid,
    /// The upstream repository being forked.
    pub source: RepositoryId,
    /// The account that will own the fork.
    pub requested_by: UserLogin,
    /// When the fork was requested.
    pub requested_at: Timestamp,
}

impl ForkRequest {
    /// Creates a request for `source` on behalf of `requested_by`.
    pub fn new(source: RepositoryId, requested_by: UserLogin) -> Self {
        Self {
            id: Uuid::new_v4(),
            source,
            requested_by,
            requested_at: Timestamp::now(),
        }
    }
}

/// Proof that a fork became visible under the bot account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForkConfirmation {
    /// The request that was confirmed.
    pub request: ForkRequest,
    /// Number of polls it took, counting the successful one.
    pub attempts: u32,
    /// Time from acceptance to confirmation.
    pub elapsed: Duration,
}

// ---------------------------------------------------------------------------
// Hosting platform records
// ---------------------------------------------------------------------------

/// A repository as listed for the authenticated account.
///
/// Only the fields the bot uses are decoded; unknown fields are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    /// Short name (e.g. `"superagent"`).
    pub name: String,
    /// `"owner/name"`.
    pub full_name: String,
    /// Whether the repository is a fork of another.
    #[serde(default)]
    pub fork: bool,
    /// Whether the repository is private.
    #[serde(default)]
    pub private: bool,
    /// Web URL of the repository.
    #[serde(default)]
    pub html_url: Option<String>,
    /// Default branch, if reported.
    #[serde(default)]
    pub default_branch: Option<String>,
    /// Last update time, if reported.
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Repository {
    /// The owner segment of `full_name`.
    pub fn owner(&self) -> &str {
        self.full_name
            .split_once(crate::identifiers::SEPARATOR)
            .map_or("", |(owner, _)| owner)
    }

    /// Returns `true` if the repository belongs to `user`. Logins compare
    /// case-insensitively.
    pub fn is_owned_by(&self, user: &UserLogin) -> bool {
        self.owner().eq_ignore_ascii_case(user.as_str())
    }
}

/// Optional fields merged into an issue-creation request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueOptions {
    /// Labels to apply.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
    /// Logins to assign.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub assignees: Vec<String>,
    /// Milestone number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub milestone: Option<u64>,
}

/// Request body for creating an issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewIssue {
    /// Issue title.
    pub title: String,
    /// Issue body (Markdown).
    pub body: String,
    /// Extra fields.
    #[serde(flatten)]
    pub options: IssueOptions,
}

/// Optional fields merged into a pull-request creation request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PullRequestOptions {
    /// Target branch in the upstream repository. Defaults to the configured
    /// default branch.
    pub base: Option<BranchName>,
    /// Source in `"user:branch"` form. Defaults to the bot's default branch.
    pub head: Option<String>,
    /// Open the pull request as a draft.
    pub draft: Option<bool>,
    /// Allow upstream maintainers to push to the head branch.
    pub maintainer_can_modify: Option<bool>,
}

/// Request body for creating a pull request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewPullRequest {
    /// Pull-request title.
    pub title: String,
    /// Pull-request body (Markdown).
    pub body: String,
    /// Branch the changes should be merged into.
    pub base: String,
    /// `"user:branch"` holding the changes.
    pub head: String,
    /// Draft flag.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub draft: Option<bool>,
    /// Maintainer-can-modify flag.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maintainer_can_modify: Option<bool>,
}

/// An issue created by the bot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    /// Issue number within the repository.
    pub number: u64,
    /// Web URL.
    pub html_url: String,
    /// Title as stored by the server.
    #[serde(default)]
    pub title: String,
}

/// A pull request opened by the bot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    /// Pull-request number within the repository.
    pub number: u64,
    /// Web URL.
    pub html_url: String,
    /// Title as stored by the server.
    #[serde(default)]
    pub title: String,
}

// ---------------------------------------------------------------------------
// Local clones and commits
// ---------------------------------------------------------------------------

/// A remote URL that may embed credentials in its user-info part.
///
/// `Display` and `Debug` mask the password; [`RemoteUrl::expose`] returns the
/// real value for handing to git.
#[derive(Clone, PartialEq, Eq)]
pub struct RemoteUrl(String);

impl RemoteUrl {
    /// Wraps `url`.
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    /// Returns the URL including any credentials.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Returns the URL with the user-info password replaced by `***`.
    pub fn masked(&self) -> String {
        mask_userinfo(&self.0)
    }
}

impl std::fmt::Display for RemoteUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.masked())
    }
}

impl std::fmt::Debug for RemoteUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("RemoteUrl").field(&self.masked()).finish()
    }
}

fn mask_userinfo(url: &str) -> String {
    let Some(scheme_end) = url.find("://") else {
        return url.to_string();
    };
    let authority_start = scheme_end + 3;
    let rest = &url[authority_start..];
    let authority_end = rest.find('/').unwrap_or(rest.len());
    let Some(at) = rest[..authority_end].rfind('@') else {
        return url.to_string();
    };
    match rest[..at].find(':') {
        Some(colon) => format!(
            "{}{}:***{}",
            &url[..authority_start],
            &rest[..colon],
            &rest[at..]
        ),
        None => url.to_string(),
    }
}

/// A repository cloned into the local workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalClone {
    /// The cloned repository.
    pub repo: RepositoryId,
    /// Directory holding the working tree.
    pub local_path: PathBuf,
    /// Remote the clone was made from.
    pub remote_url: RemoteUrl,
}

/// A commit-all-and-push of a local clone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitTransaction {
    /// Repository whose clone is committed.
    pub repo: RepositoryId,
    /// Commit message, passed to git verbatim.
    pub message: String,
}

/// Non-error outcomes of a commit-and-push.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitOutcome {
    /// The commit was created and pushed.
    Pushed,
    /// The working tree had no changes; nothing was committed or pushed.
    NothingToCommit,
}
