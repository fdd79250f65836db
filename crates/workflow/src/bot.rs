//! The caller-facing facade.
//!
//! [`Bot`] holds the bot account's identity and wires the fork coordinator,
//! the repository workspace and bulk removal to a single hosting platform.

use std::sync::Arc;

use model::{
    ApiError, BranchName, CommitOutcome, CommitTransaction, ComponentCatalog, Credentials,
    ForkConfirmation, Issue, IssueOptions, LocalClone, NewIssue, NewPullRequest, PollPolicy,
    PullRequest, PullRequestOptions, Repository, RepositoryHost, RepositoryId, UserLogin,
};
use process::CommandRunner;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};

use crate::errors::BotError;
use crate::fork::ForkCoordinator;
use crate::removal::{remove_concurrently, RemovalReport, DEFAULT_REMOVE_CONCURRENCY};
use crate::workspace::{RepositoryWorkspace, WorkspaceConfig};

/// Tunables of a [`Bot`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotConfig {
    /// How fork waits poll for the new repository.
    pub poll: PollPolicy,
    /// Where clones live and which branch they use.
    pub workspace: WorkspaceConfig,
    /// Maximum deletions in flight during bulk removal.
    pub remove_concurrency: usize,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            poll: PollPolicy::default(),
            workspace: WorkspaceConfig::default(),
            remove_concurrency: DEFAULT_REMOVE_CONCURRENCY,
        }
    }
}

/// A GitHub account that forks component repositories, edits them locally
/// and proposes the changes back.
pub struct Bot {
    user: UserLogin,
    host: Arc<dyn RepositoryHost>,
    catalog: Arc<dyn ComponentCatalog>,
    forks: ForkCoordinator,
    workspace: RepositoryWorkspace,
    default_branch: BranchName,
    remove_concurrency: usize,
}

impl Bot {
    /// Wires a bot acting as `credentials`' account. `runner` executes git.
    pub fn new(
        credentials: Credentials,
        host: Arc<dyn RepositoryHost>,
        catalog: Arc<dyn ComponentCatalog>,
        runner: Arc<dyn CommandRunner>,
        config: BotConfig,
    ) -> Self {
        let user = credentials.user().clone();
        let default_branch = config.workspace.default_branch.clone();
        Self {
            forks: ForkCoordinator::new(host.clone(), user.clone(), config.poll),
            workspace: RepositoryWorkspace::new(runner, config.workspace, credentials),
            user,
            host,
            catalog,
            default_branch,
            remove_concurrency: config.remove_concurrency,
        }
    }

    /// The bot account's login.
    pub fn user(&self) -> &UserLogin {
        &self.user
    }

    /// Every repository the bot account owns.
    pub async fn repos(&self) -> Result<Vec<Repository>, BotError> {
        Ok(self.host.list_repositories().await?)
    }

    pub async fn has_forked(&self, repo: &RepositoryId) -> Result<bool, BotError> {
        Ok(self.forks.has_forked(repo).await?)
    }

    /// Deletes the bot's repository called `name`.
    #[instrument(skip(self))]
    pub async fn remove(&self, name: &str) -> Result<(), BotError> {
        self.host.delete_repository(name).await?;
        info!("removed");
        Ok(())
    }

    /// Deletes each named repository of the bot account. Failures are
    /// reported per item, never short-circuited.
    pub async fn remove_many(&self, names: Vec<String>) -> RemovalReport {
        remove_concurrently(self.host.as_ref(), names, self.remove_concurrency).await
    }

    /// Deletes every repository the bot account owns. Listed repositories
    /// of other accounts are left alone.
    ///
    /// Fails only if the initial listing fails.
    #[instrument(skip(self))]
    pub async fn remove_all(&self) -> Result<RemovalReport, BotError> {
        let names = self
            .host
            .list_repositories()
            .await?
            .into_iter()
            .filter(|repo| repo.is_owned_by(&self.user))
            .map(|repo| repo.name)
            .collect();
        Ok(self.remove_many(names).await)
    }

    /// Forks `repo` and waits until the fork is visible.
    pub async fn fork(
        &self,
        repo: &RepositoryId,
        cancel: &CancellationToken,
    ) -> Result<ForkConfirmation, BotError> {
        Ok(self.forks.fork(repo, cancel).await?)
    }

    /// Clones `repo` into the workspace, replacing any previous clone.
    pub async fn clone_repository(&self, repo: &RepositoryId) -> Result<LocalClone, BotError> {
        Ok(self.workspace.clone_repository(repo).await?)
    }

    /// Commits all changes in the clone of `repo` and pushes them.
    pub async fn commit(
        &self,
        repo: &RepositoryId,
        message: impl Into<String>,
    ) -> Result<CommitOutcome, BotError> {
        let tx = CommitTransaction {
            repo: repo.clone(),
            message: message.into(),
        };
        Ok(self.workspace.commit_and_push(&tx).await?)
    }

    #[instrument(skip(self, title, body, options), fields(repo = %repo))]
    pub async fn issue(
        &self,
        repo: &RepositoryId,
        title: impl Into<String>,
        body: impl Into<String>,
        options: IssueOptions,
    ) -> Result<Issue, BotError> {
        let issue = NewIssue {
            title: title.into(),
            body: body.into(),
            options,
        };
        let created = self.host.create_issue(repo, &issue).await?;
        info!(number = created.number, "issue opened");
        Ok(created)
    }

    /// Opens a pull request on `repo`. The base defaults to the configured
    /// branch and the head to the same branch of the bot's fork.
    #[instrument(skip(self, title, body, options), fields(repo = %repo))]
    pub async fn pull_request(
        &self,
        repo: &RepositoryId,
        title: impl Into<String>,
        body: impl Into<String>,
        options: PullRequestOptions,
    ) -> Result<PullRequest, BotError> {
        let pull = self.new_pull_request(title.into(), body.into(), options);
        let created = self.host.create_pull_request(repo, &pull).await?;
        info!(number = created.number, head = %pull.head, "pull request opened");
        Ok(created)
    }

    /// Raw entries of the components directory.
    pub async fn components(&self) -> Result<Vec<serde_json::Value>, ApiError> {
        self.catalog.list_components().await
    }

    fn new_pull_request(
        &self,
        title: String,
        body: String,
        options: PullRequestOptions,
    ) -> NewPullRequest {
        let base = options.base.unwrap_or_else(|| self.default_branch.clone());
        let head = options
            .head
            .unwrap_or_else(|| format!("{}:{}", self.user, self.default_branch));
        NewPullRequest {
            title,
            body,
            base: base.to_string(),
            head,
            draft: options.draft,
            maintainer_can_modify: options.maintainer_can_modify,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::testing::{FakeGit, FakeHost};

    fn bot(host: Arc<FakeHost>, git: Arc<FakeGit>, root: &std::path::Path) -> Bot {
        Bot::new(
            Credentials::new(UserLogin::new("bot").unwrap(), "secret"),
            host.clone(),
            host,
            git,
            BotConfig {
                workspace: WorkspaceConfig {
                    clone_root: root.to_path_buf(),
                    ..Default::default()
                },
                remove_concurrency: 2,
                ..Default::default()
            },
        )
    }

    fn repo() -> RepositoryId {
        RepositoryId::parse("component/emitter").unwrap()
    }

    #[tokio::test]
    async fn remove_all_attempts_every_repository() {
        let dir = tempfile::tempdir().unwrap();
        let host = Arc::new(FakeHost {
            owned: (1..=5).map(|i| format!("repo-{i}")).collect(),
            failing_deletes: HashSet::from(["repo-3".to_string()]),
            ..Default::default()
        });

        let report = bot(host.clone(), Arc::new(FakeGit::default()), dir.path())
            .remove_all()
            .await
            .unwrap();

        assert_eq!(report.outcomes().len(), 5);
        assert_eq!(report.failures().count(), 1);
        assert_eq!(host.deleted.lock().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn remove_all_skips_repositories_of_other_accounts() {
        let dir = tempfile::tempdir().unwrap();
        let host = Arc::new(FakeHost {
            owned: vec!["emitter".into()],
            foreign: vec!["component/events".into()],
            ..Default::default()
        });

        let report = bot(host.clone(), Arc::new(FakeGit::default()), dir.path())
            .remove_all()
            .await
            .unwrap();

        assert_eq!(report.outcomes().len(), 1);
        assert_eq!(*host.deleted.lock().unwrap(), ["emitter"]);
    }

    #[tokio::test]
    async fn remove_all_fails_when_listing_fails() {
        let dir = tempfile::tempdir().unwrap();
        let host = Arc::new(FakeHost {
            listing_error: Some(ApiError::status(401, Some("Unauthorized"))),
            ..Default::default()
        });

        let err = bot(host.clone(), Arc::new(FakeGit::default()), dir.path())
            .remove_all()
            .await
            .unwrap_err();

        assert!(matches!(err, BotError::Api(_)), "{err:?}");
        assert!(host.deleted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn pull_request_defaults_to_bot_fork_of_default_branch() {
        let dir = tempfile::tempdir().unwrap();
        let host = Arc::new(FakeHost::default());

        let created = bot(host.clone(), Arc::new(FakeGit::default()), dir.path())
            .pull_request(
                &repo(),
                "Add license",
                "Adds the license property.",
                PullRequestOptions::default(),
            )
            .await
            .unwrap();

        assert_eq!(created.number, 1);
        let pulls = host.pulls.lock().unwrap();
        assert_eq!(pulls[0].1.base, "master");
        assert_eq!(pulls[0].1.head, "bot:master");
    }

    #[tokio::test]
    async fn pull_request_options_override_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let host = Arc::new(FakeHost::default());

        bot(host.clone(), Arc::new(FakeGit::default()), dir.path())
            .pull_request(
                &repo(),
                "Add license",
                "",
                PullRequestOptions {
                    base: BranchName::new("main"),
                    head: Some("bot:license".into()),
                    draft: Some(true),
                    maintainer_can_modify: None,
                },
            )
            .await
            .unwrap();

        let pulls = host.pulls.lock().unwrap();
        assert_eq!(pulls[0].1.base, "main");
        assert_eq!(pulls[0].1.head, "bot:license");
        assert_eq!(pulls[0].1.draft, Some(true));
    }

    #[tokio::test]
    async fn issue_carries_options() {
        let dir = tempfile::tempdir().unwrap();
        let host = Arc::new(FakeHost::default());

        let issue = bot(host.clone(), Arc::new(FakeGit::default()), dir.path())
            .issue(
                &repo(),
                "Missing license",
                "Please add one.",
                IssueOptions {
                    labels: vec!["bot".into()],
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(issue.title, "Missing license");
        let issues = host.issues.lock().unwrap();
        assert_eq!(issues[0].0, repo());
        assert_eq!(issues[0].1.options.labels, ["bot"]);
    }

    #[tokio::test]
    async fn clone_then_commit_reaches_remote() {
        let dir = tempfile::tempdir().unwrap();
        let git = Arc::new(FakeGit {
            dirty: true,
            ..Default::default()
        });
        let bot = bot(Arc::new(FakeHost::default()), git.clone(), dir.path());

        bot.clone_repository(&repo()).await.unwrap();
        let outcome = bot.commit(&repo(), "add license").await.unwrap();

        assert_eq!(outcome, CommitOutcome::Pushed);
        assert_eq!(git.remote_tip().as_deref(), Some("add license"));
    }

    #[tokio::test]
    async fn components_come_from_the_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let components = bot(
            Arc::new(FakeHost::default()),
            Arc::new(FakeGit::default()),
            dir.path(),
        )
        .components()
        .await
        .unwrap();

        assert_eq!(components[0]["repo"], "component/emitter");
    }
}
