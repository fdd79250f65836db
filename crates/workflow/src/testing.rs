//! In-memory fakes for the host and process ports.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use model::{
    ApiError, ComponentCatalog, Issue, NewIssue, NewPullRequest, PullRequest, Repository,
    RepositoryHost, RepositoryId,
};
use process::{CommandOutput, CommandRunner, CommandStep, ProcessError};

pub(crate) fn repository(name: &str) -> Repository {
    Repository {
        name: name.to_string(),
        full_name: format!("bot/{name}"),
        fork: true,
        private: false,
        html_url: None,
        default_branch: Some("master".into()),
        updated_at: None,
    }
}

/// Scripted [`RepositoryHost`].
#[derive(Default)]
pub(crate) struct FakeHost {
    /// Repositories present from the first listing on.
    pub owned: Vec<String>,
    /// `owner/name` of repositories of other accounts that the listing also
    /// returns, as for a collaborator.
    pub foreign: Vec<String>,
    /// `(name, n)`: `name` appears in the listing from the `n`-th call on.
    pub appears_after: Option<(String, usize)>,
    /// Every listing fails with this error.
    pub listing_error: Option<ApiError>,
    /// The fork request fails with this error.
    pub fork_error: Option<ApiError>,
    /// Deletions of these names fail with 500.
    pub failing_deletes: HashSet<String>,
    /// Simulated latency of each deletion.
    pub delete_delay: Duration,

    pub list_calls: AtomicUsize,
    pub fork_calls: AtomicUsize,
    pub deleted: Mutex<Vec<String>>,
    pub in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
    pub issues: Mutex<Vec<(RepositoryId, NewIssue)>>,
    pub pulls: Mutex<Vec<(RepositoryId, NewPullRequest)>>,
}

impl FakeHost {
    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RepositoryHost for FakeHost {
    async fn list_repositories(&self) -> Result<Vec<Repository>, ApiError> {
        let call = self.list_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(err) = &self.listing_error {
            return Err(err.clone());
        }
        let mut repos: Vec<_> = self.owned.iter().map(|n| repository(n)).collect();
        repos.extend(self.foreign.iter().map(|full_name| {
            let name = full_name.rsplit('/').next().unwrap_or(full_name);
            Repository {
                full_name: full_name.clone(),
                fork: false,
                ..repository(name)
            }
        }));
        if let Some((name, after)) = &self.appears_after {
            if call >= *after {
                repos.push(repository(name));
            }
        }
        Ok(repos)
    }

    async fn delete_repository(&self, name: &str) -> Result<(), ApiError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if !self.delete_delay.is_zero() {
            tokio::time::sleep(self.delete_delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.deleted.lock().unwrap().push(name.to_string());
        if self.failing_deletes.contains(name) {
            Err(ApiError::status(500, Some("Internal Server Error")))
        } else {
            Ok(())
        }
    }

    async fn create_fork(&self, _repo: &RepositoryId) -> Result<(), ApiError> {
        self.fork_calls.fetch_add(1, Ordering::SeqCst);
        match &self.fork_error {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    async fn create_issue(&self, repo: &RepositoryId, issue: &NewIssue) -> Result<Issue, ApiError> {
        let mut issues = self.issues.lock().unwrap();
        issues.push((repo.clone(), issue.clone()));
        Ok(Issue {
            number: issues.len() as u64,
            html_url: format!("https://github.com/{repo}/issues/{}", issues.len()),
            title: issue.title.clone(),
        })
    }

    async fn create_pull_request(
        &self,
        repo: &RepositoryId,
        pull: &NewPullRequest,
    ) -> Result<PullRequest, ApiError> {
        let mut pulls = self.pulls.lock().unwrap();
        pulls.push((repo.clone(), pull.clone()));
        Ok(PullRequest {
            number: pulls.len() as u64,
            html_url: format!("https://github.com/{repo}/pull/{}", pulls.len()),
            title: pull.title.clone(),
        })
    }
}

#[async_trait]
impl ComponentCatalog for FakeHost {
    async fn list_components(&self) -> Result<Vec<serde_json::Value>, ApiError> {
        Ok(vec![serde_json::json!({ "repo": "component/emitter" })])
    }
}

/// A git stand-in that acts on the local file system and keeps an in-memory
/// remote history.
#[derive(Default)]
pub(crate) struct FakeGit {
    /// Working trees have uncommitted changes.
    pub dirty: bool,
    /// `git push` fails.
    pub push_fails: bool,
    /// `git clone` fails with this stderr.
    pub clone_stderr: Option<String>,

    pub steps: Mutex<Vec<CommandStep>>,
    pub clones: AtomicUsize,
    pub local_commits: Mutex<Vec<String>>,
    pub remote_log: Mutex<Vec<String>>,
}

impl FakeGit {
    pub fn remote_tip(&self) -> Option<String> {
        self.remote_log.lock().unwrap().last().cloned()
    }

    fn failure(step: &CommandStep, code: i32, stdout: &str, stderr: &str) -> ProcessError {
        ProcessError::NonZeroExit {
            command: step.command_line(),
            code,
            stdout: stdout.to_string(),
            stderr: step.mask(stderr),
        }
    }
}

#[async_trait]
impl CommandRunner for FakeGit {
    async fn run(&self, step: &CommandStep) -> Result<CommandOutput, ProcessError> {
        self.steps.lock().unwrap().push(step.clone());
        let ok = CommandOutput {
            stdout: String::new(),
            stderr: String::new(),
        };
        match step.arguments().first().map(String::as_str) {
            Some("clone") => {
                if let Some(stderr) = &self.clone_stderr {
                    return Err(Self::failure(step, 128, "", stderr));
                }
                let n = self.clones.fetch_add(1, Ordering::SeqCst) + 1;
                let dest = PathBuf::from(step.arguments().last().cloned().unwrap_or_default());
                std::fs::create_dir_all(&dest).unwrap();
                std::fs::write(dest.join(format!("clone-{n}")), n.to_string()).unwrap();
                Ok(ok)
            }
            Some("commit") => {
                if !self.dirty {
                    return Err(Self::failure(
                        step,
                        1,
                        "On branch master\nnothing to commit, working tree clean\n",
                        "",
                    ));
                }
                let message = step.arguments().last().cloned().unwrap_or_default();
                self.local_commits.lock().unwrap().push(message);
                Ok(ok)
            }
            Some("push") => {
                if self.push_fails {
                    return Err(Self::failure(step, 1, "", "error: failed to push some refs"));
                }
                let pending: Vec<_> = self.local_commits.lock().unwrap().drain(..).collect();
                self.remote_log.lock().unwrap().extend(pending);
                Ok(ok)
            }
            _ => Err(Self::failure(step, 1, "", "unknown git command")),
        }
    }
}
