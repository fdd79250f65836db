//! Drives a [`ForkPoll`] against a live [`RepositoryHost`].

use std::sync::Arc;
use std::time::Instant;

use model::{
    ApiError, ForkConfirmation, ForkError, ForkPoll, ForkRequest, PollPolicy, PollStep,
    RepositoryHost, RepositoryId, UserLogin,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// Requests forks and waits until they are visible in the bot's account.
#[derive(Clone)]
pub struct ForkCoordinator {
    host: Arc<dyn RepositoryHost>,
    user: UserLogin,
    policy: PollPolicy,
}

impl ForkCoordinator {
    /// Creates a coordinator forking into `user`'s account.
    pub fn new(host: Arc<dyn RepositoryHost>, user: UserLogin, policy: PollPolicy) -> Self {
        Self {
            host,
            user,
            policy: policy.normalized(),
        }
    }

    /// Returns `true` if the bot owns a repository that matches `repo`'s
    /// short name under the configured match policy. Repositories of other
    /// accounts in the listing are ignored.
    pub async fn has_forked(&self, repo: &RepositoryId) -> Result<bool, ApiError> {
        let repos = self.host.list_repositories().await?;
        let policy = self.policy.match_policy;
        Ok(repos.iter().any(|r| policy.matches(r, &self.user, repo.short_name())))
    }

    /// Forks `repo` and resolves once the fork is listed, the poll budget
    /// runs out, a listing fails, or `cancel` fires.
    ///
    /// Listing starts after the first interval, never before the fork
    /// request has been accepted.
    #[instrument(skip(self, cancel), fields(repo = %repo, request_id = tracing::field::Empty))]
    pub async fn fork(
        &self,
        repo: &RepositoryId,
        cancel: &CancellationToken,
    ) -> Result<ForkConfirmation, ForkError> {
        let request = ForkRequest::new(repo.clone(), self.user.clone());
        tracing::Span::current().record("request_id", tracing::field::display(request.id));

        if cancel.is_cancelled() {
            return Err(ForkError::Cancelled {
                repo: repo.clone(),
                attempts: 0,
            });
        }

        self.host
            .create_fork(repo)
            .await
            .map_err(|source| ForkError::Request {
                repo: repo.clone(),
                source,
            })?;
        info!("fork requested");

        let mut poll = ForkPoll::new(request, self.policy);
        poll.accepted(now());

        while let PollStep::Poll { attempt, delay } = poll.next_step(now()) {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    poll.cancel(now());
                    break;
                }
                _ = tokio::time::sleep(delay) => {}
            }

            debug!(attempt, "checking for fork");
            let listing = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    poll.cancel(now());
                    break;
                }
                listing = self.host.list_repositories() => listing,
            };
            poll.observe(listing.as_deref().map_err(ApiError::clone), now());
        }

        let result = poll.into_result();
        match &result {
            Ok(confirmation) => info!(
                attempts = confirmation.attempts,
                elapsed_ms = confirmation.elapsed.as_millis() as u64,
                "fork confirmed"
            ),
            Err(err) => warn!(error = %err, "fork not confirmed"),
        }
        result
    }
}

// Follows tokio's clock so paused-time tests measure virtual time.
fn now() -> Instant {
    tokio::time::Instant::now().into_std()
}
