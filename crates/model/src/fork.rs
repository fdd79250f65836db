//! The fork-confirmation state machine.
//!
//! Forking on GitHub is asynchronous: the creation call returns `202 Accepted`
//! and the repository materialises later, with no notification. [`ForkPoll`]
//! tracks one such wait. It does no I/O and owns no timer; an external ticker
//! asks it what to do next ([`ForkPoll::next_step`]), performs the listing, and
//! feeds the result back ([`ForkPoll::observe`]).
//!
//! ```text
//!  Requested ──accepted()──▶ Polling ──observe(match)──▶ Confirmed
//!                              │  ▲
//!                              │  └── observe(no match)
//!                              ├── observe(error) ──────▶ Failed(Listing)
//!                              ├── budget exhausted ────▶ Failed(TimedOut)
//!                              └── cancel() ────────────▶ Failed(Cancelled)
//! ```

use std::time::{Duration, Instant};

use crate::{ApiError, ForkConfirmation, ForkError, ForkRequest, PollPolicy, Repository};

/// Why a fork wait ended without confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForkFailure {
    /// Listing the bot's repositories failed.
    Listing(ApiError),
    /// The attempt count or deadline ran out.
    TimedOut,
    /// The caller abandoned the wait.
    Cancelled,
}

/// Lifecycle of one fork wait.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForkPollState {
    /// The fork-creation call succeeded; polling has not started.
    Requested,
    /// Waiting for the fork to show up in the bot's repository list.
    Polling,
    /// The fork is visible.
    Confirmed,
    /// The wait ended without confirmation.
    Failed(ForkFailure),
}

impl ForkPollState {
    /// Returns `true` for [`Confirmed`](Self::Confirmed) and
    /// [`Failed`](Self::Failed).
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Confirmed | Self::Failed(_))
    }
}

/// What the ticker should do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollStep {
    /// Wait `delay`, then list repositories and report via
    /// [`ForkPoll::observe`]. `attempt` is 1-based.
    Poll {
        /// 1-based number of the poll about to be made.
        attempt: u32,
        /// Delay before the poll.
        delay: Duration,
    },
    /// The machine is in a terminal state.
    Finished,
}

/// State machine for one fork wait. See the module documentation.
#[derive(Debug, Clone)]
pub struct ForkPoll {
    request: ForkRequest,
    policy: PollPolicy,
    state: ForkPollState,
    attempts: u32,
    accepted_at: Option<Instant>,
    finished_at: Option<Instant>,
}

impl ForkPoll {
    /// Creates a machine in [`ForkPollState::Requested`].
    pub fn new(request: ForkRequest, policy: PollPolicy) -> Self {
        Self {
            request,
            policy: policy.normalized(),
            state: ForkPollState::Requested,
            attempts: 0,
            accepted_at: None,
            finished_at: None,
        }
    }

    /// Records that the fork-creation call was accepted at `now`.
    ///
    /// `Requested -> Polling`. No effect in any other state.
    pub fn accepted(&mut self, now: Instant) {
        if self.state == ForkPollState::Requested {
            self.state = ForkPollState::Polling;
            self.accepted_at = Some(now);
        }
    }

    /// Decides the next step at time `now`.
    ///
    /// While polling, this enforces the budget: once `max_attempts` polls
    /// have been made, or the deadline has passed, the machine moves to
    /// `Failed(TimedOut)` and returns [`PollStep::Finished`]. The delay never
    /// reaches past the deadline, so the last poll happens at the deadline at
    /// the latest.
    pub fn next_step(&mut self, now: Instant) -> PollStep {
        if self.state != ForkPollState::Polling {
            return PollStep::Finished;
        }
        let remaining = self.remaining(now);
        if self.attempts >= self.policy.max_attempts || remaining == Some(Duration::ZERO) {
            self.finish(ForkPollState::Failed(ForkFailure::TimedOut), now);
            return PollStep::Finished;
        }
        let delay = match remaining {
            Some(remaining) => self.policy.interval.min(remaining),
            None => self.policy.interval,
        };
        PollStep::Poll {
            attempt: self.attempts + 1,
            delay,
        }
    }

    /// Feeds back the result of one listing, taken at `now`.
    ///
    /// A match confirms, an error fails, anything else keeps polling. Ignored
    /// unless the machine is polling.
    pub fn observe(&mut self, listing: Result<&[Repository], ApiError>, now: Instant) {
        if self.state != ForkPollState::Polling {
            return;
        }
        self.attempts += 1;
        match listing {
            Ok(repos) => {
                let owner = &self.request.requested_by;
                let name = self.request.source.short_name();
                let policy = self.policy.match_policy;
                if repos.iter().any(|repo| policy.matches(repo, owner, name)) {
                    self.finish(ForkPollState::Confirmed, now);
                }
            }
            Err(err) => self.finish(ForkPollState::Failed(ForkFailure::Listing(err)), now),
        }
    }

    /// Abandons the wait. No effect once terminal.
    pub fn cancel(&mut self, now: Instant) {
        if !self.state.is_terminal() {
            self.finish(ForkPollState::Failed(ForkFailure::Cancelled), now);
        }
    }

    /// Returns the current state.
    pub fn state(&self) -> &ForkPollState {
        &self.state
    }

    /// Returns the number of polls made so far.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Converts a terminal machine into the caller-facing result.
    ///
    /// A machine that is not terminal yet is reported as cancelled.
    pub fn into_result(self) -> Result<ForkConfirmation, ForkError> {
        let elapsed = self.elapsed();
        let repo = self.request.source.clone();
        match self.state {
            ForkPollState::Confirmed => Ok(ForkConfirmation {
                request: self.request,
                attempts: self.attempts,
                elapsed,
            }),
            ForkPollState::Failed(ForkFailure::Listing(source)) => Err(ForkError::Poll {
                repo,
                attempt: self.attempts,
                source,
            }),
            ForkPollState::Failed(ForkFailure::TimedOut) => Err(ForkError::TimedOut {
                repo,
                attempts: self.attempts,
                elapsed,
            }),
            ForkPollState::Failed(ForkFailure::Cancelled)
            | ForkPollState::Requested
            | ForkPollState::Polling => Err(ForkError::Cancelled {
                repo,
                attempts: self.attempts,
            }),
        }
    }

    /// Time left before the deadline, or `None` without one.
    fn remaining(&self, now: Instant) -> Option<Duration> {
        match (self.policy.deadline, self.accepted_at) {
            (Some(deadline), Some(start)) => {
                Some(deadline.saturating_sub(now.saturating_duration_since(start)))
            }
            _ => None,
        }
    }

    fn elapsed(&self) -> Duration {
        match (self.accepted_at, self.finished_at) {
            (Some(start), Some(end)) => end.saturating_duration_since(start),
            _ => Duration::ZERO,
        }
    }

    fn finish(&mut self, state: ForkPollState, now: Instant) {
        self.state = state;
        self.finished_at = Some(now);
    }
}
