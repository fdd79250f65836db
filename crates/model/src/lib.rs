//! Core domain for forkbot.
//!
//! This crate contains every domain concept, newtype identifier, shared value
//! type and cross-cutting error type used by the bot. Infrastructure crates
//! implement the traits defined here; they never add domain rules.
//!
//! ## Architectural Layer
//!
//! **Business logic + port definitions.** This crate has no I/O dependencies.
//! It defines *what* is needed; infrastructure crates define *how* to supply it.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | `RepositoryId`, `UserLogin`, `BranchName` |
//! | [`types`] | Credentials, poll policy, platform records, clone/commit values |
//! | [`fork`] | The fork-confirmation state machine |
//! | [`errors`] | `ApiError` and `ForkError` |
//! | [`ports`] | `RepositoryHost` and `ComponentCatalog` traits |

pub mod errors;
pub mod fork;
pub mod identifiers;
pub mod ports;
pub mod types;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use errors::{ApiError, ForkError};
pub use fork::{ForkFailure, ForkPoll, ForkPollState, PollStep};
pub use identifiers::{short_name, BranchName, RepositoryId, RepositoryIdError, UserLogin};
pub use ports::{ComponentCatalog, RepositoryHost};
pub use types::{
    CommitOutcome, CommitTransaction, Credentials, ForkConfirmation, ForkMatch, ForkRequest,
    Issue, IssueOptions, LocalClone, NewIssue, NewPullRequest, PollPolicy, PullRequest,
    PullRequestOptions, RemoteUrl, Repository, Timestamp,
};
