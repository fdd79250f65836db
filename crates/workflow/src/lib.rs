//! forkbot orchestration.
//!
//! Composes the domain model with the platform and process ports: the fork
//! coordinator drives [`model::ForkPoll`] on a timer, the repository
//! workspace runs git through a [`process::CommandRunner`], and bulk removal
//! fans deletions out with a bounded in-flight limit. [`Bot`] is the single
//! entry point callers use.
//!
//! ## Architectural Layer
//!
//! **Application.** Depends on `model` ports and `process` steps only; the
//! concrete GitHub client and process runner are injected by the binary.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`bot`] | `Bot` facade and `BotConfig` |
//! | [`fork`] | `ForkCoordinator` |
//! | [`workspace`] | `RepositoryWorkspace` and `WorkspaceConfig` |
//! | [`removal`] | `remove_concurrently` and `RemovalReport` |
//! | [`errors`] | `WorkspaceError`, `RemovalError`, `BotError` |

pub mod bot;
pub mod errors;
pub mod fork;
pub mod removal;
pub mod workspace;

#[cfg(test)]
mod testing;

pub use bot::{Bot, BotConfig};
pub use errors::{BotError, RemovalError, WorkspaceError};
pub use fork::ForkCoordinator;
pub use removal::{remove_concurrently, RemovalOutcome, RemovalReport, DEFAULT_REMOVE_CONCURRENCY};
pub use workspace::{RepositoryWorkspace, WorkspaceConfig, DEFAULT_CLONE_ROOT, DEFAULT_GIT_HOST};
