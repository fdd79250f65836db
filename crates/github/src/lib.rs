//! forkbot GitHub infrastructure adapter.
//!
//! Implements [`model::RepositoryHost`] against the GitHub REST API using
//! `reqwest`, and [`model::ComponentCatalog`] against the public components
//! directory.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** This crate must not contain domain rules. Request
//! construction, authentication, pagination and status-to-error mapping live
//! here; the workflow crate never sees HTTP types.
//!
//! ## Endpoints
//!
//! | Operation | Method | Path |
//! |-----------|--------|------|
//! | list repos | GET | `/user/repos` (all pages) |
//! | delete repo | DELETE | `/repos/{user}/{name}` |
//! | fork | POST | `/repos/{owner}/{repo}/forks` |
//! | create issue | POST | `/repos/{owner}/{repo}/issues` |
//! | create pull request | POST | `/repos/{owner}/{repo}/pulls` |

pub mod client;
pub mod components;

use thiserror::Error;

pub use client::{GithubClient, GithubConfig, DEFAULT_API_BASE_URL, DEFAULT_MAX_PAGES};
pub use components::{ComponentDirectory, DEFAULT_COMPONENTS_URL};

/// Errors constructing an HTTP client. Request-time failures are
/// [`model::ApiError`]s.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The configured base URL does not parse.
    #[error("invalid URL '{url}': {source}")]
    InvalidBaseUrl {
        /// The rejected URL.
        url: String,
        /// Parser error.
        source: url::ParseError,
    },

    /// The underlying HTTP client could not be built (e.g. TLS backend).
    #[error("failed to build HTTP client: {0}")]
    Build(#[source] reqwest::Error),
}
