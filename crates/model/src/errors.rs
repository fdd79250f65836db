//! Error types shared across the workspace.
//!
//! [`ApiError`] is the taxonomy for every call to the hosting platform's HTTP
//! API. It is deliberately independent of the HTTP library so that port
//! implementations and test fakes can both produce it. Process failures live in
//! the `process` crate and are never folded into [`ApiError`].
//!
//! [`ForkError`] is the terminal outcome of a fork that did not confirm.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::RepositoryId;

// ---------------------------------------------------------------------------
// API errors
// ---------------------------------------------------------------------------

/// Errors produced by calls to the hosting platform's HTTP API.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum ApiError {
    /// The server answered with a non-success status code.
    #[error("got {status} \"{reason}\" response")]
    Status {
        /// Numeric HTTP status code.
        status: u16,
        /// Canonical reason phrase for `status` (e.g. `"Not Found"`).
        reason: String,
    },

    /// The request never produced a response (DNS, TLS, connection reset,
    /// client-side timeout).
    #[error("request failed: {message}")]
    Transport {
        /// Description of the transport failure.
        message: String,
    },

    /// The request was refused locally and never sent (e.g. a name that would
    /// change the request path).
    #[error("invalid request: {message}")]
    InvalidRequest {
        /// Why the request was refused.
        message: String,
    },

    /// A paginated listing still had more pages after the configured page
    /// limit. Nothing of the partial listing is returned.
    #[error("listing exceeds {pages} pages")]
    ListingTruncated {
        /// Pages fetched before giving up.
        pages: u32,
    },

    /// A success response carried a body that could not be decoded.
    #[error("unexpected response body: {message}")]
    Decode {
        /// Description of the decoding failure.
        message: String,
    },
}

impl ApiError {
    /// Builds a [`ApiError::Status`] from a status code and its reason phrase.
    ///
    /// Unknown codes get the reason `"Unknown"`.
    pub fn status(status: u16, reason: Option<&str>) -> Self {
        Self::Status {
            status,
            reason: reason.unwrap_or("Unknown").to_string(),
        }
    }

    /// Returns the HTTP status code, if the server answered at all.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Fork errors
// ---------------------------------------------------------------------------

/// Why a fork did not reach the confirmed state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ForkError {
    /// The fork-creation request itself was rejected.
    #[error("fork request for {repo} failed: {source}")]
    Request {
        /// Repository whose fork was requested.
        repo: RepositoryId,
        /// Underlying API failure.
        source: ApiError,
    },

    /// Listing the bot's repositories failed while polling. Polling stops on
    /// the first such failure.
    #[error("polling for fork of {repo} failed on attempt {attempt}: {source}")]
    Poll {
        /// Repository whose fork was being awaited.
        repo: RepositoryId,
        /// The 1-based poll attempt that failed.
        attempt: u32,
        /// Underlying API failure.
        source: ApiError,
    },

    /// The poll budget (attempt count or wall-clock deadline) ran out before
    /// the fork appeared.
    #[error("fork of {repo} not visible after {attempts} polls ({elapsed:?})")]
    TimedOut {
        /// Repository whose fork was being awaited.
        repo: RepositoryId,
        /// Number of polls performed.
        attempts: u32,
        /// Time spent polling.
        elapsed: Duration,
    },

    /// The caller cancelled the wait.
    #[error("waiting for fork of {repo} was cancelled after {attempts} polls")]
    Cancelled {
        /// Repository whose fork was being awaited.
        repo: RepositoryId,
        /// Number of polls performed before cancellation.
        attempts: u32,
    },
}
