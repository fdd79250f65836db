//! Bounded-concurrency bulk deletion.
//!
//! Deletions are independent: one failure never aborts the others. Every
//! name yields exactly one [`RemovalOutcome`], reported in input order.

use futures::stream::{self, StreamExt};
use model::{ApiError, RepositoryHost};
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::errors::RemovalError;

/// Default number of deletions in flight at once.
pub const DEFAULT_REMOVE_CONCURRENCY: usize = 8;

/// Result of deleting one repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemovalOutcome {
    /// Short name of the repository.
    pub name: String,
    /// `None` when the deletion succeeded.
    pub error: Option<ApiError>,
}

impl RemovalOutcome {
    /// Returns `true` if the repository was deleted.
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Per-item results of a bulk removal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RemovalReport {
    outcomes: Vec<RemovalOutcome>,
}

impl RemovalReport {
    /// All outcomes, in input order.
    pub fn outcomes(&self) -> &[RemovalOutcome] {
        &self.outcomes
    }

    /// The outcomes that carry an error.
    pub fn failures(&self) -> impl Iterator<Item = &RemovalOutcome> {
        self.outcomes.iter().filter(|o| !o.is_success())
    }

    /// Returns `true` if every deletion succeeded.
    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(RemovalOutcome::is_success)
    }

    /// Turns a report with any failure into a [`RemovalError`].
    pub fn into_result(self) -> Result<Self, RemovalError> {
        if self.is_success() {
            return Ok(self);
        }
        Err(RemovalError {
            attempted: self.outcomes.len(),
            failures: self.failures().cloned().collect(),
        })
    }
}

/// Deletes every repository in `names` with at most `limit` requests in
/// flight. A `limit` of zero is treated as one.
#[instrument(skip(host, names), fields(count = names.len()))]
pub async fn remove_concurrently(
    host: &dyn RepositoryHost,
    names: Vec<String>,
    limit: usize,
) -> RemovalReport {
    let outcomes: Vec<RemovalOutcome> = stream::iter(names)
        .map(|name| async move {
            let error = host.delete_repository(&name).await.err();
            match &error {
                None => info!(repo = %name, "removed"),
                Some(err) => warn!(repo = %name, error = %err, "removal failed"),
            }
            RemovalOutcome { name, error }
        })
        .buffered(limit.max(1))
        .collect()
        .await;

    RemovalReport { outcomes }
}
