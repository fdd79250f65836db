//! Newtype domain identifiers.
//!
//! Every name that flows from a caller into a URL path, a file-system path or a
//! git argument is wrapped in a newtype that validates it once, at the edge.
//! This prevents accidentally interchanging a bot login with a repository name
//! even though both are `String` under the hood.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Macro for String-wrapped newtypes.
// Generates: struct, new() returning Option<Self>, as_str(), Display.
// ---------------------------------------------------------------------------
macro_rules! string_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier, returning `None` if the value is empty.
            pub fn new(value: impl Into<String>) -> Option<Self> {
                let v = value.into();
                if v.is_empty() { None } else { Some(Self(v)) }
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

string_id! {
    /// The login of the GitHub account the bot acts as (e.g. `"component-bot"`).
    UserLogin
}

string_id! {
    /// A Git branch name (e.g. `"master"`).
    BranchName
}

impl BranchName {
    /// The branch the bot pushes to and opens pull requests against unless
    /// configured otherwise.
    pub fn master() -> Self {
        Self("master".to_string())
    }
}

// ---------------------------------------------------------------------------
// Repository identifier
// ---------------------------------------------------------------------------

/// Separator between the owner and the name in an `"owner/name"` token.
pub const SEPARATOR: char = '/';

/// Returns the final path segment of an `"owner/name"` token.
///
/// A token without a separator is returned unchanged.
pub fn short_name(token: &str) -> &str {
    match token.rfind(SEPARATOR) {
        Some(idx) => &token[idx + 1..],
        None => token,
    }
}

/// Reasons an `"owner/name"` token is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryIdError {
    /// The token has no `/` separating owner and name.
    #[error("repository '{0}' is not of the form owner/name")]
    MissingSeparator(String),

    /// The owner or name segment is empty, `.`/`..`, or contains characters
    /// GitHub does not allow in account and repository names.
    #[error("repository '{token}' has an invalid {segment} segment")]
    InvalidSegment {
        /// The rejected token.
        token: String,
        /// Which segment failed validation (`"owner"` or `"name"`).
        segment: &'static str,
    },
}

/// Identifies a GitHub repository in `"owner/name"` format.
///
/// Both segments are restricted to the characters GitHub accepts in account
/// and repository names (`A-Z a-z 0-9 - _ .`), and neither may be `.` or `..`.
/// The identifier is therefore safe to use as a URL path component and as a
/// relative directory below the clone root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RepositoryId {
    owner: String,
    name: String,
}

impl RepositoryId {
    /// Builds an identifier from its two segments.
    pub fn from_parts(
        owner: impl Into<String>,
        name: impl Into<String>,
    ) -> Result<Self, RepositoryIdError> {
        let owner = owner.into();
        let name = name.into();
        let token = format!("{owner}{SEPARATOR}{name}");
        if !is_valid_segment(&owner) {
            return Err(RepositoryIdError::InvalidSegment {
                token,
                segment: "owner",
            });
        }
        if !is_valid_segment(&name) {
            return Err(RepositoryIdError::InvalidSegment {
                token,
                segment: "name",
            });
        }
        Ok(Self { owner, name })
    }

    /// Parses an `"owner/name"` token.
    ///
    /// The name is the final path segment; everything before the last `/` is
    /// the owner (and must itself be a single valid segment).
    pub fn parse(token: &str) -> Result<Self, RepositoryIdError> {
        let idx = token
            .rfind(SEPARATOR)
            .ok_or_else(|| RepositoryIdError::MissingSeparator(token.to_string()))?;
        Self::from_parts(&token[..idx], &token[idx + 1..])
    }

    /// Returns the owning account or organisation.
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Returns the repository's short name (the final path segment).
    pub fn short_name(&self) -> &str {
        &self.name
    }

    /// Returns the `"owner/name"` token.
    pub fn full_name(&self) -> String {
        format!("{}{SEPARATOR}{}", self.owner, self.name)
    }
}

fn is_valid_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment != "."
        && segment != ".."
        && segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

impl std::fmt::Display for RepositoryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{SEPARATOR}{}", self.owner, self.name)
    }
}

impl FromStr for RepositoryId {
    type Err = RepositoryIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for RepositoryId {
    type Error = RepositoryIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<RepositoryId> for String {
    fn from(value: RepositoryId) -> Self {
        value.full_name()
    }
}
