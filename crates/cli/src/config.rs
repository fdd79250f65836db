//! `forkbot.toml` configuration.
//!
//! Every field is optional. Credentials are never read from the file's
//! password; `FORKBOT_PASS` must come from the environment.

use std::path::{Path, PathBuf};
use std::time::Duration;

use github::{GithubConfig, DEFAULT_API_BASE_URL, DEFAULT_COMPONENTS_URL, DEFAULT_MAX_PAGES};
use model::{BranchName, Credentials, ForkMatch, PollPolicy, UserLogin};
use serde::Deserialize;
use thiserror::Error;
use workflow::{BotConfig, WorkspaceConfig, DEFAULT_CLONE_ROOT, DEFAULT_GIT_HOST};

/// File read from the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "forkbot.toml";

/// Environment variable naming the bot account.
pub const USER_ENV: &str = "FORKBOT_USER";

/// Environment variable holding the bot account's password or token.
pub const PASS_ENV: &str = "FORKBOT_PASS";

/// Configuration problems, all detected before any network or process
/// activity.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid configuration in {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("no bot user configured: set `user` or {USER_ENV}")]
    MissingUser,

    #[error("no bot password configured: set {PASS_ENV}")]
    MissingPassword,

    #[error("invalid value for `{field}`: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CliConfig {
    /// Bot account login; `FORKBOT_USER` takes precedence.
    pub user: Option<String>,
    pub clone_root: PathBuf,
    pub api_base_url: String,
    pub git_host: String,
    pub default_branch: String,
    pub components_url: String,
    pub user_agent: String,
    pub remove_concurrency: usize,
    pub poll: PollSection,
    pub process: ProcessSection,
    pub http: HttpSection,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            user: None,
            clone_root: PathBuf::from(DEFAULT_CLONE_ROOT),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            git_host: DEFAULT_GIT_HOST.to_string(),
            default_branch: "master".to_string(),
            components_url: DEFAULT_COMPONENTS_URL.to_string(),
            user_agent: concat!("forkbot/", env!("CARGO_PKG_VERSION")).to_string(),
            remove_concurrency: workflow::DEFAULT_REMOVE_CONCURRENCY,
            poll: PollSection::default(),
            process: ProcessSection::default(),
            http: HttpSection::default(),
        }
    }
}

/// `[poll]`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PollSection {
    pub interval_ms: u64,
    pub max_attempts: u32,
    pub deadline_secs: Option<u64>,
    pub match_policy: ForkMatch,
}

impl Default for PollSection {
    fn default() -> Self {
        Self {
            interval_ms: PollPolicy::DEFAULT_INTERVAL.as_millis() as u64,
            max_attempts: PollPolicy::DEFAULT_MAX_ATTEMPTS,
            deadline_secs: None,
            match_policy: ForkMatch::default(),
        }
    }
}

/// `[process]`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessSection {
    pub timeout_secs: u64,
}

impl Default for ProcessSection {
    fn default() -> Self {
        Self {
            timeout_secs: process::TokioCommandRunner::DEFAULT_TIMEOUT.as_secs(),
        }
    }
}

/// `[http]`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HttpSection {
    pub timeout_secs: u64,
    /// Repository listings longer than this many pages of 100 fail.
    pub max_pages: u32,
}

impl Default for HttpSection {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            max_pages: DEFAULT_MAX_PAGES,
        }
    }
}

/// Fully validated settings, ready for wiring.
#[derive(Debug, Clone)]
pub struct Settings {
    pub credentials: Credentials,
    pub bot: BotConfig,
    pub github: GithubConfig,
    pub components_url: String,
    pub process_timeout: Duration,
}

impl CliConfig {
    /// Reads `path`, or `forkbot.toml` if present, or falls back to defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::read(path),
            None => {
                let path = Path::new(DEFAULT_CONFIG_FILE);
                if path.is_file() {
                    Self::read(path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    fn read(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Validates the file values and merges in credentials looked up with
    /// `env`.
    pub fn resolve<F>(self, env: F) -> Result<Settings, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |value: Option<String>| value.filter(|v| !v.is_empty());

        let user = non_empty(env(USER_ENV))
            .or(self.user)
            .and_then(UserLogin::new)
            .ok_or(ConfigError::MissingUser)?;
        let password = non_empty(env(PASS_ENV)).ok_or(ConfigError::MissingPassword)?;

        let default_branch =
            BranchName::new(self.default_branch).ok_or(ConfigError::Invalid {
                field: "default_branch",
                reason: "must not be empty",
            })?;
        if self.git_host.is_empty() {
            return Err(ConfigError::Invalid {
                field: "git_host",
                reason: "must not be empty",
            });
        }
        if self.remove_concurrency == 0 {
            return Err(ConfigError::Invalid {
                field: "remove_concurrency",
                reason: "must be at least 1",
            });
        }
        if self.poll.max_attempts == 0 {
            return Err(ConfigError::Invalid {
                field: "poll.max_attempts",
                reason: "must be at least 1",
            });
        }
        if self.process.timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "process.timeout_secs",
                reason: "must be at least 1",
            });
        }
        if self.http.timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "http.timeout_secs",
                reason: "must be at least 1",
            });
        }
        if self.http.max_pages == 0 {
            return Err(ConfigError::Invalid {
                field: "http.max_pages",
                reason: "must be at least 1",
            });
        }

        let poll = PollPolicy {
            interval: Duration::from_millis(self.poll.interval_ms),
            max_attempts: self.poll.max_attempts,
            deadline: self.poll.deadline_secs.map(Duration::from_secs),
            match_policy: self.poll.match_policy,
        };

        Ok(Settings {
            credentials: Credentials::new(user, password),
            bot: BotConfig {
                poll,
                workspace: WorkspaceConfig {
                    clone_root: self.clone_root,
                    git_host: self.git_host,
                    default_branch,
                    ..Default::default()
                },
                remove_concurrency: self.remove_concurrency,
            },
            github: GithubConfig {
                base_url: self.api_base_url,
                user_agent: self.user_agent,
                timeout: Duration::from_secs(self.http.timeout_secs),
                max_pages: self.http.max_pages,
            },
            components_url: self.components_url,
            process_timeout: Duration::from_secs(self.process.timeout_secs),
        })
    }
}
