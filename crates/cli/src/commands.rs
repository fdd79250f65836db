//! Subcommands and their execution against a [`Bot`].

use anyhow::{bail, Context};
use clap::{Args, Subcommand};
use model::{BranchName, IssueOptions, PullRequestOptions, RepositoryId};
use serde::Serialize;
use serde_json::json;
use tokio_util::sync::CancellationToken;
use workflow::Bot;

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List the bot account's repositories.
    Repos,

    /// Report whether the bot already owns a fork of a repository.
    HasForked {
        /// `owner/name` of the upstream repository.
        repo: RepositoryId,
    },

    /// Delete repositories of the bot account by short name.
    Remove {
        #[arg(required = true)]
        names: Vec<String>,
    },

    /// Delete every repository of the bot account.
    RemoveAll {
        /// Confirm the deletion.
        #[arg(long)]
        yes: bool,
    },

    /// Fork a repository and wait until the fork exists.
    Fork { repo: RepositoryId },

    /// Make a fresh shallow clone of a repository.
    Clone { repo: RepositoryId },

    /// Commit all changes in a clone and push them.
    Commit {
        repo: RepositoryId,
        #[arg(short, long)]
        message: String,
    },

    /// Open an issue.
    Issue {
        repo: RepositoryId,
        #[command(flatten)]
        text: TextArgs,
        #[arg(long = "label")]
        labels: Vec<String>,
        #[arg(long = "assignee")]
        assignees: Vec<String>,
        #[arg(long)]
        milestone: Option<u64>,
    },

    /// Open a pull request from the bot's fork.
    PullRequest {
        repo: RepositoryId,
        #[command(flatten)]
        text: TextArgs,
        /// Target branch; defaults to the configured default branch.
        #[arg(long)]
        base: Option<String>,
        /// Source, `user:branch`; defaults to the bot's default branch.
        #[arg(long)]
        head: Option<String>,
        #[arg(long)]
        draft: bool,
        #[arg(long)]
        maintainer_can_modify: bool,
    },

    /// Print the components directory.
    Components,
}

#[derive(Debug, Args)]
pub struct TextArgs {
    #[arg(long)]
    pub title: String,
    #[arg(long, default_value = "")]
    pub body: String,
}

impl Command {
    /// Runs the command and returns its result as JSON for stdout.
    pub async fn run(self, bot: &Bot, cancel: &CancellationToken) -> anyhow::Result<String> {
        match self {
            Self::Repos => render(&bot.repos().await?),
            Self::HasForked { repo } => {
                let forked = bot.has_forked(&repo).await?;
                render(&json!({ "repo": repo, "forked": forked }))
            }
            Self::Remove { mut names } if names.len() == 1 => {
                let name = names.remove(0);
                bot.remove(&name)
                    .await
                    .with_context(|| format!("failed to remove {name}"))?;
                render(&json!({ "removed": [name] }))
            }
            Self::Remove { names } => {
                let report = bot.remove_many(names).await;
                let output = render(&report)?;
                report.into_result()?;
                Ok(output)
            }
            Self::RemoveAll { yes } => {
                if !yes {
                    bail!("refusing to delete every repository of {} without --yes", bot.user());
                }
                let report = bot.remove_all().await?;
                let output = render(&report)?;
                report.into_result()?;
                Ok(output)
            }
            Self::Fork { repo } => render(&bot.fork(&repo, cancel).await?),
            Self::Clone { repo } => {
                let clone = bot.clone_repository(&repo).await?;
                render(&json!({
                    "repo": clone.repo,
                    "local_path": clone.local_path,
                    "remote_url": clone.remote_url.masked(),
                }))
            }
            Self::Commit { repo, message } => {
                let outcome = bot.commit(&repo, message).await?;
                render(&json!({ "repo": repo, "outcome": outcome }))
            }
            Self::Issue {
                repo,
                text,
                labels,
                assignees,
                milestone,
            } => {
                let options = IssueOptions {
                    labels,
                    assignees,
                    milestone,
                };
                render(&bot.issue(&repo, text.title, text.body, options).await?)
            }
            Self::PullRequest {
                repo,
                text,
                base,
                head,
                draft,
                maintainer_can_modify,
            } => {
                let base = match base {
                    Some(base) => {
                        Some(BranchName::new(base).context("--base must not be empty")?)
                    }
                    None => None,
                };
                let options = PullRequestOptions {
                    base,
                    head,
                    draft: draft.then_some(true),
                    maintainer_can_modify: maintainer_can_modify.then_some(true),
                };
                render(&bot.pull_request(&repo, text.title, text.body, options).await?)
            }
            Self::Components => render(&bot.components().await?),
        }
    }
}

fn render<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<String> {
    serde_json::to_string_pretty(value).context("failed to encode result")
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[derive(Debug, Parser)]
    struct TestCli {
        #[command(subcommand)]
        command: Command,
    }

    fn parse(args: &[&str]) -> Command {
        TestCli::try_parse_from(std::iter::once("forkbot").chain(args.iter().copied()))
            .unwrap()
            .command
    }

    #[test]
    fn repository_arguments_are_validated() {
        let err = TestCli::try_parse_from(["forkbot", "fork", "emitter"]).unwrap_err();
        assert!(err.to_string().contains("emitter"), "{err}");

        let Command::Fork { repo } = parse(&["fork", "component/emitter"]) else {
            panic!("expected fork");
        };
        assert_eq!(repo.short_name(), "emitter");
    }

    #[test]
    fn issue_collects_repeated_options() {
        let Command::Issue {
            text,
            labels,
            milestone,
            ..
        } = parse(&[
            "issue",
            "component/emitter",
            "--title",
            "Missing license",
            "--label",
            "bot",
            "--label",
            "license",
            "--milestone",
            "2",
        ])
        else {
            panic!("expected issue");
        };
        assert_eq!(text.title, "Missing license");
        assert_eq!(text.body, "");
        assert_eq!(labels, ["bot", "license"]);
        assert_eq!(milestone, Some(2));
    }

    #[test]
    fn commit_requires_message() {
        assert!(TestCli::try_parse_from(["forkbot", "commit", "component/emitter"]).is_err());

        let Command::Commit { message, .. } =
            parse(&["commit", "component/emitter", "-m", "add license"])
        else {
            panic!("expected commit");
        };
        assert_eq!(message, "add license");
    }

    #[test]
    fn remove_needs_at_least_one_name() {
        assert!(TestCli::try_parse_from(["forkbot", "remove"]).is_err());
        let Command::Remove { names } = parse(&["remove", "a", "b"]) else {
            panic!("expected remove");
        };
        assert_eq!(names, ["a", "b"]);
    }

    #[test]
    fn pull_request_flags_are_parsed() {
        let Command::PullRequest {
            base, head, draft, ..
        } = parse(&[
            "pull-request",
            "component/emitter",
            "--title",
            "Add license",
            "--base",
            "main",
            "--draft",
        ])
        else {
            panic!("expected pull-request");
        };
        assert_eq!(base.as_deref(), Some("main"));
        assert_eq!(head, None);
        assert!(draft);
    }
}
