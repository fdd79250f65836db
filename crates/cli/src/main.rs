//! forkbot CLI entry point.
//!
//! This binary is the composition root for the whole system. Responsibilities:
//!
//! 1. **Parse configuration**: load `forkbot.toml` (or `--config`), merge in
//!    `FORKBOT_USER` / `FORKBOT_PASS`, and reject invalid settings before any
//!    network or process activity.
//! 2. **Wire observability**: install the `tracing-subscriber` stack with an
//!    optional OpenTelemetry OTLP exporter. All spans and events emitted by
//!    every crate in the workspace flow through it.
//! 3. **Construct infrastructure**: create the `GithubClient`, the
//!    components directory client and the `TokioCommandRunner`, and inject
//!    them into a `workflow::Bot`.
//! 4. **Run one subcommand** and print its JSON result on stdout.
//!
//! Ctrl-C cancels a pending fork wait.

mod commands;
mod config;
mod telemetry;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use github::{ComponentDirectory, GithubClient};
use process::TokioCommandRunner;
use tokio_util::sync::CancellationToken;
use tracing::{error, warn};
use workflow::Bot;

use crate::commands::Command;
use crate::config::CliConfig;
use crate::telemetry::LogFormat;

/// Forks component repositories, edits them and proposes the changes back.
#[derive(Debug, Parser)]
#[command(name = "forkbot", version, about)]
struct Cli {
    /// Configuration file; defaults to ./forkbot.toml when present.
    #[arg(long, global = true, env = "FORKBOT_CONFIG")]
    config: Option<PathBuf>,

    /// Format of log lines on stderr.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let telemetry = match telemetry::init(cli.log_format) {
        Ok(telemetry) => telemetry,
        Err(err) => {
            eprintln!("forkbot: {err:#}");
            return ExitCode::FAILURE;
        }
    };

    let code = match run(cli).await {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("command failed: {err:#}");
            eprintln!("forkbot: {err:#}");
            ExitCode::FAILURE
        }
    };

    telemetry.shutdown();
    code
}

async fn run(cli: Cli) -> anyhow::Result<String> {
    let settings = CliConfig::load(cli.config.as_deref())?
        .resolve(|key| std::env::var(key).ok())?;

    let host = Arc::new(
        GithubClient::new(settings.github.clone(), settings.credentials.clone())
            .context("failed to create GitHub client")?,
    );
    let catalog = Arc::new(
        ComponentDirectory::new(
            &settings.components_url,
            &settings.github.user_agent,
            settings.github.timeout,
        )
        .context("failed to create components directory client")?,
    );
    let runner = Arc::new(TokioCommandRunner::new(settings.process_timeout));
    let bot = Bot::new(settings.credentials, host, catalog, runner, settings.bot);

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupted; cancelling");
                cancel.cancel();
            }
        }
    });

    cli.command.run(&bot, &cancel).await
}
