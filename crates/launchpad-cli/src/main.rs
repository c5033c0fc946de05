//! launchpad - fetch, verify and run a pinned companion binary

use std::process::ExitCode;

use clap::Parser;
use launchpad_cli::{Cli, Commands, cmd};
use launchpad_core::ReleaseSpec;
use launchpad_core::release::PACKAGES_ACTION_DISPLAY_NAME;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logs go to stderr; stdout belongs to the companion.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_level())),
        )
        .with_writer(std::io::stderr)
        .init();

    match dispatch(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("failed to execute {PACKAGES_ACTION_DISPLAY_NAME}: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn dispatch(cli: &Cli) -> anyhow::Result<()> {
    let release = ReleaseSpec::packages_action()?;
    match cli.command {
        Some(Commands::Target) => cmd::target::target(cli, &release),
        Some(Commands::Fetch) => cmd::fetch::fetch(cli, release).await,
        Some(Commands::Run) | None => cmd::run::run(cli, release).await,
    }
}
