//! launchpad - fetch, verify and run a pinned companion binary
//!
//! The binary resolves the host target, downloads the matching release
//! asset into a fresh working directory, checks the unpacked executable
//! against its known SHA-512 digest and runs it, relaying its output.
//!
//! # Directory Layout
//!
//! ```text
//! <exe dir or $LAUNCHPAD_HOME>/packagesactionwork/
//! ├── packages-action-<platform>-<arch>.zip
//! ├── packages-action-<platform>-<arch>[.exe]
//! └── packages-action-<platform>-<arch>-hash.txt
//! ```

pub mod cmd;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use launchpad_core::Config;

/// Command-line arguments.
#[derive(Debug, Parser)]
#[command(name = "launchpad")]
#[command(author, version = env!("LAUNCHPAD_VERSION"), about = "Fetch, verify and run the packages-action companion")]
pub struct Cli {
    /// TOML config file
    #[arg(long, global = true, env = "LAUNCHPAD_CONFIG")]
    pub config: Option<PathBuf>,

    /// Working directory to (re)create for the download
    #[arg(long, global = true, env = "LAUNCHPAD_WORK_DIR")]
    pub work_dir: Option<PathBuf>,

    /// Release-metadata endpoint to query instead of the pinned one
    #[arg(long, global = true, env = "LAUNCHPAD_RELEASE_URL")]
    pub release_url: Option<String>,

    /// Show debug output
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only show warnings and errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// What to do; defaults to `run`
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Subcommands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum Commands {
    /// Download, verify and launch the companion (default)
    Run,
    /// Download and verify the companion, print its path, do not launch
    Fetch,
    /// Print the resolved target, asset names and expected digest
    Target,
}

impl Cli {
    /// Config file (if any) with flag and environment overrides applied.
    pub fn load_config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => Config::default(),
        };
        if let Some(work_dir) = &self.work_dir {
            config.work_dir = Some(work_dir.clone());
        }
        if let Some(url) = &self.release_url {
            config.release_url = Some(url.clone());
        }
        Ok(config)
    }

    /// Default log filter when `RUST_LOG` is unset.
    pub fn log_level(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else if self.quiet {
            "warn"
        } else {
            "info"
        }
    }
}
