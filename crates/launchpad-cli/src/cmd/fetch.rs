//! Fetch command - download and verify without launching

use anyhow::Result;
use launchpad_core::{Pipeline, ReleaseSpec};

use crate::Cli;

/// Prepare the companion and print the verified executable path on stdout.
pub async fn fetch(cli: &Cli, release: ReleaseSpec) -> Result<()> {
    let pipeline = Pipeline::new(cli.load_config()?, release)?;
    super::log_start(&pipeline);

    let prepared = pipeline
        .prepare_on_host(std::env::consts::OS, std::env::consts::ARCH)
        .await?;

    println!("{}", prepared.executable().display());
    Ok(())
}
