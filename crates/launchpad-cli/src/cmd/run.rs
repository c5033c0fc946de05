//! Run command - the full bootstrap

use anyhow::Result;
use launchpad_core::{Pipeline, ReleaseSpec};

use crate::Cli;

/// Download, verify and launch the companion for the running host.
pub async fn run(cli: &Cli, release: ReleaseSpec) -> Result<()> {
    let pipeline = Pipeline::new(cli.load_config()?, release)?;
    super::log_start(&pipeline);

    pipeline
        .run_on_host(std::env::consts::OS, std::env::consts::ARCH)
        .await?;

    tracing::info!("end {}", pipeline.release().display_name);
    Ok(())
}
