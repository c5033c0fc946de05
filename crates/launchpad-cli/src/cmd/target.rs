//! Target command - show what would be fetched, without network access

use anyhow::Result;
use launchpad_core::ReleaseSpec;
use launchpad_core::schema::Target;

use crate::Cli;

/// Print the host target and everything derived from it.
pub fn target(cli: &Cli, release: &ReleaseSpec) -> Result<()> {
    let config = cli.load_config()?;
    let target = Target::current()?;
    let names = target.asset_names(&release.project);

    println!("platform    {}", target.platform);
    println!("arch        {}", target.arch);
    println!("archive     {}", names.archive);
    println!("executable  {}", names.executable);
    println!("manifest    {}", names.manifest);
    println!("sha512      {}", release.expected_hash(&target));
    println!("release     {}", config.release_url(release));
    println!("work dir    {}", config.work_dir(release).display());
    Ok(())
}
