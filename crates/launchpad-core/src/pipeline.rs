//! Orchestration: resolve -> locate -> download -> extract -> verify -> launch.

use std::path::PathBuf;

use launchpad_schema::{AssetNames, Target};
use reqwest::Client;

use crate::config::Config;
use crate::error::Error;
use crate::io::download::DownloadRequest;
use crate::io::extract::{self, ExtractCommand};
use crate::io::locate::locate_asset;
use crate::io::workdir::WorkDir;
use crate::launch::launch;
use crate::release::ReleaseSpec;
use crate::verify::verify;

/// A downloaded, unpacked and verified executable, ready to launch.
#[derive(Debug, Clone)]
pub struct Prepared {
    pub target: Target,
    pub work_dir: WorkDir,
}

impl Prepared {
    pub fn executable(&self) -> PathBuf {
        self.work_dir.executable_path()
    }
}

/// One bootstrap run over a fixed release and configuration.
#[derive(Debug)]
pub struct Pipeline {
    config: Config,
    release: ReleaseSpec,
    client: Client,
}

impl Pipeline {
    pub fn new(config: Config, release: ReleaseSpec) -> Result<Self, Error> {
        let client = config.http_client().map_err(Error::Client)?;
        Ok(Self {
            config,
            release,
            client,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn release(&self) -> &ReleaseSpec {
        &self.release
    }

    pub fn asset_names(&self, target: &Target) -> AssetNames {
        target.asset_names(&self.release.project)
    }

    /// Everything up to and including verification.
    pub async fn prepare(&self, target: Target) -> Result<Prepared, Error> {
        let names = self.asset_names(&target);
        let expected = self.release.expected_hash(&target);
        tracing::info!(
            "they are mapped to platform {} and arch {}",
            target.platform,
            target.arch
        );

        tracing::info!("determine asset url from release");
        let asset_url = locate_asset(
            &self.client,
            self.config.release_url(&self.release),
            &names.archive,
            self.config.request_timeout(),
        )
        .await?;

        tracing::info!("download zip from {asset_url}");
        let root = self.config.work_dir(&self.release);
        let work_dir = WorkDir::reset(root.clone(), names)
            .await
            .map_err(|source| Error::WorkDir { path: root, source })?;
        let archive = work_dir.archive_path();
        DownloadRequest::new(&self.client, &asset_url, &archive)
            .with_max_redirects(self.config.max_redirects)
            .with_idle_timeout(self.config.idle_timeout())
            .execute()
            .await?;

        let command = match &self.config.extract_command {
            Some(argv) => ExtractCommand::from_argv(argv)?,
            None => ExtractCommand::for_platform(target.platform),
        };
        extract::extract(
            &command,
            &work_dir.names().archive,
            work_dir.path(),
            self.config.extract_timeout(),
        )
        .await?;

        verify(
            &work_dir.manifest_path(),
            &work_dir.executable_path(),
            expected,
        )
        .await?;

        Ok(Prepared { target, work_dir })
    }

    /// Prepare and launch, failing if the companion exits non-zero.
    pub async fn run(&self, target: Target) -> Result<(), Error> {
        let prepared = self.prepare(target).await?;
        launch(&prepared.executable(), self.config.launch_timeout()).await?;
        Ok(())
    }

    /// Resolve host-reported names first; an unsupported host fails before
    /// any request is made.
    pub async fn run_on_host(&self, os: &str, arch: &str) -> Result<(), Error> {
        let target = Target::from_host(os, arch)?;
        tracing::info!("valid platform {os} and arch {arch}");
        self.run(target).await
    }

    /// [`Pipeline::prepare`] for host-reported names.
    pub async fn prepare_on_host(&self, os: &str, arch: &str) -> Result<Prepared, Error> {
        let target = Target::from_host(os, arch)?;
        tracing::info!("valid platform {os} and arch {arch}");
        self.prepare(target).await
    }
}
